use base64::Engine;
use std::path::PathBuf;
use std::{env, fs};

use crate::config::Config;
use crate::error::ConfigurationError;
use crate::util::base64_engine;

const SESSION_KEY: &str = "session.key";

/// Secret used to sign session cookies.
#[derive(Clone)]
pub struct Security {
    pub session_key: Vec<u8>,
}

impl std::fmt::Debug for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Security:{} byte key", self.session_key.len())
    }
}

#[inline]
fn security_dir() -> PathBuf {
    PathBuf::from(env::var("SECURITY_DIR").unwrap_or("./security".to_string()))
}

impl Security {
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Security {
        Security {
            session_key: secret.as_ref().to_vec(),
        }
    }

    /// Uses the configured secret if any, otherwise the key file in
    /// `$SECURITY_DIR`, generating one when the `generate-security` feature
    /// is enabled.
    pub fn load(c: &Config) -> Result<Security, ConfigurationError> {
        if let Some(secret) = c.session_secret.as_deref().filter(|it| !it.is_empty()) {
            tracing::info!("Using configured session secret.");
            return Ok(Security::from_secret(secret));
        }

        let dir = security_dir();
        let key_path = dir.join(SESSION_KEY);

        tracing::info!("Loading session key...");
        let stored = fs::read_to_string(&key_path)
            .ok()
            .and_then(|encoded| base64_engine().decode(encoded.trim()).ok())
            .filter(|key| !key.is_empty());

        if let Some(session_key) = stored {
            tracing::info!("Session key found and loaded.");
            return Ok(Security { session_key });
        }

        tracing::info!("Session key not found in '{}'.", key_path.display());
        if !cfg!(feature = "generate-security") {
            return Err(ConfigurationError::MissingSecret(dir));
        }

        tracing::info!("Generating a new session key.");
        fs::create_dir_all(&dir)?;
        let session_key: [u8; 32] = rand::random();
        fs::write(&key_path, base64_engine().encode(session_key))?;

        Ok(Security {
            session_key: session_key.to_vec(),
        })
    }
}
