use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;
use crate::util;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("classroom".to_string())
}

fn default_storage() -> Storage {
    match env::var("STORAGE_BACKEND").as_deref() {
        Ok("memory") => Storage::Memory,
        _ => Storage::MongoDb,
    }
}

fn default_allowed_origins() -> Vec<String> {
    match env::var("ALLOWED_ORIGINS") {
        Ok(origins) => origins
            .split(',')
            .map(str::trim)
            .filter(|it| !it.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => vec![
            String::from("http://localhost:3000"),
            String::from("http://localhost:8080"),
        ],
    }
}

fn default_session_secret() -> Option<String> {
    env::var("SECRET_KEY").ok()
}

fn default_session_hours() -> i64 {
    24 * 7
}

#[cfg(debug_assertions)]
fn default_secure_cookies() -> bool {
    false
}
#[cfg(not(debug_assertions))]
fn default_secure_cookies() -> bool {
    true
}

fn default_seed_demo() -> bool {
    matches!(env::var("SEED_DEMO").as_deref(), Ok("1") | Ok("true"))
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_ai_key() -> Option<String> {
    env::var("GEMINI_API_KEY")
        .or_else(|_| env::var("GOOGLE_API_KEY"))
        .ok()
        .filter(|it| !it.is_empty())
}

fn default_ai_model() -> String {
    env::var("GEMINI_MODEL").unwrap_or("gemini-2.5-flash".to_string())
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    #[serde(alias = "mongo")]
    MongoDb,
    /// Process local, lost on restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_key", skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_key: default_ai_key(),
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_storage")]
    pub storage: Storage,
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_session_secret", skip_serializing)]
    pub session_secret: Option<String>,
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    /// Fill an empty store with the demo school on startup.
    #[serde(default = "default_seed_demo")]
    pub seed_demo: bool,

    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            storage: default_storage(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            allowed_origins: default_allowed_origins(),
            session_secret: default_session_secret(),
            session_hours: default_session_hours(),
            secure_cookies: default_secure_cookies(),
            password_cost: default_password_cost(),
            seed_demo: default_seed_demo(),
            ai: AiConfig::default(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(dir) = self.file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str("storage: memory\nsession_hours: 2\nseed_demo: true\n").unwrap();

        assert_eq!(config.storage, Storage::Memory);
        assert_eq!(config.session_hours, 2);
        assert!(config.seed_demo);
        assert_eq!(config.password_cost, bcrypt::DEFAULT_COST);
        assert!(!config.ai.model.is_empty());
        assert_eq!(config.ai.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn secrets_are_never_written_out() {
        let mut config: Config = serde_yaml::from_str("storage: memory").unwrap();
        config.session_secret = Some("hunter2".to_string());
        config.ai.api_key = Some("sk-test".to_string());

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));
        assert!(!yaml.contains("sk-test"));
    }
}
