#[macro_use]
extern crate rocket;

use std::sync::Arc;

use mongodb::Client;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::ai::Advisor;
use crate::config::{Config, Storage};
use crate::data::memory::MemoryStore;
use crate::data::{mongo, SharedStore};
use crate::error::{BackendError, ConfigurationError, ServiceError};
use crate::route::{mount_api, problem_catchers};
use crate::security::Security;
use crate::service::seed::{self, SeedReport};

pub mod ai;
pub mod caller;
pub mod config;
pub mod data;
pub mod error;
pub mod resp;
pub mod role;
pub mod route;
pub mod security;
pub mod service;
pub mod util;

#[cfg(test)]
pub mod testing;

fn init_logging(level: Level) {
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Unable to forward log records: {}", err);
    }

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global logger: {}", err);
    };
}

fn load_config() -> Result<Config, ConfigurationError> {
    tracing::info!("Loading configuration...");
    match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            Ok(c)
        }
        Err(ConfigurationError::NotFound(dir)) => {
            tracing::info!("No configuration in '{}', using defaults.", dir.display());
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            Ok(c)
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            Err(other)
        }
    }
}

async fn open_store(c: &Config) -> Result<SharedStore, BackendError> {
    match c.storage {
        Storage::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
        Storage::MongoDb => {
            tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
            let client = Client::with_uri_str(c.mongodb_uri.as_str()).await?;

            tracing::info!("Using MongoDB database: {}", c.mongodb_db);
            let db = client.database(c.mongodb_db.as_str());
            if let Err(e) = db.list_collection_names(None).await {
                tracing::error!("Unable to connect to MongoDB.");
                return Err(e.into());
            }
            mongo::prepare(&db).await?;

            Ok(Arc::new(db))
        }
    }
}

fn prepare(log_level: Option<Level>) -> Result<Config, ConfigurationError> {
    if let Some(l) = log_level {
        init_logging(l);
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    load_config()
}

/// Reads `.env` and the configuration, connects storage and builds the
/// server.
pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    let c = prepare(log_level)?;

    tracing::info!("Initializing session key...");
    let security = Security::load(&c)?;

    let store = open_store(&c).await?;
    if c.seed_demo {
        match seed::demo_school(store.as_ref(), c.password_cost).await {
            Ok(_) => {}
            Err(ServiceError::Conflict(reason)) => tracing::info!("{}", reason),
            Err(other) => return Err(other.into()),
        }
    }
    let advisor = Advisor::from_config(&c.ai)?;

    assemble(c, security, store, advisor)
}

/// Connects the configured storage and fills it with the demo school.
pub async fn seed_demo(log_level: Option<Level>) -> Result<SeedReport, BackendError> {
    let c = prepare(log_level)?;
    let store = open_store(&c).await?;
    Ok(seed::demo_school(store.as_ref(), c.password_cost).await?)
}

/// Builds the server around already prepared parts.
pub fn assemble(
    c: Config,
    security: Security,
    store: SharedStore,
    advisor: Advisor,
) -> Result<Rocket<Build>, BackendError> {
    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::some_exact(c.allowed_origins.as_slice()),
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    let r = rocket::build()
        .manage(c)
        .manage(security)
        .manage(store)
        .manage(advisor)
        .attach(cors)
        .register("/", problem_catchers());

    Ok(mount_api(r))
}
