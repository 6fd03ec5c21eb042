//! Store connection primitives. Both handles are resolved once at startup and
//! shared by every request afterwards.

use std::time::Duration;

use mongodb::{Client, Database as DocumentDb, options::ClientOptions};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::info;

/// Shared relational connection pool.
pub type DbPool = DatabaseConnection;

pub const DEFAULT_DOCUMENT_DATABASE: &str = "office";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} missing")]
    MissingUrl(&'static str),
    #[error("relational store connection failed")]
    Relational(#[from] DbErr),
    #[error("document store connection failed")]
    Document(#[from] mongodb::error::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings for both stores.
#[derive(Clone, Debug, Default)]
pub struct DatabaseSettings {
    pub database_url: Option<String>,
    pub mongodb_url: Option<String>,
    pub mongodb_database: String,
    pub max_connections: Option<u32>,
    pub connect_timeout: Option<Duration>,
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        Self {
            database_url: non_empty_env("DATABASE_URL"),
            mongodb_url: non_empty_env("MONGODB_URL"),
            mongodb_database: non_empty_env("MONGODB_DATABASE")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_DATABASE.to_string()),
            max_connections: non_empty_env("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok()),
            connect_timeout: non_empty_env("DATABASE_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }

    pub fn new(database_url: impl Into<String>, mongodb_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            mongodb_url: Some(mongodb_url.into()),
            mongodb_database: DEFAULT_DOCUMENT_DATABASE.to_string(),
            ..Self::default()
        }
    }

    pub fn with_document_database(mut self, name: impl Into<String>) -> Self {
        self.mongodb_database = name.into();
        self
    }

    pub fn database_url(&self) -> DbResult<&str> {
        self.database_url
            .as_deref()
            .ok_or(DbError::MissingUrl("DATABASE_URL"))
    }

    pub fn mongodb_url(&self) -> DbResult<&str> {
        self.mongodb_url
            .as_deref()
            .ok_or(DbError::MissingUrl("MONGODB_URL"))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Open the relational pool.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let mut options = ConnectOptions::new(settings.database_url()?.to_string());
    if let Some(max) = settings.max_connections {
        options.max_connections(max);
    }
    if let Some(timeout) = settings.connect_timeout {
        options.connect_timeout(timeout);
    }
    options.sqlx_logging(false);
    let pool = Database::connect(options).await?;
    info!(backend = ?pool.get_database_backend(), "relational store connected");
    Ok(pool)
}

/// Open the document database named by the settings.
pub async fn connect_documents(settings: &DatabaseSettings) -> DbResult<DocumentDb> {
    let mut options = ClientOptions::parse(settings.mongodb_url()?).await?;
    if options.app_name.is_none() {
        options.app_name = Some("office-server".to_string());
    }
    if let Some(timeout) = settings.connect_timeout {
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
    }
    let client = Client::with_options(options)?;
    let database = client.database(&settings.mongodb_database);
    info!(database = %settings.mongodb_database, "document store connected");
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_urls_are_reported_by_name() {
        let settings = DatabaseSettings::default();
        let err = settings.database_url().unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL missing");
        let err = settings.mongodb_url().unwrap_err();
        assert_eq!(err.to_string(), "MONGODB_URL missing");
    }

    #[test]
    fn explicit_settings_default_the_document_database() {
        let settings = DatabaseSettings::new("sqlite::memory:", "mongodb://localhost:27017");
        assert_eq!(settings.mongodb_database, DEFAULT_DOCUMENT_DATABASE);
        let settings = settings.with_document_database("office_test");
        assert_eq!(settings.mongodb_database, "office_test");
        assert_eq!(settings.database_url().unwrap(), "sqlite::memory:");
    }

    #[tokio::test]
    async fn connect_opens_sqlite_memory() {
        let settings = DatabaseSettings::new("sqlite::memory:", "mongodb://localhost:27017");
        let pool = connect(&settings).await.unwrap();
        assert_eq!(
            pool.get_database_backend(),
            sea_orm::DatabaseBackend::Sqlite
        );
    }
}
