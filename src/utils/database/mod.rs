use crate::modules::{
    auth::repository::SessionRepository, geostory::repository::GeoStoryRepository,
    user::repository::UserRepository,
};
use std::fmt;
use std::sync::Arc;

mod memory;
mod postgres;

pub use memory::MemoryDatabase;
pub use postgres::PostgresDatabase;

#[derive(Debug)]
pub enum Error {
    ConnectionFailed,
    MigrationFailed,
    UnexpectedError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionFailed => f.write_str("Failed to connect to the database"),
            Error::MigrationFailed => f.write_str("Failed to run database migrations"),
            Error::UnexpectedError => f.write_str("Unexpected database error"),
        }
    }
}

impl std::error::Error for Error {}

/// Everything the service persists, behind one handle.
pub trait Database: GeoStoryRepository + UserRepository + SessionRepository {}

impl<T> Database for T where T: GeoStoryRepository + UserRepository + SessionRepository {}

pub async fn connect(database_url: &str) -> Result<Arc<dyn Database>, Error> {
    if database_url.starts_with("memory:") {
        tracing::warn!("Using the in-memory store, nothing will survive a restart");
        return Ok(Arc::new(MemoryDatabase::new()));
    }

    let db = PostgresDatabase::connect(database_url).await?;
    db.migrate().await?;

    Ok(Arc::new(db))
}
