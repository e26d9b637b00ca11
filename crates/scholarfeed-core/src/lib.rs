pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, HarvestConfig, SearchConfig};
pub use error::{CoreError, ExitCode, Result};
pub use models::*;

pub use storage::database::{ConnectionPool, Database, open_database, open_in_memory};
pub use storage::queries::PublicationStatsQuery;
pub use storage::repositories::{PublicationRepository, Repository, SqlitePublicationRepository};
pub use storage::PublicationStore;
