use thiserror::Error;

/// All errors that can occur in scholarfeed-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Publication not found: {0}")]
    PublicationNotFound(String),

    #[error("Duplicate publication: {0}")]
    DuplicatePublication(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CoreError {
    /// True for the storage-level uniqueness violation on `external_id`.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CoreError::DuplicatePublication(_))
    }
}

/// Process exit codes used by the `scholarfeed` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    StorageError = 4,
    NetworkError = 6,
    ConfirmRequired = 8,
}

pub type Result<T> = std::result::Result<T, CoreError>;
