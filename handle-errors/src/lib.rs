use config::ConfigError;
use sqlx::migrate::MigrateError;

use tracing::{Level, event};

#[derive(Debug)]
pub enum Error {
    ParseError(std::num::ParseIntError),
    ValidationError(String),
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    DatabaseQueryError(sqlx::Error),
    MigrationError(MigrateError),
    ConfigError(ConfigError),
}

/// Coarse classification the glue layer maps onto its own transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ParseError(_) | Error::ValidationError(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::DatabaseQueryError(_) | Error::MigrationError(_) | Error::ConfigError(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Emits the error once at a level matching its kind. Caller mistakes are
    /// warnings, infrastructure failures are errors.
    pub fn trace(&self) {
        match self.kind() {
            ErrorKind::Internal => event!(Level::ERROR, "{:?}", self),
            _ => event!(Level::WARN, "{}", self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &*self {
            Error::ParseError(err) => {
                write!(f, "Cannot parse parameter: {}", err)
            }
            Error::ValidationError(message) => {
                write!(f, "Invalid input: {}", message)
            }
            Error::NotFound(what) => {
                write!(f, "{} not found", what)
            }
            Error::Forbidden(message) => {
                write!(f, "Forbidden: {}", message)
            }
            Error::Conflict(message) => {
                write!(f, "Conflict: {}", message)
            }
            Error::DatabaseQueryError(_) => {
                write!(f, "Cannot update, invalid data.")
            }
            Error::MigrationError(err) => {
                write!(f, "Cannot run migration: {}", err)
            }
            Error::ConfigError(err) => {
                write!(f, "Cannot read configuration: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParseError(err) => Some(err),
            Error::DatabaseQueryError(err) => Some(err),
            Error::MigrationError(err) => Some(err),
            Error::ConfigError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::DatabaseQueryError(err)
    }
}

impl From<MigrateError> for Error {
    fn from(err: MigrateError) -> Self {
        Error::MigrationError(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::ConfigError(err)
    }
}
