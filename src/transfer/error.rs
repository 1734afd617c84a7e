use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("serializer {name} not found")]
    SerializerNotFound { name: String },
    #[error("serializer {name} is registered more than once")]
    DuplicateSerializer { name: String },
    #[error("{entity} {name} already exists")]
    Duplicate { entity: String, name: String },
    #[error("{type_name} {name} not found (field {field})")]
    MissingReference {
        field: String,
        type_name: String,
        name: String,
    },
    #[error("invalid record: {field}: {reason}")]
    InvalidRecord { field: String, reason: String },
    #[error("malformed envelope: {0}")]
    Format(String),
    #[error("envelope has no meta record and no entity type was supplied")]
    MissingMeta,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingReference {
            field: field.into(),
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub fn duplicate(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            entity: entity.into(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SerializerNotFound { .. } | Self::DuplicateSerializer { .. } => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::MissingReference { .. } => ErrorKind::MissingReference,
            Self::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            Self::Format(_) | Self::MissingMeta => ErrorKind::Format,
            Self::Repository(_) | Self::Io { .. } => ErrorKind::Repository,
        }
    }
}

/// Coarse error class carried in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    MissingReference,
    InvalidRecord,
    Format,
    Repository,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::MissingReference => "missing reference",
            ErrorKind::InvalidRecord => "invalid record",
            ErrorKind::Format => "format error",
            ErrorKind::Repository => "repository failure",
        };
        f.write_str(label)
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
