//! Entity-graph transfer between platform instances
//!
//! A record and everything it references is exported into a self-describing JSON
//! envelope, and rebuilt on import with every reference re-resolved by name
//! against the target repository.

pub mod document;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod serializer;

pub use document::{Card, ReferenceDoc};
pub use engine::TransferEngine;
pub use envelope::{CARD_KEY, Envelope, META_TAG, MetaRecord, Record, decode, encode};
pub use error::{ErrorKind, Result, TransferError};
pub use registry::SerializerRegistry;
pub use report::{ExportReport, ImportReport, RecordFailure};
pub use serializer::{EntitySerializer, ImportedEntity};
