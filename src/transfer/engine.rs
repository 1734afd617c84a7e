//! Export and import pipelines
//!
//! The engine resolves a serializer and drives it record by record. Each record is
//! processed inside its own failure boundary: a failed record is logged, counted
//! and skipped, and the shared repository session stays open for the next one.
//! Serializers stage a record's entities only once it is fully built and commit
//! them themselves; records already committed stay when a later one fails.

use log::{error, info, warn};
use std::path::Path;

use super::envelope::{self, Envelope, MetaRecord};
use super::error::{Result, TransferError};
use super::registry::SerializerRegistry;
use super::report::{ExportReport, ImportReport, RecordFailure};
use crate::repository::Repository;

pub struct TransferEngine<R: Repository> {
    registry: SerializerRegistry,
    repository: R,
    pretty: bool,
}

impl<R: Repository> TransferEngine<R> {
    pub fn new(registry: SerializerRegistry, repository: R) -> Self {
        Self {
            registry,
            repository,
            pretty: true,
        }
    }

    /// Indented (default) or compact JSON output
    pub fn with_pretty_output(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Export every record of a logical entity type into an envelope
    pub async fn export(&self, entity_name: &str) -> Result<(Envelope, ExportReport)> {
        info!("Loading serializer {}", entity_name);
        let serializer = self.registry.require(entity_name)?;
        let type_name = serializer.entity_type_name();

        info!("Serializing entities of type {}", type_name);
        let entities = serializer.filter(self.repository.get_entities(type_name).await?);
        let total = entities.len();
        info!("Found {} entities", total);

        let mut report = ExportReport::new(entity_name);
        report.found = total;
        let mut records = Vec::with_capacity(total);

        for (position, entity) in entities.iter().enumerate() {
            let index = position + 1;
            info!("Processing record {} of {}. Id = {}", index, total, entity.id);
            match serializer.export(&self.repository, entity).await {
                Ok(record) => {
                    records.push(record);
                    report.exported += 1;
                }
                Err(e) => {
                    error!("Record {} ('{}') not exported: {}", index, entity.name(), e);
                    report
                        .failures
                        .push(RecordFailure::new(index, Some(entity.name().to_string()), &e));
                }
            }
        }

        let meta = MetaRecord::new(serializer.entity_name(), type_name);
        Ok((Envelope::new(meta, records), report))
    }

    /// Export into a file, replacing it
    pub async fn export_to_file(&self, entity_name: &str, path: &Path) -> Result<ExportReport> {
        let (envelope, report) = self.export(entity_name).await?;
        let bytes = envelope::encode(&envelope, self.pretty)?;

        info!("Writing {} records to {:?}", envelope.len(), path);
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| TransferError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(report)
    }

    /// Import every record of an envelope
    ///
    /// The header selects the serializer; `hint` is used only when the envelope has
    /// none. Serializer resolution happens before any repository call.
    pub async fn import(&mut self, envelope: Envelope, hint: Option<&str>) -> Result<ImportReport> {
        let entity_name = match (&envelope.meta, hint) {
            (Some(meta), Some(hint)) if meta.entity_name != hint => {
                warn!(
                    "Entity type hint {} ignored, envelope header names {}",
                    hint, meta.entity_name
                );
                meta.entity_name.clone()
            }
            (Some(meta), _) => meta.entity_name.clone(),
            (None, Some(hint)) => {
                info!("Envelope has no header, using entity type {}", hint);
                hint.to_string()
            }
            (None, None) => return Err(TransferError::MissingMeta),
        };

        info!("Loading serializer {}", entity_name);
        let serializer = self.registry.require(&entity_name)?;
        info!("Serializer {} loaded", entity_name);

        let total = envelope.records.len();
        let mut report = ImportReport::new(&entity_name);
        report.attempted = total;

        for (position, record) in envelope.records.iter().enumerate() {
            let index = position + 1;
            info!("Record {} of {}", index, total);
            match serializer.import(&mut self.repository, record).await {
                Ok(imported) => {
                    info!("Record {} created with id {}", index, imported.id);
                    report.imported.push(imported);
                }
                Err(e) => {
                    let name = record.display_name();
                    error!(
                        "Record {} ('{}') not created: {}",
                        index,
                        name.as_deref().unwrap_or("<unnamed>"),
                        e
                    );
                    report.failures.push(RecordFailure::new(index, name, &e));
                }
            }
        }

        Ok(report)
    }

    /// Read, decode and import a file
    pub async fn import_file(&mut self, path: &Path, hint: Option<&str>) -> Result<ImportReport> {
        info!("Reading {:?}", path);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TransferError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let envelope = envelope::decode(&bytes)?;
        self.import(envelope, hint).await
    }
}
