//! By-name reference resolution against the target repository
//!
//! Resolution is name-unique-or-first: when several candidates share a name the
//! first one in repository enumeration order wins and a warning is logged.

use log::{debug, warn};

use super::document::{Card, ReferenceDoc};
use super::error::{Result, TransferError};
use crate::repository::{Entity, Repository};

/// First entity of `type_name` named `name`, optionally restricted to active ones
pub async fn find_by_name(
    repo: &dyn Repository,
    type_name: &str,
    name: &str,
    active_only: bool,
) -> Result<Option<Entity>> {
    let mut candidates: Vec<Entity> = repo
        .get_entities(type_name)
        .await?
        .into_iter()
        .filter(|entity| entity.name() == name && (!active_only || entity.is_active()))
        .collect();

    if candidates.len() > 1 {
        warn!(
            "{} candidates of type {} are named '{}', using the first (id {})",
            candidates.len(),
            type_name,
            name,
            candidates[0].id
        );
    }

    if candidates.is_empty() {
        debug!("No {} named '{}'", type_name, name);
        return Ok(None);
    }
    Ok(Some(candidates.swap_remove(0)))
}

/// Resolve one reference document; an unresolved reference is a hard failure
pub async fn resolve_reference(
    repo: &dyn Repository,
    field: &str,
    reference: &ReferenceDoc,
    type_name: &str,
    active_only: bool,
) -> Result<Entity> {
    find_by_name(repo, type_name, &reference.name, active_only)
        .await?
        .ok_or_else(|| TransferError::missing(field, type_name, &reference.name))
}

/// Reference that must be present in the document and in the repository
pub async fn require_reference(
    repo: &dyn Repository,
    doc: &Card<'_>,
    key: &str,
    type_name: &str,
    active_only: bool,
) -> Result<Entity> {
    let reference = doc
        .reference(key)?
        .ok_or_else(|| TransferError::missing(key, type_name, "<null>"))?;
    resolve_reference(repo, key, &reference, type_name, active_only).await
}

/// Reference that may be null in the document but must resolve when present
pub async fn optional_reference(
    repo: &dyn Repository,
    doc: &Card<'_>,
    key: &str,
    type_name: &str,
    active_only: bool,
) -> Result<Option<Entity>> {
    match doc.reference(key)? {
        Some(reference) => resolve_reference(repo, key, &reference, type_name, active_only)
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// Every element of a reference list; the first unresolved element fails the whole list
pub async fn resolve_references(
    repo: &dyn Repository,
    doc: &Card<'_>,
    key: &str,
    type_name: &str,
    active_only: bool,
) -> Result<Vec<Entity>> {
    let references = doc.references(key)?;
    let mut resolved = Vec::with_capacity(references.len());
    for reference in &references {
        resolved.push(resolve_reference(repo, key, reference, type_name, active_only).await?);
    }
    debug!("Resolved {} {} references for {}", resolved.len(), type_name, key);
    Ok(resolved)
}
