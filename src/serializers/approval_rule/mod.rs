//! Approval rules: a rule header plus its graph of stages, conditions and transitions

mod export;
pub mod flow;
pub mod graph;
mod import;

pub use flow::{DocumentFlow, RuleKind};
pub use graph::{ConditionRecord, RuleGraph, StageRecord, TransitionRecord};

use async_trait::async_trait;

use crate::repository::catalog::APPROVAL_RULE_BASE;
use crate::repository::{Entity, Repository};
use crate::transfer::serializer::active_only;
use crate::transfer::{EntitySerializer, ImportedEntity, Record, Result};

#[derive(Debug, Default)]
pub struct ApprovalRuleSerializer;

impl ApprovalRuleSerializer {
    pub const ENTITY_NAME: &'static str = "ApprovalRule";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntitySerializer for ApprovalRuleSerializer {
    fn entity_name(&self) -> &str {
        Self::ENTITY_NAME
    }

    fn entity_type_name(&self) -> &str {
        APPROVAL_RULE_BASE
    }

    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        active_only(entities)
    }

    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        export::export_rule(repo, entity).await
    }

    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
        import::import_rule(repo, record).await
    }
}
