//! Document flow and the rule shape it selects

use std::fmt;
use std::str::FromStr;

use crate::repository::catalog::{APPROVAL_RULE, CONDITION, CONTRACT_CONDITION, CONTRACTS_APPROVAL_RULE};
use crate::transfer::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFlow {
    Incoming,
    Outgoing,
    Inner,
    Contracts,
}

impl DocumentFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFlow::Incoming => "Incoming",
            DocumentFlow::Outgoing => "Outgoing",
            DocumentFlow::Inner => "Inner",
            DocumentFlow::Contracts => "Contracts",
        }
    }

    pub fn rule_kind(&self) -> RuleKind {
        match self {
            DocumentFlow::Contracts => RuleKind::Contracts,
            _ => RuleKind::General,
        }
    }
}

impl FromStr for DocumentFlow {
    type Err = TransferError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Incoming" => Ok(DocumentFlow::Incoming),
            "Outgoing" => Ok(DocumentFlow::Outgoing),
            "Inner" => Ok(DocumentFlow::Inner),
            "Contracts" => Ok(DocumentFlow::Contracts),
            other => Err(TransferError::invalid(
                "Card.DocumentFlow",
                format!("unknown document flow '{}'", other),
            )),
        }
    }
}

impl fmt::Display for DocumentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two record shapes of an approval rule
///
/// Contracts rules use their own rule and condition types, carry document groups
/// and have no condition addressees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    General,
    Contracts,
}

impl RuleKind {
    /// Kind of a stored rule by its concrete type
    pub fn of_type(type_name: &str) -> Option<Self> {
        match type_name {
            APPROVAL_RULE => Some(RuleKind::General),
            CONTRACTS_APPROVAL_RULE => Some(RuleKind::Contracts),
            _ => None,
        }
    }

    pub fn rule_type(&self) -> &'static str {
        match self {
            RuleKind::General => APPROVAL_RULE,
            RuleKind::Contracts => CONTRACTS_APPROVAL_RULE,
        }
    }

    pub fn condition_type(&self) -> &'static str {
        match self {
            RuleKind::General => CONDITION,
            RuleKind::Contracts => CONTRACT_CONDITION,
        }
    }

    pub fn has_document_groups(&self) -> bool {
        matches!(self, RuleKind::Contracts)
    }

    pub fn has_addressees(&self) -> bool {
        matches!(self, RuleKind::General)
    }
}
