//! Platform type names and the base-type hierarchy used for queries
//!
//! Querying a base type returns every entity whose concrete type derives from it,
//! so `IRecipient` yields roles, employees, departments and business units alike.

pub const RECIPIENT: &str = "Sungero.CoreEntities.IRecipient";
pub const ROLE: &str = "Sungero.CoreEntities.IRole";
pub const USER: &str = "Sungero.CoreEntities.IUser";
pub const EMPLOYEE: &str = "Sungero.Company.IEmployee";
pub const DEPARTMENT: &str = "Sungero.Company.IDepartment";
pub const BUSINESS_UNIT: &str = "Sungero.Company.IBusinessUnit";

pub const APPROVAL_RULE_BASE: &str = "Sungero.Docflow.IApprovalRuleBase";
pub const APPROVAL_RULE: &str = "Sungero.Docflow.IApprovalRule";
pub const CONTRACTS_APPROVAL_RULE: &str = "Sungero.Contracts.IContractsApprovalRule";
pub const CONDITION_BASE: &str = "Sungero.Docflow.IConditionBase";
pub const CONDITION: &str = "Sungero.Docflow.ICondition";
pub const CONTRACT_CONDITION: &str = "Sungero.Contracts.IContractCondition";
pub const APPROVAL_STAGE: &str = "Sungero.Docflow.IApprovalStage";
pub const APPROVAL_ROLE_BASE: &str = "Sungero.Docflow.IApprovalRoleBase";
pub const APPROVAL_ROLE: &str = "Sungero.Docflow.IApprovalRole";

pub const DOCUMENT_KIND: &str = "Sungero.Docflow.IDocumentKind";
pub const DOCUMENT_GROUP_BASE: &str = "Sungero.Docflow.IDocumentGroupBase";
pub const CONTRACT_CATEGORY: &str = "Sungero.Contracts.IContractCategory";
pub const CURRENCY: &str = "Sungero.Commons.ICurrency";
pub const MAIL_DELIVERY_METHOD: &str = "Sungero.Docflow.IMailDeliveryMethod";

pub const DOCUMENT_REGISTER: &str = "Sungero.Docflow.IDocumentRegister";
pub const REGISTRATION_GROUP: &str = "Sungero.Docflow.IRegistrationGroup";
pub const REGISTRATION_SETTING: &str = "Sungero.Docflow.IRegistrationSetting";

/// (type, direct base type)
const HIERARCHY: &[(&str, &str)] = &[
    (ROLE, RECIPIENT),
    (USER, RECIPIENT),
    (EMPLOYEE, USER),
    (DEPARTMENT, RECIPIENT),
    (BUSINESS_UNIT, RECIPIENT),
    (APPROVAL_RULE, APPROVAL_RULE_BASE),
    (CONTRACTS_APPROVAL_RULE, APPROVAL_RULE_BASE),
    (CONDITION, CONDITION_BASE),
    (CONTRACT_CONDITION, CONDITION_BASE),
    (APPROVAL_ROLE, APPROVAL_ROLE_BASE),
    (CONTRACT_CATEGORY, DOCUMENT_GROUP_BASE),
];

/// Direct base type, `None` for roots and unknown types
pub fn base_type(type_name: &str) -> Option<&'static str> {
    HIERARCHY
        .iter()
        .find(|(derived, _)| *derived == type_name)
        .map(|(_, base)| *base)
}

/// True when an entity of `concrete` type is returned by a query for `requested`
pub fn is_assignable(concrete: &str, requested: &str) -> bool {
    let mut current = Some(concrete);
    while let Some(type_name) = current {
        if type_name == requested {
            return true;
        }
        current = base_type(type_name);
    }
    false
}
