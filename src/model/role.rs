use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Actor roles on the factory floor. Authorization is an explicit capability
/// check against the role required at the current workflow state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    Supervisor,
    Manager,
    Staff,
}

/// Departments that can be assigned a routed exception for staff confirmation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Pmc,
    Quality,
    AfterSales,
}
