pub mod reconcile;
pub mod routing;
pub mod workflow;
