pub mod attendance;
pub mod exception;
