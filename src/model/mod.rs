pub mod attendance;
pub mod calendar;
pub mod exception;
pub mod interval;
pub mod role;
