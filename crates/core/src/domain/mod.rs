pub mod alert;
pub mod appointment;
pub mod patient;
pub mod slot;
