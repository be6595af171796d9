//! Core functionality: the receive-only serial byte source.

pub mod serial_service;

pub use serial_service::{SerialConfig, SerialError, SerialEvent, SerialService};
