pub mod configuration;
pub use configuration::*;

pub mod error_handling;

pub mod storage;

pub mod session_management;

pub mod usage;

pub mod nas_registry;

pub mod ingestion;

pub mod web_interface;
pub use web_interface::{ApiState, WebServer};
