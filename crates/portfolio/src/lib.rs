//! Backend for the chess coaching portfolio site: contact intake, legacy status checks and
//! store health reporting.

pub mod config;
pub mod contacts;
pub mod error;
pub mod health;
pub mod status_checks;
pub mod store;
pub mod telemetry;
