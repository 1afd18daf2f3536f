//! Workforce backend core: form submission lifecycle, profile read model and the
//! ambient configuration/telemetry stack shared by the API service.

pub mod config;
pub mod error;
pub mod forms;
pub mod profiles;
pub mod telemetry;
pub mod version;
