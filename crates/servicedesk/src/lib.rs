//! Service-desk side of the self-service identity portal: the manual
//! control-code verification workflow and its contracts with the remote
//! identity authority.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
