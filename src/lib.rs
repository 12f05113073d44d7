pub mod apply;
pub mod cli;
pub mod client;
pub mod config;
mod errors;
pub mod reconcile;
mod scheme;
pub mod transform;
mod types;

pub use apply::apply_plan;
pub use client::{DhcpApi, HttpDhcpClient};
pub use config::{EndpointConfig, TlsConfig};
pub use errors::{ApplyOp, SyncError};
pub use reconcile::{build_plan, index_by_ip};
pub use scheme::Scheme;
pub use transform::{form_fields, prepare_for_write};
pub use types::{LeaseDetail, ReconciliationPlan, Reservation, Side, SyncOptions, SyncStats};
