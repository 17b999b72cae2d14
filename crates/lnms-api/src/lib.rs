// lnms-api: Async Rust client for the LibreNMS v0 REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod alert_rules;
mod device_groups;
mod devices;
mod locations;
mod services;

pub use client::NmsClient;
pub use error::Error;
pub use models::{
    AlertRuleRecord, CreateResponse, DeviceGroupRecord, DeviceRecord, FieldUpdate, GroupMember,
    LocationRecord, Payload, ServiceRecord,
};
pub use transport::{TlsMode, TransportConfig};
