//! Declarative reconciliation of LibreNMS entities.
//!
//! Given the desired state of a device, device group, alert rule, location,
//! or service, the engine computes and applies the minimal set of LibreNMS
//! API calls that brings the remote system in line:
//!
//! - **[`Reconciler`]**: create, read, update, delete, and import for any
//!   [`Resource`], over any [`NmsApi`] implementation (the real
//!   [`lnms_api::NmsClient`] or an in-memory fake).
//!
//! - **Rule trees** ([`rules`]): the query-builder JSON LibreNMS uses for
//!   dynamic group membership and alert conditions, encoded and decoded
//!   with structural comparison.
//!
//! - **Variants** ([`variant`]): mutually exclusive attribute clusters
//!   such as the SNMP v1 / v2c / v3 / ICMP-only access modes of a device.
//!
//! - **Planning** ([`plan`]): field-level diffs between desired and remote
//!   snapshots, honouring write-only and computed attributes.
//!
//! - **Identity recovery** ([`identity`]): finding the id of a created
//!   entity when the create call does not return one.

pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod import;
pub mod plan;
pub mod reconciler;
pub mod refresh;
pub mod remote;
pub mod resource;
pub mod resources;
pub mod rules;
pub mod variant;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use entity::{EntityId, EntityKind, Operation, ParseIdError};
pub use error::{Error, ErrorKind};
pub use plan::{FieldChange, FieldPolicy, FieldValue, Snapshot, UpdatePlan};
pub use reconciler::{Reconciler, plan_update};
pub use remote::NmsApi;
pub use resource::Resource;
pub use rules::{Condition, Operator, Predicate, RuleGroup, RuleNode, RuleSource, RuleTreeError};

pub use resources::{
    AlertRule, AuthAlgorithm, AuthLevel, CryptoAlgorithm, Device, DeviceAccess, DeviceGroup,
    DeviceGroupState, GroupType, IcmpOnly, Location, Membership, Service, Severity, SnmpCommunity,
    SnmpV3, Transport,
};
