// Managed LibreNMS entities

pub mod alert_rule;
pub mod device;
pub mod device_group;
pub mod location;
pub mod service;

pub use alert_rule::{AlertRule, Severity};
pub use device::{
    AuthAlgorithm, AuthLevel, CryptoAlgorithm, Device, DeviceAccess, IcmpOnly, SnmpCommunity,
    SnmpV3, Transport,
};
pub use device_group::{DeviceGroup, DeviceGroupState, GroupType, Membership};
pub use location::Location;
pub use service::Service;
