// Device resource
//
// A device is reached over SNMP v1, v2c, or v3, or polled by ICMP only.
// Those four shapes form the `access` variant group. Updates go out as
// the devices endpoint's sparse `field`/`data` arrays.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::warn;

use lnms_api::DeviceRecord;

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::identity;
use crate::plan::{FieldPolicy, Fields, Snapshot, UpdatePlan};
use crate::refresh::{narrow, parse_known, preserve};
use crate::remote::NmsApi;
use crate::resource::Resource;
use crate::variant::{self, Resolved, Variant, VariantCluster, VariantGroup, put};

// ── Value domains ───────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Udp,
    Tcp,
    Udp6,
    Tcp6,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum AuthAlgorithm {
    #[strum(serialize = "MD5")]
    #[serde(rename = "MD5")]
    Md5,
    #[strum(serialize = "SHA")]
    #[serde(rename = "SHA")]
    Sha,
    #[strum(serialize = "SHA-224")]
    #[serde(rename = "SHA-224")]
    Sha224,
    #[strum(serialize = "SHA-256")]
    #[serde(rename = "SHA-256")]
    Sha256,
    #[strum(serialize = "SHA-384")]
    #[serde(rename = "SHA-384")]
    Sha384,
    #[strum(serialize = "SHA-512")]
    #[serde(rename = "SHA-512")]
    Sha512,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum AuthLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum CryptoAlgorithm {
    #[strum(serialize = "DES")]
    #[serde(rename = "DES")]
    Des,
    #[strum(serialize = "AES")]
    #[serde(rename = "AES")]
    Aes,
    #[strum(serialize = "AES-192")]
    #[serde(rename = "AES-192")]
    Aes192,
    #[strum(serialize = "AES-256")]
    #[serde(rename = "AES-256")]
    Aes256,
    #[strum(serialize = "AES-256-C")]
    #[serde(rename = "AES-256-C")]
    Aes256C,
}

// ── Access clusters ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnmpCommunity {
    pub community: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnmpV3 {
    pub auth_algorithm: AuthAlgorithm,
    pub auth_level: AuthLevel,
    pub auth_name: String,
    pub auth_pass: String,
    pub crypto_algorithm: CryptoAlgorithm,
    pub crypto_pass: String,
}

/// Polled by ICMP only; SNMP is disabled and the identifying strings SNMP
/// would have discovered can be set by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcmpOnly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_name: Option<String>,
}

/// The resolved `access` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAccess {
    SnmpV1(SnmpCommunity),
    SnmpV2c(SnmpCommunity),
    SnmpV3(SnmpV3),
    IcmpOnly(IcmpOnly),
}

pub static ACCESS: VariantGroup = VariantGroup {
    name: "access",
    clusters: &[
        VariantCluster {
            name: "snmp_v1",
            fields: &["snmp_disable", "snmpver", "community"],
        },
        VariantCluster {
            name: "snmp_v2c",
            fields: &["snmp_disable", "snmpver", "community"],
        },
        VariantCluster {
            name: "snmp_v3",
            fields: &[
                "snmp_disable",
                "snmpver",
                "authalgo",
                "authlevel",
                "authname",
                "authpass",
                "cryptoalgo",
                "cryptopass",
            ],
        },
        VariantCluster {
            name: "icmp_only",
            fields: &["snmp_disable", "hardware", "os", "sys_name"],
        },
    ],
};

impl Variant for DeviceAccess {
    fn cluster(&self) -> &'static str {
        match self {
            Self::SnmpV1(_) => "snmp_v1",
            Self::SnmpV2c(_) => "snmp_v2c",
            Self::SnmpV3(_) => "snmp_v3",
            Self::IcmpOnly(_) => "icmp_only",
        }
    }

    fn flatten(&self, out: &mut Fields) {
        match self {
            Self::SnmpV1(v1) => {
                out.insert("snmp_disable", false.into());
                out.insert("snmpver", "v1".into());
                out.insert("community", (&v1.community).into());
            }
            Self::SnmpV2c(v2c) => {
                out.insert("snmp_disable", false.into());
                out.insert("snmpver", "v2c".into());
                out.insert("community", (&v2c.community).into());
            }
            Self::SnmpV3(v3) => {
                out.insert("snmp_disable", false.into());
                out.insert("snmpver", "v3".into());
                out.insert("authalgo", <&str>::from(v3.auth_algorithm).into());
                out.insert("authlevel", <&str>::from(v3.auth_level).into());
                out.insert("authname", (&v3.auth_name).into());
                out.insert("authpass", (&v3.auth_pass).into());
                out.insert("cryptoalgo", <&str>::from(v3.crypto_algorithm).into());
                out.insert("cryptopass", (&v3.crypto_pass).into());
            }
            Self::IcmpOnly(icmp) => {
                out.insert("snmp_disable", true.into());
                put(out, "hardware", icmp.hardware.as_ref());
                put(out, "os", icmp.os.as_ref());
                put(out, "sys_name", icmp.sys_name.as_ref());
            }
        }
    }
}

// ── Device ──────────────────────────────────────────────────────────

/// Desired state of a monitored device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub hostname: String,
    /// Skip LibreNMS's reachability checks on add. Never read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_add: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_syslocation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poller_group: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// 1 ifIndex, 2 ifName, 3 ifDescr, 4 ifAlias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_association_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_v1: Option<SnmpCommunity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_v2c: Option<SnmpCommunity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_v3: Option<SnmpV3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_only: Option<IcmpOnly>,
}

static POLICY: FieldPolicy = FieldPolicy {
    updatable: &[
        "override_sysLocation",
        "poller_group",
        "port",
        "port_association_mode",
        "transport",
        "snmp_disable",
        "hardware",
        "os",
        "sys_name",
        "snmpver",
        "community",
        "authalgo",
        "authlevel",
        "authname",
        "authpass",
        "cryptoalgo",
        "cryptopass",
    ],
    write_only: &["force_add"],
    computed: &["device_id"],
    variants: std::slice::from_ref(&ACCESS),
};

/// Create takes a few fields under different names than update.
const CREATE_ALIASES: &[(&str, &str)] = &[("snmpver", "version"), ("sys_name", "sysName")];

impl Device {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Resolve the populated `access` cluster, if any.
    pub fn access(&self) -> Result<Option<Resolved<DeviceAccess>>, ErrorKind> {
        let mut populated = Vec::new();
        if let Some(v1) = &self.snmp_v1 {
            populated.push(DeviceAccess::SnmpV1(v1.clone()));
        }
        if let Some(v2c) = &self.snmp_v2c {
            populated.push(DeviceAccess::SnmpV2c(v2c.clone()));
        }
        if let Some(v3) = &self.snmp_v3 {
            populated.push(DeviceAccess::SnmpV3(v3.clone()));
        }
        if let Some(icmp) = &self.icmp_only {
            populated.push(DeviceAccess::IcmpOnly(icmp.clone()));
        }
        variant::resolve(&ACCESS, populated)
    }

    fn set_access(&mut self, access: Option<DeviceAccess>) {
        self.snmp_v1 = None;
        self.snmp_v2c = None;
        self.snmp_v3 = None;
        self.icmp_only = None;
        match access {
            Some(DeviceAccess::SnmpV1(v1)) => self.snmp_v1 = Some(v1),
            Some(DeviceAccess::SnmpV2c(v2c)) => self.snmp_v2c = Some(v2c),
            Some(DeviceAccess::SnmpV3(v3)) => self.snmp_v3 = Some(v3),
            Some(DeviceAccess::IcmpOnly(icmp)) => self.icmp_only = Some(icmp),
            None => {}
        }
    }

    /// Which access mode the remote record shows.
    ///
    /// SNMP credentials missing from the record fall back to the
    /// last-known cluster of the same version.
    fn remote_access(&self, record: &DeviceRecord) -> Option<DeviceAccess> {
        if record.snmp_disable {
            return Some(DeviceAccess::IcmpOnly(IcmpOnly {
                hardware: record.hardware.clone(),
                os: record.os.clone(),
                sys_name: record.sys_name.clone(),
            }));
        }

        let community = |last: Option<&SnmpCommunity>| {
            record
                .community
                .clone()
                .map(|community| SnmpCommunity { community })
                .or_else(|| last.cloned())
        };

        match record.snmpver.as_deref() {
            Some("v1") => community(self.snmp_v1.as_ref()).map(DeviceAccess::SnmpV1),
            Some("v2c") => community(self.snmp_v2c.as_ref()).map(DeviceAccess::SnmpV2c),
            Some("v3") => remote_v3(record)
                .or_else(|| self.snmp_v3.clone())
                .map(DeviceAccess::SnmpV3),
            other => {
                warn!(
                    device = record.device_id,
                    snmpver = other.unwrap_or("none"),
                    "unrecognized SNMP version, access left unset"
                );
                None
            }
        }
    }
}

fn remote_v3(record: &DeviceRecord) -> Option<SnmpV3> {
    let kind = EntityKind::Device;
    Some(SnmpV3 {
        auth_algorithm: parse_known(kind, "authalgo", record.authalgo.as_deref())?,
        auth_level: parse_known(kind, "authlevel", record.authlevel.as_deref())?,
        auth_name: record.authname.clone()?,
        auth_pass: record.authpass.clone()?,
        crypto_algorithm: parse_known(kind, "cryptoalgo", record.cryptoalgo.as_deref())?,
        crypto_pass: record.cryptopass.clone()?,
    })
}

impl Resource for Device {
    const KIND: EntityKind = EntityKind::Device;
    const POLICY: &'static FieldPolicy = &POLICY;

    type Record = DeviceRecord;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn seed(id: EntityId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ErrorKind> {
        if self.hostname.trim().is_empty() {
            return Err(ErrorKind::ValidationFailed {
                attribute: "hostname",
                reason: "must not be empty".into(),
            });
        }
        if self.port == Some(0) {
            return Err(ErrorKind::ValidationFailed {
                attribute: "port",
                reason: "must be between 1 and 65535".into(),
            });
        }
        if let Some(mode) = self
            .port_association_mode
            .filter(|mode| !(1..=4).contains(mode))
        {
            return Err(ErrorKind::ValidationFailed {
                attribute: "port_association_mode",
                reason: format!("{mode} is not 1 (ifIndex), 2 (ifName), 3 (ifDescr) or 4 (ifAlias)"),
            });
        }
        Ok(())
    }

    fn check_transition(&self, prior: &Self) -> Result<(), ErrorKind> {
        if !prior.hostname.is_empty() && self.hostname != prior.hostname {
            return Err(ErrorKind::ImmutableAttribute {
                attribute: "hostname",
                from: prior.hostname.clone(),
                to: self.hostname.clone(),
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot, ErrorKind> {
        let mut snapshot = Snapshot::new();
        snapshot.set("hostname", &self.hostname);
        snapshot.set_opt("force_add", self.force_add);
        snapshot.set_opt("override_sysLocation", self.override_syslocation);
        snapshot.set_opt("poller_group", self.poller_group);
        snapshot.set_opt("port", self.port);
        snapshot.set_opt("port_association_mode", self.port_association_mode);
        snapshot.set_opt("transport", self.transport.map(<&'static str>::from));
        if let Some(access) = self.access()? {
            snapshot.activate(ACCESS.name, access.cluster, access.fields);
        }
        Ok(snapshot)
    }

    fn refresh(&self, record: DeviceRecord) -> Self {
        let kind = EntityKind::Device;
        let mut refreshed = Self {
            id: EntityId::new(record.device_id).ok().or(self.id),
            hostname: record.hostname.clone(),
            force_add: preserve(self.force_add.as_ref()),
            // Non-null column on the remote; an absent flag decodes as false.
            override_syslocation: Some(record.override_sys_location),
            poller_group: narrow(kind, "poller_group", record.poller_group),
            port: narrow(kind, "port", record.port),
            port_association_mode: narrow(kind, "port_association_mode", record.port_association_mode),
            transport: parse_known(kind, "transport", record.transport.as_deref()),
            ..Self::default()
        };
        refreshed.set_access(self.remote_access(&record));
        refreshed
    }

    async fn create<A: NmsApi>(&self, api: &A, snapshot: &Snapshot) -> Result<EntityId, ErrorKind> {
        if self.force_add == Some(true) {
            warn!(hostname = %self.hostname, "force_add set, LibreNMS will skip reachability checks");
        }
        let payload = snapshot.to_payload(CREATE_ALIASES);
        api.create_device(&payload).await?;

        let found = identity::match_unique(
            api.get_device(&self.hostname).await?,
            "hostname",
            &self.hostname,
            |d| d.hostname.as_str(),
        )?;
        identity::recovered_id(found.device_id)
    }

    async fn fetch<A: NmsApi>(api: &A, id: EntityId) -> Result<Vec<DeviceRecord>, ErrorKind> {
        Ok(api.get_device(&id.to_string()).await?)
    }

    async fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        plan: &UpdatePlan,
        _document: &Snapshot,
    ) -> Result<(), ErrorKind> {
        api.update_device(&id.to_string(), &plan.to_field_updates())
            .await?;
        Ok(())
    }

    async fn remove<A: NmsApi>(api: &A, id: EntityId) -> Result<(), ErrorKind> {
        api.delete_device(&id.to_string()).await?;
        Ok(())
    }
}
