// LibreNMS API response types
//
// Every v0 endpoint answers with `{"status": "ok"|"error", "message": ..}`
// plus a collection key that varies per endpoint (`devices`, `groups`,
// `rules`, ..). The client checks `status` before these types are decoded.
// Fields use `#[serde(default)]` liberally because LibreNMS returns
// database columns verbatim and is inconsistent about types across
// versions (booleans as 0/1, coordinates as strings).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for create and sparse-update calls.
pub type Payload = serde_json::Map<String, Value>;

/// One `(field, value)` pair of a device update.
///
/// The devices endpoint takes parallel `field`/`data` arrays; those are
/// built from a slice of these only when the request body is written.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

// ── Create ──────────────────────────────────────────────────────────

/// Response to any create call.
///
/// Only device groups reliably return `id`. Services embed the new id in
/// `message` ("Service ping has been added to device 2 (#5)").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
}

// ── Device ──────────────────────────────────────────────────────────

/// Device row from `GET devices/{id|hostname}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub device_id: u32,
    pub hostname: String,
    #[serde(default, rename = "sysName")]
    pub sys_name: Option<String>,
    #[serde(default)]
    pub hardware: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub snmp_disable: bool,
    #[serde(default)]
    pub snmpver: Option<String>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub authlevel: Option<String>,
    #[serde(default)]
    pub authname: Option<String>,
    #[serde(default)]
    pub authpass: Option<String>,
    #[serde(default)]
    pub authalgo: Option<String>,
    #[serde(default)]
    pub cryptopass: Option<String>,
    #[serde(default)]
    pub cryptoalgo: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub port: Option<u32>,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub poller_group: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub port_association_mode: Option<u32>,
    #[serde(
        default,
        rename = "override_sysLocation",
        deserialize_with = "lenient::flag"
    )]
    pub override_sys_location: bool,
}

// ── Device group ────────────────────────────────────────────────────

/// Device group from `GET devicegroups`.
///
/// `rules` is the stored query-builder tree; older installs return it as
/// a JSON-encoded string rather than an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceGroupRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(rename = "type")]
    pub group_type: String,
    #[serde(default, deserialize_with = "lenient::opt_json")]
    pub rules: Option<Value>,
}

/// One member of a device group, from `GET devicegroups/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(deserialize_with = "lenient::id")]
    pub device_id: u32,
}

// ── Alert rule ──────────────────────────────────────────────────────

/// Alert rule from `GET rules[/{id}]`.
///
/// `extra` folds `mute`, `count`, `delay`, and `interval` into one JSON
/// blob (with delay/interval converted to seconds); it is never split
/// back out on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertRuleRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u32,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_json_text")]
    pub builder: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub disabled: bool,
    #[serde(default, deserialize_with = "lenient::opt_json_text")]
    pub extra: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub proc: Option<String>,
    #[serde(default)]
    pub devices: Option<Vec<u32>>,
    #[serde(default)]
    pub groups: Option<Vec<u32>>,
    #[serde(default)]
    pub locations: Option<Vec<u32>>,
}

// ── Location ────────────────────────────────────────────────────────

/// Location from `GET location/{id}` or `GET resources/locations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u32,
    pub location: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub fixed_coordinates: bool,
}

// ── Service ─────────────────────────────────────────────────────────

/// Service check from `GET services/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub service_id: u32,
    #[serde(deserialize_with = "lenient::id")]
    pub device_id: u32,
    #[serde(default)]
    pub service_ip: Option<String>,
    pub service_type: String,
    #[serde(default)]
    pub service_desc: Option<String>,
    #[serde(default)]
    pub service_param: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub service_ignore: bool,
    #[serde(default)]
    pub service_name: Option<String>,
}

// ── Collection wrappers ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupList {
    #[serde(default)]
    pub groups: Vec<DeviceGroupRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberList {
    #[serde(default)]
    pub devices: Vec<GroupMember>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuleList {
    #[serde(default)]
    pub rules: Vec<AlertRuleRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationList {
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationOne {
    #[serde(default)]
    pub get_location: Option<LocationRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceList {
    #[serde(default, deserialize_with = "lenient::nested_list")]
    pub services: Vec<ServiceRecord>,
}

// ── Lenient decoding ────────────────────────────────────────────────

mod lenient {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(!matches!(n.as_f64(), Some(v) if v.abs() < f64::EPSILON)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" | "off" => Ok(false),
                "1" | "true" | "yes" | "on" => Ok(true),
                other => Err(D::Error::custom(format!("invalid boolean flag: {other:?}"))),
            },
            other => Err(D::Error::custom(format!("invalid boolean flag: {other}"))),
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        opt_u32(d)?.ok_or_else(|| D::Error::custom("missing numeric id"))
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("out of range: {n}"))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid integer {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected integer, got {other}"))),
        }
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid number {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected number, got {other}"))),
        }
    }

    /// JSON column that may arrive as an object or as its encoded string.
    pub fn opt_json<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid embedded JSON: {e}"))),
            other => Ok(Some(other)),
        }
    }

    /// JSON column kept as text, encoding it if it arrived as an object.
    pub fn opt_json_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    /// Some endpoints wrap each row in its own array (`[[{..}], [{..}]]`).
    pub fn nested_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let mut rows = Vec::new();
        for item in Vec::<Value>::deserialize(d)? {
            match item {
                Value::Array(inner) => rows.extend(inner),
                other => rows.push(other),
            }
        }
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(D::Error::custom))
            .collect()
    }
}
