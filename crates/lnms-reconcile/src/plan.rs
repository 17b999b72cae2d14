// Diff-based update planning
//
// LibreNMS only supports sparse updates for most entities, so an update
// is a list of (field, value) pairs: every updatable field whose desired
// value differs from the remote snapshot. An empty plan means nothing is
// sent.

use std::collections::{BTreeMap, BTreeSet};

use lnms_api::{FieldUpdate, Payload};
use serde_json::Value;
use tracing::debug;

use crate::variant::VariantGroup;

// ── Values ──────────────────────────────────────────────────────────

/// A typed field value, compared by value.
///
/// Id lists are sets so membership order never shows up as drift. JSON
/// documents compare structurally and go over the wire encoded as a
/// string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Ids(BTreeSet<u32>),
    Json(Value),
}

impl FieldValue {
    /// The JSON value sent to the remote API.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::Ids(ids) => Value::Array(ids.iter().map(|id| Value::from(*id)).collect()),
            Self::Json(v) => Value::String(v.to_string()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u8> for FieldValue {
    fn from(i: u8) -> Self {
        Self::Int(i.into())
    }
}

impl From<u16> for FieldValue {
    fn from(i: u16) -> Self {
        Self::Int(i.into())
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<BTreeSet<u32>> for FieldValue {
    fn from(ids: BTreeSet<u32>) -> Self {
        Self::Ids(ids)
    }
}

impl From<&BTreeSet<u32>> for FieldValue {
    fn from(ids: &BTreeSet<u32>) -> Self {
        Self::Ids(ids.clone())
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// Field values keyed by remote (update-wire) field name.
pub type Fields = BTreeMap<&'static str, FieldValue>;

// ── Snapshots & policy ──────────────────────────────────────────────

/// One side of a diff: flat field values plus the active cluster of each
/// variant group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub fields: Fields,
    pub variants: BTreeMap<&'static str, &'static str>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &'static str, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    /// Set `field` only if `value` is present; absent means unmanaged.
    pub fn set_opt(&mut self, field: &'static str, value: Option<impl Into<FieldValue>>) {
        if let Some(value) = value {
            self.fields.insert(field, value.into());
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Record `cluster` as active in `group` and merge its flat fields.
    pub fn activate(&mut self, group: &'static str, cluster: &'static str, fields: Fields) {
        self.variants.insert(group, cluster);
        self.fields.extend(fields);
    }

    pub fn active(&self, group: &str) -> Option<&'static str> {
        self.variants.get(group).copied()
    }

    /// `self` with every field and active cluster of `over` laid on top.
    #[must_use]
    pub fn merged(&self, over: &Snapshot) -> Snapshot {
        let mut merged = self.clone();
        merged
            .fields
            .extend(over.fields.iter().map(|(k, v)| (*k, v.clone())));
        merged.variants.extend(over.variants.iter());
        merged
    }

    /// All present fields as a request body, renaming per `aliases`.
    pub fn to_payload(&self, aliases: &[(&str, &str)]) -> Payload {
        self.fields
            .iter()
            .map(|(field, value)| {
                let name = aliases
                    .iter()
                    .find_map(|(from, to)| (from == field).then_some(*to))
                    .unwrap_or(*field);
                (name.to_owned(), value.to_wire())
            })
            .collect()
    }
}

/// How each field of an entity takes part in diffing.
#[derive(Debug)]
pub struct FieldPolicy {
    /// Fields that may appear in a plan, in emission order.
    pub updatable: &'static [&'static str],
    /// Accepted on write but never echoed back by reads.
    pub write_only: &'static [&'static str],
    /// Server-assigned; never planned.
    pub computed: &'static [&'static str],
    /// Mutually exclusive clusters whose fields are all re-sent on a switch.
    pub variants: &'static [VariantGroup],
}

// ── Plan ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: &'static str,
    pub value: FieldValue,
}

/// Ordered field changes, in [`FieldPolicy::updatable`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan(Vec<FieldChange>);

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.0.iter()
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|c| c.field).collect()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.iter().find(|c| c.field == field).map(|c| &c.value)
    }

    /// As a PATCH body, renaming per `aliases`.
    pub fn to_payload(&self, aliases: &[(&str, &str)]) -> Payload {
        self.0
            .iter()
            .map(|c| {
                let name = aliases
                    .iter()
                    .find_map(|(from, to)| (*from == c.field).then_some(*to))
                    .unwrap_or(c.field);
                (name.to_owned(), c.value.to_wire())
            })
            .collect()
    }

    /// As `(field, value)` pairs for the devices endpoint.
    pub fn to_field_updates(&self) -> Vec<FieldUpdate> {
        self.0
            .iter()
            .map(|c| FieldUpdate::new(c.field, c.value.to_wire()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a UpdatePlan {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Diff `desired` against `remote`.
///
/// Write-only fields are skipped entirely: their drift can't be observed.
pub fn plan(desired: &Snapshot, remote: &Snapshot, policy: &FieldPolicy) -> UpdatePlan {
    diff(desired, remote, None, policy)
}

/// Diff `desired` against `remote`, comparing write-only fields against
/// the values last applied instead.
pub fn plan_with_last_applied(
    desired: &Snapshot,
    remote: &Snapshot,
    last_applied: &Snapshot,
    policy: &FieldPolicy,
) -> UpdatePlan {
    diff(desired, remote, Some(last_applied), policy)
}

fn diff(
    desired: &Snapshot,
    remote: &Snapshot,
    last_applied: Option<&Snapshot>,
    policy: &FieldPolicy,
) -> UpdatePlan {
    // A cluster switch re-sends the whole new cluster.
    let mut forced: BTreeSet<&str> = BTreeSet::new();
    for group in policy.variants {
        let Some(want) = desired.active(group.name) else {
            continue;
        };
        if remote.active(group.name) == Some(want) {
            continue;
        }
        if let Some(cluster) = group.cluster(want) {
            debug!(
                group = group.name,
                from = remote.active(group.name).unwrap_or("none"),
                to = want,
                "variant switch"
            );
            forced.extend(cluster.fields.iter().copied());
        }
    }

    let mut changes = Vec::new();
    for &field in policy.updatable {
        if policy.computed.contains(&field) {
            continue;
        }
        let Some(value) = desired.get(field) else {
            continue;
        };

        let changed = if forced.contains(field) {
            true
        } else if policy.write_only.contains(&field) {
            last_applied.is_some_and(|last| last.get(field) != Some(value))
        } else {
            remote.get(field) != Some(value)
        };

        if changed {
            changes.push(FieldChange {
                field,
                value: value.clone(),
            });
        }
    }

    UpdatePlan(changes)
}
