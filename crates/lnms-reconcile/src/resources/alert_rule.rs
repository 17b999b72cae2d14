// Alert rule resource
//
// LibreNMS folds `mute`, `count`, `delay`, and `interval` into a derived
// `extra` blob and never splits it back out, so those four are write-only
// here. Alert rules only accept whole-document updates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

use lnms_api::{AlertRuleRecord, Payload};

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::identity;
use crate::plan::{FieldPolicy, Snapshot, UpdatePlan};
use crate::refresh::{membership, parse_known, preserve};
use crate::remote::NmsApi;
use crate::resource::Resource;
use crate::rules::RuleSource;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Critical,
}

/// Desired state of an alert rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    /// Query-builder tree as JSON text.
    pub builder: String,
    pub severity: Severity,
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_alerts: Option<u32>,
    /// e.g. `5m`, `1h`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<BTreeSet<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeSet<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<BTreeSet<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_url: Option<String>,
    /// Set by LibreNMS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// SQL rendered from `builder`. Set by LibreNMS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

static POLICY: FieldPolicy = FieldPolicy {
    updatable: &[
        "name",
        "builder",
        "severity",
        "disabled",
        "mute",
        "count",
        "delay",
        "interval",
        "devices",
        "groups",
        "locations",
        "notes",
        "proc",
    ],
    write_only: &["mute", "count", "delay", "interval"],
    computed: &["id", "extra", "query"],
    variants: &[],
};

/// Target lists the remote system requires even when empty.
const TARGETS: [&str; 3] = ["devices", "groups", "locations"];

impl AlertRule {
    fn builder_value(&self) -> Result<Value, ErrorKind> {
        RuleSource::raw(&self.builder)
            .map(|source| source.to_value())
            .map_err(|source| ErrorKind::MalformedRuleTree {
                attribute: "builder",
                source,
            })
    }
}

/// The whole rule as a request body.
fn document(snapshot: &Snapshot) -> Payload {
    let mut payload = snapshot.to_payload(&[]);
    for target in TARGETS {
        payload
            .entry(target)
            .or_insert_with(|| Value::Array(Vec::new()));
    }
    payload
}

impl Resource for AlertRule {
    const KIND: EntityKind = EntityKind::AlertRule;
    const POLICY: &'static FieldPolicy = &POLICY;

    type Record = AlertRuleRecord;

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
        if self.name.trim().is_empty() {
            return Err(ErrorKind::ValidationFailed {
                attribute: "name",
                reason: "must not be empty".into(),
            });
        }
        self.builder_value().map(drop)
    }

    fn snapshot(&self) -> Result<Snapshot, ErrorKind> {
        let mut snapshot = Snapshot::new();
        snapshot.set("name", &self.name);
        if !self.builder.is_empty() {
            snapshot.set("builder", self.builder_value()?);
        }
        snapshot.set("severity", <&'static str>::from(self.severity));
        snapshot.set("disabled", self.disabled);
        snapshot.set_opt("mute", self.mute);
        snapshot.set_opt("count", self.max_alerts);
        snapshot.set_opt("delay", self.delay.as_ref());
        snapshot.set_opt("interval", self.interval.as_ref());
        snapshot.set_opt("devices", self.devices.as_ref());
        snapshot.set_opt("groups", self.groups.as_ref());
        snapshot.set_opt("locations", self.locations.as_ref());
        snapshot.set_opt("notes", self.notes.as_ref());
        snapshot.set_opt("proc", self.procedure_url.as_ref());
        Ok(snapshot)
    }

    fn refresh(&self, record: AlertRuleRecord) -> Self {
        Self {
            id: EntityId::new(record.id).ok().or(self.id),
            name: record.name,
            builder: record.builder.unwrap_or_else(|| self.builder.clone()),
            severity: parse_known(EntityKind::AlertRule, "severity", record.severity.as_deref())
                .unwrap_or(self.severity),
            disabled: record.disabled,
            mute: preserve(self.mute.as_ref()),
            max_alerts: preserve(self.max_alerts.as_ref()),
            delay: preserve(self.delay.as_ref()),
            interval: preserve(self.interval.as_ref()),
            devices: membership(record.devices),
            groups: membership(record.groups),
            locations: membership(record.locations),
            notes: record.notes,
            procedure_url: record.proc,
            extra: record.extra,
            query: record.query,
        }
    }

    async fn create<A: NmsApi>(&self, api: &A, snapshot: &Snapshot) -> Result<EntityId, ErrorKind> {
        api.create_alert_rule(&document(snapshot)).await?;

        let found = identity::match_unique(
            api.list_alert_rules().await?,
            "name",
            &self.name,
            |r| r.name.as_str(),
        )?;
        identity::recovered_id(found.id)
    }

    async fn fetch<A: NmsApi>(api: &A, id: EntityId) -> Result<Vec<AlertRuleRecord>, ErrorKind> {
        Ok(api.get_alert_rule(id.get()).await?)
    }

    async fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        _plan: &UpdatePlan,
        document_snapshot: &Snapshot,
    ) -> Result<(), ErrorKind> {
        let mut payload = document(document_snapshot);
        payload.insert("rule_id".into(), Value::from(id.get()));
        api.update_alert_rule(&payload).await?;
        Ok(())
    }

    async fn remove<A: NmsApi>(api: &A, id: EntityId) -> Result<(), ErrorKind> {
        api.delete_alert_rule(id.get()).await?;
        Ok(())
    }
}
