// Device group resource
//
// A group is either static (an explicit device list) or dynamic (a rule
// tree LibreNMS evaluates). The rule tree can be given structured, or as
// pre-encoded JSON for trees the structured form can't express; never
// both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use lnms_api::DeviceGroupRecord;

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::identity;
use crate::plan::{FieldPolicy, Fields, Snapshot, UpdatePlan};
use crate::refresh::{membership, parse_known};
use crate::remote::NmsApi;
use crate::resource::Resource;
use crate::rules::{RuleGroup, RuleSource};
use crate::variant::{self, Resolved, Variant, VariantCluster, VariantGroup};

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
pub enum GroupType {
    #[default]
    Static,
    Dynamic,
}

impl GroupType {
    /// The `membership` cluster this type requires.
    fn cluster(self) -> &'static str {
        match self {
            Self::Static => "devices",
            Self::Dynamic => "rules",
        }
    }
}

/// The resolved `membership` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    Static(BTreeSet<u32>),
    Dynamic(RuleSource),
}

pub static MEMBERSHIP: VariantGroup = VariantGroup {
    name: "membership",
    clusters: &[
        VariantCluster {
            name: "devices",
            fields: &["type", "devices"],
        },
        VariantCluster {
            name: "rules",
            fields: &["type", "rules"],
        },
    ],
};

impl Variant for Membership {
    fn cluster(&self) -> &'static str {
        match self {
            Self::Static(_) => "devices",
            Self::Dynamic(_) => "rules",
        }
    }

    fn flatten(&self, out: &mut Fields) {
        match self {
            Self::Static(devices) => {
                out.insert("type", "static".into());
                out.insert("devices", devices.into());
            }
            Self::Dynamic(source) => {
                out.insert("type", "dynamic".into());
                out.insert("rules", source.to_value().into());
            }
        }
    }
}

/// Desired state of a device group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    /// Static members, by device id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<BTreeSet<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleGroup>,
    /// Pre-encoded rule tree; overrides the structured form entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_json: Option<String>,
}

/// A group record together with its static members, when it has any.
#[derive(Debug, Clone)]
pub struct DeviceGroupState {
    pub group: DeviceGroupRecord,
    pub members: Option<Vec<u32>>,
}

static POLICY: FieldPolicy = FieldPolicy {
    updatable: &["name", "desc", "type", "devices", "rules"],
    write_only: &[],
    computed: &["id"],
    variants: std::slice::from_ref(&MEMBERSHIP),
};

impl DeviceGroup {
    pub fn new_static(name: impl Into<String>, devices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            group_type: GroupType::Static,
            devices: Some(devices.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn new_dynamic(name: impl Into<String>, rules: RuleGroup) -> Self {
        Self {
            name: name.into(),
            group_type: GroupType::Dynamic,
            rules: Some(rules),
            ..Self::default()
        }
    }

    /// The single rule representation in use, if any.
    pub fn rule_source(&self) -> Result<Option<RuleSource>, ErrorKind> {
        match (&self.rules, &self.rules_json) {
            (Some(_), Some(_)) => Err(ErrorKind::ConflictingRuleRepresentation {
                attributes: ["rules", "rules_json"],
            }),
            (Some(tree), None) => {
                tree.validate()
                    .map_err(|source| ErrorKind::MalformedRuleTree {
                        attribute: "rules",
                        source,
                    })?;
                Ok(Some(RuleSource::Tree(tree.clone())))
            }
            (None, Some(encoded)) => RuleSource::raw(encoded)
                .map(Some)
                .map_err(|source| ErrorKind::MalformedRuleTree {
                    attribute: "rules_json",
                    source,
                }),
            (None, None) => Ok(None),
        }
    }

    /// Resolve the populated `membership` cluster, if any.
    pub fn membership(&self) -> Result<Option<Resolved<Membership>>, ErrorKind> {
        let mut populated = Vec::new();
        if let Some(devices) = &self.devices {
            populated.push(Membership::Static(devices.clone()));
        }
        if let Some(source) = self.rule_source()? {
            populated.push(Membership::Dynamic(source));
        }
        variant::resolve(&MEMBERSHIP, populated)
    }
}

impl Resource for DeviceGroup {
    const KIND: EntityKind = EntityKind::DeviceGroup;
    const POLICY: &'static FieldPolicy = &POLICY;

    type Record = DeviceGroupState;

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
        let active = self.membership()?.map(|m| m.cluster);
        variant::require(
            "type",
            self.group_type.into(),
            self.group_type.cluster(),
            active,
        )
    }

    fn snapshot(&self) -> Result<Snapshot, ErrorKind> {
        let mut snapshot = Snapshot::new();
        snapshot.set("name", &self.name);
        snapshot.set_opt("desc", self.description.as_ref());
        snapshot.set("type", <&'static str>::from(self.group_type));
        if let Some(membership) = self.membership()? {
            snapshot.activate(MEMBERSHIP.name, membership.cluster, membership.fields);
        }
        Ok(snapshot)
    }

    fn refresh(&self, state: DeviceGroupState) -> Self {
        let DeviceGroupState { group, members } = state;
        let group_type = parse_known(EntityKind::DeviceGroup, "type", Some(group.group_type.as_str()))
            .unwrap_or(self.group_type);

        let (rules, rules_json) = match (group_type, group.rules) {
            (GroupType::Dynamic, Some(remote)) => {
                match RuleSource::from_remote(remote, self.rules_json.is_none()) {
                    RuleSource::Tree(tree) => (Some(tree), None),
                    RuleSource::Raw(value) => (None, Some(value.to_string())),
                }
            }
            _ => (None, None),
        };

        Self {
            id: EntityId::new(group.id).ok().or(self.id),
            name: group.name,
            description: group.desc,
            group_type,
            devices: match group_type {
                GroupType::Static => membership(members),
                GroupType::Dynamic => None,
            },
            rules,
            rules_json,
        }
    }

    async fn create<A: NmsApi>(&self, api: &A, snapshot: &Snapshot) -> Result<EntityId, ErrorKind> {
        let response = api.create_device_group(&snapshot.to_payload(&[])).await?;
        if let Some(id) = identity::response_id(&response) {
            return Ok(id);
        }

        debug!(name = %self.name, "create response carried no id, matching by name");
        let found = identity::match_unique(
            api.list_device_groups().await?,
            "name",
            &self.name,
            |g| g.name.as_str(),
        )?;
        identity::recovered_id(found.id)
    }

    async fn fetch<A: NmsApi>(api: &A, id: EntityId) -> Result<Vec<DeviceGroupState>, ErrorKind> {
        let groups = api.get_device_group(id.get()).await?;
        let mut states = Vec::with_capacity(groups.len());
        for group in groups {
            let members = if group.group_type == "static" {
                let members = api.get_device_group_members(group.id).await?;
                Some(members.into_iter().map(|m| m.device_id).collect())
            } else {
                None
            };
            states.push(DeviceGroupState { group, members });
        }
        Ok(states)
    }

    async fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        plan: &UpdatePlan,
        _document: &Snapshot,
    ) -> Result<(), ErrorKind> {
        api.update_device_group(id.get(), &plan.to_payload(&[]))
            .await?;
        Ok(())
    }

    async fn remove<A: NmsApi>(api: &A, id: EntityId) -> Result<(), ErrorKind> {
        api.delete_device_group(id.get()).await?;
        Ok(())
    }
}
