// Service resource
//
// LibreNMS happily creates identical-looking services (same device, type
// and target), so the new id can't be found by listing. It is parsed out
// of the create message instead.

use serde::{Deserialize, Serialize};

use lnms_api::ServiceRecord;

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::identity;
use crate::plan::{FieldPolicy, Snapshot, UpdatePlan};
use crate::remote::NmsApi;
use crate::resource::Resource;

/// Desired state of a service check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Owning device. Fixed once created.
    pub device_id: u32,
    pub name: String,
    /// Nagios check name, e.g. `ping` or `http`. Fixed once created.
    #[serde(rename = "type")]
    pub service_type: String,
    pub target: String,
    pub parameters: String,
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

static POLICY: FieldPolicy = FieldPolicy {
    updatable: &[
        "service_name",
        "service_ip",
        "service_param",
        "service_ignore",
        "service_desc",
    ],
    write_only: &[],
    computed: &["service_id"],
    variants: &[],
};

const CREATE_ALIASES: &[(&str, &str)] = &[
    ("service_name", "name"),
    ("service_type", "type"),
    ("service_ip", "ip"),
    ("service_param", "param"),
    ("service_ignore", "ignore"),
    ("service_desc", "desc"),
];

impl Resource for Service {
    const KIND: EntityKind = EntityKind::Service;
    const POLICY: &'static FieldPolicy = &POLICY;

    type Record = ServiceRecord;

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
        if self.device_id == 0 {
            return Err(ErrorKind::ValidationFailed {
                attribute: "device_id",
                reason: "must be a positive device id".into(),
            });
        }
        if self.service_type.trim().is_empty() {
            return Err(ErrorKind::ValidationFailed {
                attribute: "type",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn check_transition(&self, prior: &Self) -> Result<(), ErrorKind> {
        if prior.device_id != 0 && self.device_id != prior.device_id {
            return Err(ErrorKind::ImmutableAttribute {
                attribute: "device_id",
                from: prior.device_id.to_string(),
                to: self.device_id.to_string(),
            });
        }
        if !prior.service_type.is_empty() && self.service_type != prior.service_type {
            return Err(ErrorKind::ImmutableAttribute {
                attribute: "type",
                from: prior.service_type.clone(),
                to: self.service_type.clone(),
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot, ErrorKind> {
        let mut snapshot = Snapshot::new();
        snapshot.set("service_name", &self.name);
        snapshot.set("service_type", &self.service_type);
        snapshot.set("service_ip", &self.target);
        snapshot.set("service_param", &self.parameters);
        snapshot.set("service_ignore", self.ignore);
        snapshot.set_opt("service_desc", self.description.as_ref());
        Ok(snapshot)
    }

    fn refresh(&self, record: ServiceRecord) -> Self {
        Self {
            id: EntityId::new(record.service_id).ok().or(self.id),
            device_id: record.device_id,
            name: record.service_name.unwrap_or_default(),
            service_type: record.service_type,
            target: record.service_ip.unwrap_or_default(),
            parameters: record.service_param.unwrap_or_default(),
            ignore: record.service_ignore,
            description: record.service_desc,
        }
    }

    async fn create<A: NmsApi>(&self, api: &A, snapshot: &Snapshot) -> Result<EntityId, ErrorKind> {
        let response = api
            .create_service(self.device_id, &snapshot.to_payload(CREATE_ALIASES))
            .await?;
        identity::extract_message_token(response.message.as_deref().unwrap_or_default())
    }

    async fn fetch<A: NmsApi>(api: &A, id: EntityId) -> Result<Vec<ServiceRecord>, ErrorKind> {
        Ok(api.get_service(id.get()).await?)
    }

    async fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        plan: &UpdatePlan,
        _document: &Snapshot,
    ) -> Result<(), ErrorKind> {
        api.update_service(id.get(), &plan.to_payload(&[])).await?;
        Ok(())
    }

    async fn remove<A: NmsApi>(api: &A, id: EntityId) -> Result<(), ErrorKind> {
        api.delete_service(id.get()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::plan::plan;

    fn ping() -> Service {
        Service {
            device_id: 2,
            name: "ping core".into(),
            service_type: "ping".into(),
            target: "10.0.0.1".into(),
            parameters: "-w 5".into(),
            ignore: false,
            ..Service::default()
        }
    }

    #[test]
    fn create_payload_uses_short_names() {
        let payload = ping().snapshot().unwrap().to_payload(CREATE_ALIASES);
        assert_eq!(
            serde_json::Value::Object(payload),
            json!({
                "name": "ping core",
                "type": "ping",
                "ip": "10.0.0.1",
                "param": "-w 5",
                "ignore": false
            })
        );
    }

    #[test]
    fn device_and_type_are_immutable() {
        let moved = Service {
            device_id: 3,
            ..ping()
        };
        assert!(matches!(
            moved.check_transition(&ping()),
            Err(ErrorKind::ImmutableAttribute {
                attribute: "device_id",
                ..
            })
        ));

        let retyped = Service {
            service_type: "http".into(),
            ..ping()
        };
        let err = retyped.check_transition(&ping()).unwrap_err();
        assert!(err.is_configuration());
        assert!(ping().check_transition(&ping()).is_ok());
    }

    #[test]
    fn refresh_round_trips_and_plans_only_changes() {
        let record = ServiceRecord {
            service_id: 5,
            device_id: 2,
            service_ip: Some("10.0.0.1".into()),
            service_type: "ping".into(),
            service_desc: Some(String::new()),
            service_param: Some("-w 5".into()),
            service_ignore: false,
            service_name: Some("ping core".into()),
        };
        let prior = ping().refresh(record);
        assert_eq!(prior.id, Some(EntityId::new(5).unwrap()));
        assert_eq!(prior.description.as_deref(), Some(""));

        let desired = Service {
            ignore: true,
            ..ping()
        };
        let plan = plan(&desired.snapshot().unwrap(), &prior.snapshot().unwrap(), &POLICY);
        assert_eq!(plan.fields(), vec!["service_ignore"]);
        assert_eq!(plan.to_payload(&[])["service_ignore"], json!(true));
    }
}
