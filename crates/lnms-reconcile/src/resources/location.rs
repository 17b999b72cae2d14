// Location resource

use serde::{Deserialize, Serialize};

use lnms_api::LocationRecord;

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::identity;
use crate::plan::{FieldPolicy, Snapshot, UpdatePlan};
use crate::remote::NmsApi;
use crate::resource::Resource;

/// Desired state of a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Keep LibreNMS from re-geocoding the coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_coordinates: Option<bool>,
    /// Last modification time. Set by LibreNMS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

static POLICY: FieldPolicy = FieldPolicy {
    updatable: &["location", "lat", "lng", "fixed_coordinates"],
    write_only: &[],
    computed: &["id", "timestamp"],
    variants: &[],
};

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

fn check_range(attribute: &'static str, value: Option<f64>, bound: f64) -> Result<(), ErrorKind> {
    match value {
        Some(v) if !(-bound..=bound).contains(&v) => Err(ErrorKind::ValidationFailed {
            attribute,
            reason: format!("{v} is outside -{bound}..={bound}"),
        }),
        _ => Ok(()),
    }
}

impl Resource for Location {
    const KIND: EntityKind = EntityKind::Location;
    const POLICY: &'static FieldPolicy = &POLICY;

    type Record = LocationRecord;

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
        check_range("latitude", self.latitude, 90.0)?;
        check_range("longitude", self.longitude, 180.0)
    }

    fn snapshot(&self) -> Result<Snapshot, ErrorKind> {
        let mut snapshot = Snapshot::new();
        snapshot.set("location", &self.name);
        snapshot.set_opt("lat", self.latitude);
        snapshot.set_opt("lng", self.longitude);
        snapshot.set_opt("fixed_coordinates", self.fixed_coordinates);
        Ok(snapshot)
    }

    fn refresh(&self, record: LocationRecord) -> Self {
        Self {
            id: EntityId::new(record.id).ok().or(self.id),
            name: record.location,
            latitude: record.lat,
            longitude: record.lng,
            // Non-null column on the remote; an absent flag decodes as false.
            fixed_coordinates: Some(record.fixed_coordinates),
            timestamp: record.timestamp,
        }
    }

    async fn create<A: NmsApi>(&self, api: &A, snapshot: &Snapshot) -> Result<EntityId, ErrorKind> {
        api.create_location(&snapshot.to_payload(&[])).await?;

        let found = identity::match_unique(
            api.list_locations().await?,
            "name",
            &self.name,
            |l| l.location.as_str(),
        )?;
        identity::recovered_id(found.id)
    }

    async fn fetch<A: NmsApi>(api: &A, id: EntityId) -> Result<Vec<LocationRecord>, ErrorKind> {
        Ok(api.get_location(id.get()).await?)
    }

    async fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        plan: &UpdatePlan,
        _document: &Snapshot,
    ) -> Result<(), ErrorKind> {
        api.update_location(id.get(), &plan.to_payload(&[])).await?;
        Ok(())
    }

    async fn remove<A: NmsApi>(api: &A, id: EntityId) -> Result<(), ErrorKind> {
        api.delete_location(id.get()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::plan::plan;

    fn record() -> LocationRecord {
        LocationRecord {
            id: 9,
            location: "Rack 12, DC1".into(),
            lat: Some(51.5074),
            lng: Some(-0.1278),
            timestamp: Some("2024-06-15 10:30:00".into()),
            fixed_coordinates: true,
        }
    }

    #[test]
    fn coordinates_are_range_checked() {
        let bad = Location::new("nowhere").at(91.0, 0.0);
        assert!(matches!(
            bad.validate(),
            Err(ErrorKind::ValidationFailed { attribute: "latitude", .. })
        ));
        let bad = Location::new("nowhere").at(0.0, -181.0);
        assert!(matches!(
            bad.validate(),
            Err(ErrorKind::ValidationFailed { attribute: "longitude", .. })
        ));
        assert!(Location::new("Rack 12, DC1").at(51.5074, -0.1278).validate().is_ok());
    }

    #[test]
    fn refresh_is_a_fixed_point() {
        let desired = Location {
            fixed_coordinates: Some(true),
            ..Location::new("Rack 12, DC1").at(51.5074, -0.1278)
        };
        let remote = desired.refresh(record());
        assert_eq!(remote.timestamp.as_deref(), Some("2024-06-15 10:30:00"));
        assert!(plan(&desired.snapshot().unwrap(), &remote.snapshot().unwrap(), &POLICY).is_empty());
    }

    #[test]
    fn missing_coordinates_map_to_none() {
        let remote = LocationRecord {
            lat: None,
            lng: None,
            ..record()
        };
        let refreshed = Location::new("x").refresh(remote);
        assert_eq!(refreshed.latitude, None);
        assert_eq!(refreshed.longitude, None);
    }

    #[test]
    fn absent_fixed_coordinates_flag_reads_as_false() {
        let remote: LocationRecord = serde_json::from_value(serde_json::json!({
            "id": 9,
            "location": "Rack 12, DC1",
        }))
        .unwrap();
        let refreshed = Location::new("Rack 12, DC1").refresh(remote);
        assert_eq!(refreshed.fixed_coordinates, Some(false));
    }

    #[test]
    fn moving_plans_only_coordinates() {
        let prior = Location::new("Rack 12, DC1").refresh(record());
        let desired = Location::new("Rack 12, DC1").at(48.8566, 2.3522);
        let plan = plan(&desired.snapshot().unwrap(), &prior.snapshot().unwrap(), &POLICY);
        assert_eq!(plan.fields(), vec!["lat", "lng"]);
    }
}
