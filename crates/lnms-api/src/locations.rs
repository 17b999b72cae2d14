// Location endpoints

use serde_json::Value;
use tracing::debug;

use crate::client::NmsClient;
use crate::error::Error;
use crate::models::{CreateResponse, LocationList, LocationOne, LocationRecord, Payload};

impl NmsClient {
    /// `POST locations`
    pub async fn create_location(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        self.post("locations", payload).await
    }

    /// `GET resources/locations`
    pub async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        let list: LocationList = self.get("resources/locations").await?;
        Ok(list.locations)
    }

    /// `GET location/{id}`
    ///
    /// The endpoint returns a single `get_location` object; it is wrapped
    /// in a `Vec` so callers can treat every fetch as a record count.
    pub async fn get_location(&self, id: u32) -> Result<Vec<LocationRecord>, Error> {
        let one: LocationOne = self.get(&format!("location/{id}")).await?;
        Ok(one.get_location.into_iter().collect())
    }

    /// `PATCH locations/{id}`
    pub async fn update_location(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        debug!(id, fields = payload.len(), "updating location");
        let _: Value = self.patch(&format!("locations/{id}"), payload).await?;
        Ok(())
    }

    /// `DELETE locations/{id}`
    pub async fn delete_location(&self, id: u32) -> Result<(), Error> {
        self.delete(&format!("locations/{id}")).await
    }
}
