// Device endpoints
//
// Devices are addressed by numeric id or hostname. Updates take the
// `{"field": [..], "data": [..]}` parallel-array body.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::NmsClient;
use crate::error::Error;
use crate::models::{CreateResponse, DeviceList, DeviceRecord, FieldUpdate, Payload};

impl NmsClient {
    /// Add a device.
    ///
    /// `POST devices`
    pub async fn create_device(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        self.post("devices", payload).await
    }

    /// Fetch a device by id or hostname.
    ///
    /// `GET devices/{key}`
    pub async fn get_device(&self, key: &str) -> Result<Vec<DeviceRecord>, Error> {
        let list: DeviceList = self.get(&format!("devices/{key}")).await?;
        Ok(list.devices)
    }

    /// Apply a sparse field update.
    ///
    /// `PATCH devices/{key}` with `{"field": [..], "data": [..]}`
    pub async fn update_device(&self, key: &str, updates: &[FieldUpdate]) -> Result<(), Error> {
        debug!(key, fields = updates.len(), "updating device");
        let (field, data): (Vec<&str>, Vec<&Value>) = updates
            .iter()
            .map(|u| (u.field.as_str(), &u.value))
            .unzip();
        let _: Value = self
            .patch(
                &format!("devices/{key}"),
                &json!({
                    "field": field,
                    "data": data,
                }),
            )
            .await?;
        Ok(())
    }

    /// `DELETE devices/{key}`
    pub async fn delete_device(&self, key: &str) -> Result<(), Error> {
        debug!(key, "deleting device");
        self.delete(&format!("devices/{key}")).await
    }
}
