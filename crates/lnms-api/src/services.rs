// Service endpoints
//
// Services are created under their device (`POST services/{device_id}`)
// but updated and deleted by service id.

use serde_json::Value;
use tracing::debug;

use crate::client::NmsClient;
use crate::error::Error;
use crate::models::{CreateResponse, Payload, ServiceList, ServiceRecord};

impl NmsClient {
    /// `POST services/{device_id}`
    pub async fn create_service(
        &self,
        device_id: u32,
        payload: &Payload,
    ) -> Result<CreateResponse, Error> {
        self.post(&format!("services/{device_id}"), payload).await
    }

    /// `GET services`
    pub async fn list_services(&self) -> Result<Vec<ServiceRecord>, Error> {
        let list: ServiceList = self.get("services").await?;
        Ok(list.services)
    }

    /// Filters the service listing by id. Empty if no service matches.
    pub async fn get_service(&self, id: u32) -> Result<Vec<ServiceRecord>, Error> {
        let services = self.list_services().await?;
        Ok(services.into_iter().filter(|s| s.service_id == id).collect())
    }

    /// `PATCH services/{id}`
    pub async fn update_service(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        debug!(id, fields = payload.len(), "updating service");
        let _: Value = self.patch(&format!("services/{id}"), payload).await?;
        Ok(())
    }

    /// `DELETE services/{id}`
    pub async fn delete_service(&self, id: u32) -> Result<(), Error> {
        self.delete(&format!("services/{id}")).await
    }
}
