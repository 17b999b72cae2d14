// Device group endpoints
//
// `GET devicegroups/{id}` returns the group's *members*, not the group
// itself, so single-group lookups filter the full listing.

use serde_json::Value;
use tracing::debug;

use crate::client::NmsClient;
use crate::error::Error;
use crate::models::{CreateResponse, DeviceGroupRecord, GroupList, GroupMember, MemberList, Payload};

impl NmsClient {
    /// `POST devicegroups`
    pub async fn create_device_group(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        self.post("devicegroups", payload).await
    }

    /// `GET devicegroups`
    pub async fn list_device_groups(&self) -> Result<Vec<DeviceGroupRecord>, Error> {
        let list: GroupList = self.get("devicegroups").await?;
        Ok(list.groups)
    }

    /// Filters the group listing by id. Empty if no group matches.
    pub async fn get_device_group(&self, id: u32) -> Result<Vec<DeviceGroupRecord>, Error> {
        let groups = self.list_device_groups().await?;
        Ok(groups.into_iter().filter(|g| g.id == id).collect())
    }

    /// `GET devicegroups/{id}`
    pub async fn get_device_group_members(&self, id: u32) -> Result<Vec<GroupMember>, Error> {
        let list: MemberList = self.get(&format!("devicegroups/{id}")).await?;
        Ok(list.devices)
    }

    /// `PATCH devicegroups/{id}`
    pub async fn update_device_group(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        debug!(id, fields = payload.len(), "updating device group");
        let _: Value = self.patch(&format!("devicegroups/{id}"), payload).await?;
        Ok(())
    }

    /// `DELETE devicegroups/{id}`
    pub async fn delete_device_group(&self, id: u32) -> Result<(), Error> {
        self.delete(&format!("devicegroups/{id}")).await
    }
}
