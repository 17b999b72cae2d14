// Remote collaborator seam
//
// Every call the engine makes against LibreNMS goes through `NmsApi`, so
// lifecycle logic can run against the real HTTP client or an in-memory
// fake. Calls are awaited one at a time; nothing here is retried.

use std::future::Future;

use lnms_api::{
    AlertRuleRecord, CreateResponse, DeviceGroupRecord, DeviceRecord, Error, FieldUpdate,
    GroupMember, LocationRecord, NmsClient, Payload, ServiceRecord,
};

/// Per-entity create/get/list/update/delete calls against LibreNMS.
pub trait NmsApi: Send + Sync {
    // ── Devices ─────────────────────────────────────────────────────

    fn create_device(
        &self,
        payload: &Payload,
    ) -> impl Future<Output = Result<CreateResponse, Error>> + Send;

    /// Look a device up by numeric id or hostname.
    fn get_device(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, Error>> + Send;

    fn update_device(
        &self,
        key: &str,
        updates: &[FieldUpdate],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_device(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Device groups ───────────────────────────────────────────────

    fn create_device_group(
        &self,
        payload: &Payload,
    ) -> impl Future<Output = Result<CreateResponse, Error>> + Send;

    fn list_device_groups(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceGroupRecord>, Error>> + Send;

    fn get_device_group(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<DeviceGroupRecord>, Error>> + Send;

    fn get_device_group_members(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<GroupMember>, Error>> + Send;

    fn update_device_group(
        &self,
        id: u32,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_device_group(&self, id: u32) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Alert rules ─────────────────────────────────────────────────

    fn create_alert_rule(
        &self,
        payload: &Payload,
    ) -> impl Future<Output = Result<CreateResponse, Error>> + Send;

    fn list_alert_rules(&self)
    -> impl Future<Output = Result<Vec<AlertRuleRecord>, Error>> + Send;

    fn get_alert_rule(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<AlertRuleRecord>, Error>> + Send;

    /// Full-document update; `payload` carries `rule_id`.
    fn update_alert_rule(
        &self,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_alert_rule(&self, id: u32) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Locations ───────────────────────────────────────────────────

    fn create_location(
        &self,
        payload: &Payload,
    ) -> impl Future<Output = Result<CreateResponse, Error>> + Send;

    fn list_locations(&self) -> impl Future<Output = Result<Vec<LocationRecord>, Error>> + Send;

    fn get_location(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<LocationRecord>, Error>> + Send;

    fn update_location(
        &self,
        id: u32,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_location(&self, id: u32) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Services ────────────────────────────────────────────────────

    fn create_service(
        &self,
        device_id: u32,
        payload: &Payload,
    ) -> impl Future<Output = Result<CreateResponse, Error>> + Send;

    fn get_service(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<ServiceRecord>, Error>> + Send;

    fn update_service(
        &self,
        id: u32,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_service(&self, id: u32) -> impl Future<Output = Result<(), Error>> + Send;
}

impl NmsApi for NmsClient {
    async fn create_device(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        NmsClient::create_device(self, payload).await
    }

    async fn get_device(&self, key: &str) -> Result<Vec<DeviceRecord>, Error> {
        NmsClient::get_device(self, key).await
    }

    async fn update_device(&self, key: &str, updates: &[FieldUpdate]) -> Result<(), Error> {
        NmsClient::update_device(self, key, updates).await
    }

    async fn delete_device(&self, key: &str) -> Result<(), Error> {
        NmsClient::delete_device(self, key).await
    }

    async fn create_device_group(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        NmsClient::create_device_group(self, payload).await
    }

    async fn list_device_groups(&self) -> Result<Vec<DeviceGroupRecord>, Error> {
        NmsClient::list_device_groups(self).await
    }

    async fn get_device_group(&self, id: u32) -> Result<Vec<DeviceGroupRecord>, Error> {
        NmsClient::get_device_group(self, id).await
    }

    async fn get_device_group_members(&self, id: u32) -> Result<Vec<GroupMember>, Error> {
        NmsClient::get_device_group_members(self, id).await
    }

    async fn update_device_group(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        NmsClient::update_device_group(self, id, payload).await
    }

    async fn delete_device_group(&self, id: u32) -> Result<(), Error> {
        NmsClient::delete_device_group(self, id).await
    }

    async fn create_alert_rule(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        NmsClient::create_alert_rule(self, payload).await
    }

    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, Error> {
        NmsClient::list_alert_rules(self).await
    }

    async fn get_alert_rule(&self, id: u32) -> Result<Vec<AlertRuleRecord>, Error> {
        NmsClient::get_alert_rule(self, id).await
    }

    async fn update_alert_rule(&self, payload: &Payload) -> Result<(), Error> {
        NmsClient::update_alert_rule(self, payload).await
    }

    async fn delete_alert_rule(&self, id: u32) -> Result<(), Error> {
        NmsClient::delete_alert_rule(self, id).await
    }

    async fn create_location(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        NmsClient::create_location(self, payload).await
    }

    async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        NmsClient::list_locations(self).await
    }

    async fn get_location(&self, id: u32) -> Result<Vec<LocationRecord>, Error> {
        NmsClient::get_location(self, id).await
    }

    async fn update_location(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        NmsClient::update_location(self, id, payload).await
    }

    async fn delete_location(&self, id: u32) -> Result<(), Error> {
        NmsClient::delete_location(self, id).await
    }

    async fn create_service(&self, device_id: u32, payload: &Payload) -> Result<CreateResponse, Error> {
        NmsClient::create_service(self, device_id, payload).await
    }

    async fn get_service(&self, id: u32) -> Result<Vec<ServiceRecord>, Error> {
        NmsClient::get_service(self, id).await
    }

    async fn update_service(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        NmsClient::update_service(self, id, payload).await
    }

    async fn delete_service(&self, id: u32) -> Result<(), Error> {
        NmsClient::delete_service(self, id).await
    }
}
