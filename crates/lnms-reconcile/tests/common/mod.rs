// In-memory LibreNMS stand-in for lifecycle tests.
//
// Keeps one table per entity, assigns ids sequentially, and records every
// call by name so tests can assert on the exact remote traffic.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use lnms_api::{
    AlertRuleRecord, CreateResponse, DeviceGroupRecord, DeviceRecord, Error, FieldUpdate,
    GroupMember, LocationRecord, Payload, ServiceRecord,
};
use lnms_reconcile::NmsApi;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub payloads: Vec<Payload>,
    pub next_id: u32,
    pub devices: BTreeMap<u32, DeviceRecord>,
    pub groups: BTreeMap<u32, DeviceGroupRecord>,
    pub members: BTreeMap<u32, Vec<u32>>,
    pub rules: BTreeMap<u32, AlertRuleRecord>,
    pub locations: BTreeMap<u32, LocationRecord>,
    pub services: BTreeMap<u32, ServiceRecord>,
    /// Whether device group creates echo the new id.
    pub group_create_returns_id: bool,
    /// Call name that fails with HTTP 500 instead of running.
    pub fail_on: Option<&'static str>,
}

#[derive(Debug, Default)]
pub struct FakeNms {
    pub state: Mutex<FakeState>,
}

impl FakeNms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Request bodies of every create and update, in call order.
    pub fn payloads(&self) -> Vec<Payload> {
        self.state.lock().unwrap().payloads.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.payloads.clear();
    }

    pub fn fail_on(&self, call: &'static str) {
        self.state.lock().unwrap().fail_on = Some(call);
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Log `call` and hand out the state, or fail if it is rigged to.
    fn enter(&self, call: &str) -> Result<std::sync::MutexGuard<'_, FakeState>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_owned());
        if state.fail_on == Some(call) {
            return Err(Error::Api {
                status: 500,
                message: format!("{call} failed"),
            });
        }
        Ok(state)
    }
}

impl FakeState {
    pub fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(what: &str) -> Error {
    Error::Api {
        status: 404,
        message: format!("{what} does not exist"),
    }
}

fn text(payload: &Payload, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn number(payload: &Payload, key: &str) -> Option<u32> {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn flag(payload: &Payload, key: &str) -> Option<bool> {
    payload.get(key).and_then(Value::as_bool)
}

fn ids(payload: &Payload, key: &str) -> Option<Vec<u32>> {
    payload.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|n| u32::try_from(n).ok())
            .collect()
    })
}

fn apply_device_field(device: &mut DeviceRecord, field: &str, value: &Value) {
    let as_text = || value.as_str().map(str::to_owned);
    match field {
        "snmp_disable" => device.snmp_disable = value.as_bool().unwrap_or_default(),
        "snmpver" | "version" => device.snmpver = as_text(),
        "community" => device.community = as_text(),
        "authalgo" => device.authalgo = as_text(),
        "authlevel" => device.authlevel = as_text(),
        "authname" => device.authname = as_text(),
        "authpass" => device.authpass = as_text(),
        "cryptoalgo" => device.cryptoalgo = as_text(),
        "cryptopass" => device.cryptopass = as_text(),
        "hardware" => device.hardware = as_text(),
        "os" => device.os = as_text(),
        "sys_name" | "sysName" => device.sys_name = as_text(),
        "transport" => device.transport = as_text(),
        "port" => device.port = value.as_u64().and_then(|n| u32::try_from(n).ok()),
        "poller_group" => device.poller_group = value.as_u64().and_then(|n| u32::try_from(n).ok()),
        "port_association_mode" => {
            device.port_association_mode = value.as_u64().and_then(|n| u32::try_from(n).ok());
        }
        "override_sysLocation" => device.override_sys_location = value.as_bool().unwrap_or_default(),
        _ => {}
    }
}

fn apply_group(group: &mut DeviceGroupRecord, payload: &Payload) {
    if let Some(name) = text(payload, "name") {
        group.name = name;
    }
    if let Some(desc) = text(payload, "desc") {
        group.desc = Some(desc);
    }
    if let Some(group_type) = text(payload, "type") {
        group.group_type = group_type;
    }
    if let Some(rules) = text(payload, "rules") {
        group.rules = serde_json::from_str(&rules).ok();
    }
}

fn apply_rule(rule: &mut AlertRuleRecord, payload: &Payload) {
    if let Some(name) = text(payload, "name") {
        rule.name = name;
    }
    rule.builder = text(payload, "builder").or(rule.builder.take());
    rule.severity = text(payload, "severity").or(rule.severity.take());
    rule.disabled = flag(payload, "disabled").unwrap_or(rule.disabled);
    rule.notes = text(payload, "notes").or(rule.notes.take());
    rule.proc = text(payload, "proc").or(rule.proc.take());
    rule.devices = ids(payload, "devices").or(rule.devices.take());
    rule.groups = ids(payload, "groups").or(rule.groups.take());
    rule.locations = ids(payload, "locations").or(rule.locations.take());
    rule.query = Some("SELECT * FROM devices".into());
}

fn apply_location(location: &mut LocationRecord, payload: &Payload) {
    if let Some(name) = text(payload, "location") {
        location.location = name;
    }
    location.lat = payload.get("lat").and_then(Value::as_f64).or(location.lat);
    location.lng = payload.get("lng").and_then(Value::as_f64).or(location.lng);
    location.fixed_coordinates =
        flag(payload, "fixed_coordinates").unwrap_or(location.fixed_coordinates);
    location.timestamp = Some("2024-06-15 10:30:00".into());
}

impl NmsApi for FakeNms {
    // ── Devices ─────────────────────────────────────────────────────

    async fn create_device(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        let mut state = self.enter("create_device")?;
        state.payloads.push(payload.clone());
        let id = state.allocate();
        let mut device = DeviceRecord {
            device_id: id,
            hostname: text(payload, "hostname").unwrap_or_default(),
            ..DeviceRecord::default()
        };
        for (field, value) in payload {
            apply_device_field(&mut device, field, value);
        }
        state.devices.insert(id, device);
        Ok(CreateResponse::default())
    }

    async fn get_device(&self, key: &str) -> Result<Vec<DeviceRecord>, Error> {
        let state = self.enter("get_device")?;
        Ok(state
            .devices
            .values()
            .filter(|d| d.device_id.to_string() == key || d.hostname == key)
            .cloned()
            .collect())
    }

    async fn update_device(&self, key: &str, updates: &[FieldUpdate]) -> Result<(), Error> {
        let mut state = self.enter("update_device")?;
        state.payloads.push(
            updates
                .iter()
                .map(|u| (u.field.clone(), u.value.clone()))
                .collect(),
        );
        let device = state
            .devices
            .values_mut()
            .find(|d| d.device_id.to_string() == key)
            .ok_or_else(|| not_found("device"))?;
        for update in updates {
            apply_device_field(device, &update.field, &update.value);
        }
        Ok(())
    }

    async fn delete_device(&self, key: &str) -> Result<(), Error> {
        let mut state = self.enter("delete_device")?;
        let id: u32 = key.parse().map_err(|_| not_found("device"))?;
        state.devices.remove(&id).map(drop).ok_or_else(|| not_found("device"))
    }

    // ── Device groups ───────────────────────────────────────────────

    async fn create_device_group(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        let mut state = self.enter("create_device_group")?;
        state.payloads.push(payload.clone());
        let id = state.allocate();
        let mut group = DeviceGroupRecord {
            id,
            ..DeviceGroupRecord::default()
        };
        apply_group(&mut group, payload);
        state.members.insert(id, ids(payload, "devices").unwrap_or_default());
        state.groups.insert(id, group);
        Ok(CreateResponse {
            message: Some("Device group created".into()),
            id: state.group_create_returns_id.then_some(id),
        })
    }

    async fn list_device_groups(&self) -> Result<Vec<DeviceGroupRecord>, Error> {
        let state = self.enter("list_device_groups")?;
        Ok(state.groups.values().cloned().collect())
    }

    async fn get_device_group(&self, id: u32) -> Result<Vec<DeviceGroupRecord>, Error> {
        let state = self.enter("get_device_group")?;
        Ok(state.groups.get(&id).cloned().into_iter().collect())
    }

    async fn get_device_group_members(&self, id: u32) -> Result<Vec<GroupMember>, Error> {
        let state = self.enter("get_device_group_members")?;
        Ok(state
            .members
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&device_id| GroupMember { device_id })
            .collect())
    }

    async fn update_device_group(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        let mut state = self.enter("update_device_group")?;
        state.payloads.push(payload.clone());
        let group = state.groups.get_mut(&id).ok_or_else(|| not_found("group"))?;
        apply_group(group, payload);
        if let Some(devices) = ids(payload, "devices") {
            state.members.insert(id, devices);
        }
        Ok(())
    }

    async fn delete_device_group(&self, id: u32) -> Result<(), Error> {
        let mut state = self.enter("delete_device_group")?;
        state.members.remove(&id);
        state.groups.remove(&id).map(drop).ok_or_else(|| not_found("group"))
    }

    // ── Alert rules ─────────────────────────────────────────────────

    async fn create_alert_rule(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        let mut state = self.enter("create_alert_rule")?;
        state.payloads.push(payload.clone());
        let id = state.allocate();
        let mut rule = AlertRuleRecord {
            id,
            ..AlertRuleRecord::default()
        };
        apply_rule(&mut rule, payload);
        state.rules.insert(id, rule);
        Ok(CreateResponse::default())
    }

    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, Error> {
        let state = self.enter("list_alert_rules")?;
        Ok(state.rules.values().cloned().collect())
    }

    async fn get_alert_rule(&self, id: u32) -> Result<Vec<AlertRuleRecord>, Error> {
        let state = self.enter("get_alert_rule")?;
        Ok(state.rules.get(&id).cloned().into_iter().collect())
    }

    async fn update_alert_rule(&self, payload: &Payload) -> Result<(), Error> {
        let mut state = self.enter("update_alert_rule")?;
        state.payloads.push(payload.clone());
        let id = number(payload, "rule_id").ok_or_else(|| not_found("rule"))?;
        let rule = state.rules.get_mut(&id).ok_or_else(|| not_found("rule"))?;
        apply_rule(rule, payload);
        Ok(())
    }

    async fn delete_alert_rule(&self, id: u32) -> Result<(), Error> {
        let mut state = self.enter("delete_alert_rule")?;
        state.rules.remove(&id).map(drop).ok_or_else(|| not_found("rule"))
    }

    // ── Locations ───────────────────────────────────────────────────

    async fn create_location(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        let mut state = self.enter("create_location")?;
        state.payloads.push(payload.clone());
        let id = state.allocate();
        let mut location = LocationRecord {
            id,
            ..LocationRecord::default()
        };
        apply_location(&mut location, payload);
        state.locations.insert(id, location);
        Ok(CreateResponse {
            message: Some("Location added".into()),
            id: None,
        })
    }

    async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        let state = self.enter("list_locations")?;
        Ok(state.locations.values().cloned().collect())
    }

    async fn get_location(&self, id: u32) -> Result<Vec<LocationRecord>, Error> {
        let state = self.enter("get_location")?;
        Ok(state.locations.get(&id).cloned().into_iter().collect())
    }

    async fn update_location(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        let mut state = self.enter("update_location")?;
        state.payloads.push(payload.clone());
        let location = state
            .locations
            .get_mut(&id)
            .ok_or_else(|| not_found("location"))?;
        apply_location(location, payload);
        Ok(())
    }

    async fn delete_location(&self, id: u32) -> Result<(), Error> {
        let mut state = self.enter("delete_location")?;
        state.locations.remove(&id).map(drop).ok_or_else(|| not_found("location"))
    }

    // ── Services ────────────────────────────────────────────────────

    async fn create_service(&self, device_id: u32, payload: &Payload) -> Result<CreateResponse, Error> {
        let mut state = self.enter("create_service")?;
        state.payloads.push(payload.clone());
        let id = state.allocate();
        let service_type = text(payload, "type").unwrap_or_default();
        let service = ServiceRecord {
            service_id: id,
            device_id,
            service_ip: text(payload, "ip"),
            service_type: service_type.clone(),
            service_desc: text(payload, "desc"),
            service_param: text(payload, "param"),
            service_ignore: flag(payload, "ignore").unwrap_or_default(),
            service_name: text(payload, "name"),
        };
        state.services.insert(id, service);
        Ok(CreateResponse {
            message: Some(format!(
                "Service {service_type} has been added to device {device_id} (#{id})"
            )),
            id: None,
        })
    }

    async fn get_service(&self, id: u32) -> Result<Vec<ServiceRecord>, Error> {
        let state = self.enter("get_service")?;
        Ok(state.services.get(&id).cloned().into_iter().collect())
    }

    async fn update_service(&self, id: u32, payload: &Payload) -> Result<(), Error> {
        let mut state = self.enter("update_service")?;
        state.payloads.push(payload.clone());
        let service = state
            .services
            .get_mut(&id)
            .ok_or_else(|| not_found("service"))?;
        service.service_name = text(payload, "service_name").or(service.service_name.take());
        service.service_ip = text(payload, "service_ip").or(service.service_ip.take());
        service.service_param = text(payload, "service_param").or(service.service_param.take());
        service.service_desc = text(payload, "service_desc").or(service.service_desc.take());
        service.service_ignore = flag(payload, "service_ignore").unwrap_or(service.service_ignore);
        Ok(())
    }

    async fn delete_service(&self, id: u32) -> Result<(), Error> {
        let mut state = self.enter("delete_service")?;
        state.services.remove(&id).map(drop).ok_or_else(|| not_found("service"))
    }
}
