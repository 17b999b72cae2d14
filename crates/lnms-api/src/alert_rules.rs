// Alert rule endpoints
//
// Rules only accept full-document updates: `PUT rules` with `rule_id`
// in the body.

use serde_json::Value;
use tracing::debug;

use crate::client::NmsClient;
use crate::error::Error;
use crate::models::{AlertRuleRecord, CreateResponse, Payload, RuleList};

impl NmsClient {
    /// `POST rules`
    pub async fn create_alert_rule(&self, payload: &Payload) -> Result<CreateResponse, Error> {
        self.post("rules", payload).await
    }

    /// `GET rules`
    pub async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, Error> {
        let list: RuleList = self.get("rules").await?;
        Ok(list.rules)
    }

    /// `GET rules/{id}`
    pub async fn get_alert_rule(&self, id: u32) -> Result<Vec<AlertRuleRecord>, Error> {
        let list: RuleList = self.get(&format!("rules/{id}")).await?;
        Ok(list.rules)
    }

    /// Replace a rule. `payload` must carry `rule_id`.
    ///
    /// `PUT rules`
    pub async fn update_alert_rule(&self, payload: &Payload) -> Result<(), Error> {
        debug!(rule_id = ?payload.get("rule_id"), "replacing alert rule");
        let _: Value = self.put("rules", payload).await?;
        Ok(())
    }

    /// `DELETE rules/{id}`
    pub async fn delete_alert_rule(&self, id: u32) -> Result<(), Error> {
        self.delete(&format!("rules/{id}")).await
    }
}
