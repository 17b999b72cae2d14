// Rule tree codec
//
// Dynamic device groups are defined by a query-builder tree: groups of
// predicates joined by AND/OR, nested arbitrarily. The structured form
// here covers text predicates only. Trees using other input types, list
// operators, or non-string values go through `RuleSource::Raw`.
//
// Encoding is canonical: child order is kept exactly as declared and keys
// are emitted in a fixed order, so the same tree always yields the same
// bytes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::warn;

// ── Structured tree ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Condition {
    And,
    Or,
}

/// Comparison operators that take a single string operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    BeginsWith,
    NotBeginsWith,
    Contains,
    NotContains,
    EndsWith,
    NotEndsWith,
    Regex,
    NotRegex,
    IsEmpty,
    IsNotEmpty,
    IsNull,
    IsNotNull,
}

/// A condition node: `condition` applied across `rules`.
///
/// `joins` relate cross-table fields and are index-aligned with how the
/// remote system walks `rules`, so neither list is ever reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroup {
    pub condition: Condition,
    pub rules: Vec<RuleNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joins: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Group(RuleGroup),
    Predicate(Predicate),
}

/// A leaf comparison, e.g. `devices.hostname equal "sw1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
}

impl RuleGroup {
    pub fn new(condition: Condition, rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            condition,
            rules: rules.into_iter().collect(),
            joins: None,
        }
    }

    pub fn all(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self::new(Condition::And, rules)
    }

    pub fn any(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self::new(Condition::Or, rules)
    }

    pub fn with_joins(mut self, joins: Vec<Vec<String>>) -> Self {
        self.joins = Some(joins);
        self
    }

    /// Every condition node must have at least one child.
    pub fn validate(&self) -> Result<(), RuleTreeError> {
        if self.rules.is_empty() {
            return Err(RuleTreeError::EmptyCondition);
        }
        for node in &self.rules {
            if let RuleNode::Group(group) = node {
                group.validate()?;
            }
        }
        Ok(())
    }
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl From<Predicate> for RuleNode {
    fn from(p: Predicate) -> Self {
        Self::Predicate(p)
    }
}

impl From<RuleGroup> for RuleNode {
    fn from(g: RuleGroup) -> Self {
        Self::Group(g)
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RuleTreeError {
    #[error("not valid rule-tree syntax: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("a condition group has no rules")]
    EmptyCondition,

    #[error("the tree is flagged as not valid")]
    NotValid,

    #[error("predicate on `{field}` uses {detail}; only text predicates have a structured form")]
    UnsupportedPredicate { field: String, detail: String },

    #[error("raw rule tree must be a JSON object")]
    NotAnObject,
}

// ── Encode ──────────────────────────────────────────────────────────

/// Canonical JSON value for `tree`.
///
/// Keys are inserted alphabetically so the output is identical whether or
/// not `serde_json` preserves insertion order.
pub fn to_value(tree: &RuleGroup) -> Value {
    group_value(tree, true)
}

/// Canonical encoded string for `tree`.
pub fn encode(tree: &RuleGroup) -> String {
    to_value(tree).to_string()
}

fn group_value(group: &RuleGroup, root: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("condition".into(), Value::String(group.condition.to_string()));
    if let Some(joins) = &group.joins {
        let joins = joins
            .iter()
            .map(|join| Value::Array(join.iter().cloned().map(Value::String).collect()))
            .collect();
        obj.insert("joins".into(), Value::Array(joins));
    }
    obj.insert(
        "rules".into(),
        Value::Array(group.rules.iter().map(node_value).collect()),
    );
    if root {
        obj.insert("valid".into(), Value::Bool(true));
    }
    Value::Object(obj)
}

fn node_value(node: &RuleNode) -> Value {
    match node {
        RuleNode::Group(group) => group_value(group, false),
        RuleNode::Predicate(p) => {
            let mut obj = Map::new();
            obj.insert("field".into(), Value::String(p.field.clone()));
            obj.insert("id".into(), Value::String(p.field.clone()));
            obj.insert("input".into(), Value::String("text".into()));
            obj.insert("operator".into(), Value::String(p.operator.to_string()));
            obj.insert("type".into(), Value::String("string".into()));
            obj.insert("value".into(), Value::String(p.value.clone()));
            Value::Object(obj)
        }
    }
}

// ── Decode ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WireGroup {
    condition: Condition,
    rules: Vec<WireNode>,
    #[serde(default)]
    joins: Option<Vec<Vec<String>>>,
    #[serde(default)]
    valid: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireNode {
    Group(WireGroup),
    Rule(WireRule),
}

#[derive(Deserialize)]
struct WireRule {
    field: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    input: Option<String>,
    operator: String,
    #[serde(default)]
    value: Value,
}

/// Parse an encoded tree.
pub fn decode(encoded: &str) -> Result<RuleGroup, RuleTreeError> {
    let value: Value = serde_json::from_str(encoded)?;
    from_value(&value)
}

/// Convert a parsed JSON tree into the structured form.
pub fn from_value(value: &Value) -> Result<RuleGroup, RuleTreeError> {
    let wire = WireGroup::deserialize(value)?;
    if wire.valid == Some(false) {
        return Err(RuleTreeError::NotValid);
    }
    group_from_wire(wire)
}

fn group_from_wire(wire: WireGroup) -> Result<RuleGroup, RuleTreeError> {
    if wire.rules.is_empty() {
        return Err(RuleTreeError::EmptyCondition);
    }
    let rules = wire
        .rules
        .into_iter()
        .map(|node| match node {
            WireNode::Group(group) => group_from_wire(group).map(RuleNode::Group),
            WireNode::Rule(rule) => predicate_from_wire(rule).map(RuleNode::Predicate),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RuleGroup {
        condition: wire.condition,
        rules,
        joins: wire.joins,
    })
}

fn predicate_from_wire(rule: WireRule) -> Result<Predicate, RuleTreeError> {
    let WireRule {
        field,
        kind,
        input,
        operator,
        value,
    } = rule;
    let unsupported = |detail: String| RuleTreeError::UnsupportedPredicate {
        field: field.clone(),
        detail,
    };

    let kind = kind.as_deref().unwrap_or("string");
    if kind != "string" {
        return Err(unsupported(format!("type `{kind}`")));
    }
    let input = input.as_deref().unwrap_or("text");
    if input != "text" {
        return Err(unsupported(format!("input `{input}`")));
    }
    let Ok(operator) = operator.parse::<Operator>() else {
        return Err(unsupported(format!("operator `{operator}`")));
    };
    let value = match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => return Err(unsupported(format!("non-string value {other}"))),
    };

    Ok(Predicate {
        field,
        operator,
        value,
    })
}

// ── Rule source ─────────────────────────────────────────────────────

/// Where a dynamic group's rules come from: a structured tree, or a
/// pre-encoded JSON document for trees the structured form can't express.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSource {
    Tree(RuleGroup),
    Raw(Value),
}

impl RuleSource {
    /// Parse a pre-encoded override. Must be a JSON object.
    pub fn raw(encoded: &str) -> Result<Self, RuleTreeError> {
        match serde_json::from_str(encoded)? {
            value @ Value::Object(_) => Ok(Self::Raw(value)),
            _ => Err(RuleTreeError::NotAnObject),
        }
    }

    /// The JSON the remote system stores.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Tree(tree) => to_value(tree),
            Self::Raw(value) => value.clone(),
        }
    }

    /// Map a remote tree back, keeping the caller's representation.
    ///
    /// A tree the structured form can't express stays raw.
    pub fn from_remote(value: Value, prefer_tree: bool) -> Self {
        if !prefer_tree {
            return Self::Raw(value);
        }
        match from_value(&value) {
            Ok(tree) => Self::Tree(tree),
            Err(e) => {
                warn!(error = %e, "remote rule tree has no structured form, kept raw");
                Self::Raw(value)
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn hostname_is(value: &str) -> RuleNode {
        Predicate::new("devices.hostname", Operator::Equal, value).into()
    }

    #[test]
    fn encoding_is_canonical() {
        let tree = RuleGroup::all([hostname_is("sw1")]);
        insta::assert_snapshot!(
            encode(&tree),
            @r#"{"condition":"AND","rules":[{"field":"devices.hostname","id":"devices.hostname","input":"text","operator":"equal","type":"string","value":"sw1"}],"valid":true}"#
        );
    }

    #[test]
    fn round_trips_single_predicate() {
        let tree = RuleGroup::all([hostname_is("sw1")]);
        assert_eq!(decode(&encode(&tree)).unwrap(), tree);
    }

    #[test]
    fn round_trips_nested_tree_with_joins() {
        let tree = RuleGroup::any([
            hostname_is("sw1"),
            RuleGroup::all([
                Predicate::new("devices.os", Operator::BeginsWith, "ios").into(),
                Predicate::new("locations.location", Operator::Contains, "DC").into(),
            ])
            .into(),
        ])
        .with_joins(vec![vec![
            "locations".into(),
            "devices.location_id".into(),
            "locations.id".into(),
        ]]);

        let encoded = encode(&tree);
        assert_eq!(decode(&encoded).unwrap(), tree);
        assert_eq!(encode(&decode(&encoded).unwrap()), encoded);
    }

    #[test]
    fn child_order_is_preserved() {
        let forward = RuleGroup::all([hostname_is("a"), hostname_is("b")]);
        let reverse = RuleGroup::all([hostname_is("b"), hostname_is("a")]);
        assert_ne!(encode(&forward), encode(&reverse));
    }

    #[test]
    fn decode_rejects_bad_syntax() {
        assert!(matches!(decode("{not json"), Err(RuleTreeError::Syntax(_))));
        assert!(matches!(
            decode(r#"{"rules": []}"#),
            Err(RuleTreeError::Syntax(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_condition() {
        assert!(matches!(
            decode(r#"{"condition":"AND","rules":[],"valid":true}"#),
            Err(RuleTreeError::EmptyCondition)
        ));
    }

    #[test]
    fn decode_rejects_invalid_flag() {
        let encoded = json!({
            "condition": "AND",
            "rules": [{ "field": "devices.os", "operator": "equal", "value": "ios" }],
            "valid": false
        });
        assert!(matches!(
            from_value(&encoded),
            Err(RuleTreeError::NotValid)
        ));
    }

    #[test]
    fn numeric_predicates_need_raw_form() {
        let encoded = json!({
            "condition": "AND",
            "rules": [{
                "id": "devices.port",
                "field": "devices.port",
                "type": "integer",
                "input": "number",
                "operator": "greater",
                "value": 100
            }],
            "valid": true
        });
        let err = from_value(&encoded).unwrap_err();
        assert!(matches!(err, RuleTreeError::UnsupportedPredicate { ref field, .. } if field == "devices.port"));

        let source = RuleSource::from_remote(encoded.clone(), true);
        assert_eq!(source, RuleSource::Raw(encoded));
    }

    #[test]
    fn list_operators_need_raw_form() {
        let encoded = json!({
            "condition": "OR",
            "rules": [{ "field": "devices.os", "operator": "in", "value": "ios" }]
        });
        assert!(matches!(
            from_value(&encoded),
            Err(RuleTreeError::UnsupportedPredicate { .. })
        ));
    }

    #[test]
    fn validate_catches_empty_nested_group() {
        let tree = RuleGroup::all([hostname_is("a"), RuleGroup::any([]).into()]);
        assert!(matches!(
            tree.validate(),
            Err(RuleTreeError::EmptyCondition)
        ));
    }

    #[test]
    fn raw_override_must_be_object() {
        assert!(RuleSource::raw(r#"{"condition":"AND","rules":[]}"#).unwrap().is_raw());
        assert!(matches!(
            RuleSource::raw("[1, 2]"),
            Err(RuleTreeError::NotAnObject)
        ));
        assert!(matches!(
            RuleSource::raw("nope"),
            Err(RuleTreeError::Syntax(_))
        ));
    }

    #[test]
    fn declarative_tree_deserializes() {
        let tree: RuleGroup = serde_json::from_value(json!({
            "condition": "AND",
            "rules": [
                { "field": "devices.hostname", "operator": "ends_with", "value": ".example.net" },
                { "condition": "OR", "rules": [
                    { "field": "devices.os", "operator": "equal", "value": "ios" }
                ]}
            ]
        }))
        .unwrap();

        assert_eq!(tree.rules.len(), 2);
        assert!(matches!(tree.rules[1], RuleNode::Group(_)));
    }
}
