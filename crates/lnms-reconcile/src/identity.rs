// Identity recovery after create
//
// LibreNMS create responses don't reliably carry the new id. Depending on
// the entity it is recovered by looking the entity up by its key, taking
// the response's `id`, scanning the collection for the unique name just
// submitted, or parsing it out of the free-text status message. Creation
// is only complete once a fetch by that id returns exactly one record.

use std::sync::LazyLock;

use lnms_api::CreateResponse;
use regex::Regex;

use crate::entity::EntityId;
use crate::error::ErrorKind;

/// Trailing `(#<id>)` marker in a service-create message, e.g.
/// `"Service ping has been added to device 2 (#5)"`.
pub static SERVICE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(\d+)\)$").expect("service id pattern compiles"));

/// The single record whose `key` equals `value`.
///
/// Zero or several matches is `AmbiguousCreateMatch`; duplicates are a
/// caller error, never resolved by taking the first.
pub fn match_unique<T>(
    records: Vec<T>,
    attribute: &'static str,
    value: &str,
    key: impl Fn(&T) -> &str,
) -> Result<T, ErrorKind> {
    let mut matches: Vec<T> = records.into_iter().filter(|r| key(r) == value).collect();
    if matches.len() == 1 {
        if let Some(found) = matches.pop() {
            return Ok(found);
        }
    }
    Err(ErrorKind::AmbiguousCreateMatch {
        attribute,
        value: value.to_owned(),
        matches: matches.len(),
    })
}

/// Extract the id from a `... (#<id>)` message.
pub fn extract_message_token(message: &str) -> Result<EntityId, ErrorKind> {
    let token = SERVICE_ID_PATTERN
        .captures(message.trim_end())
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ErrorKind::IdentifierNotFound {
            message: message.to_owned(),
        })?
        .as_str();

    token
        .parse()
        .map_err(|source| ErrorKind::IdentifierParseError {
            token: token.to_owned(),
            source,
        })
}

/// A recovered record's raw id as an [`EntityId`].
pub fn recovered_id(raw: u32) -> Result<EntityId, ErrorKind> {
    EntityId::new(raw).map_err(|source| ErrorKind::IdentifierParseError {
        token: raw.to_string(),
        source,
    })
}

/// The `id` from a create response, when present and valid.
pub fn response_id(response: &CreateResponse) -> Option<EntityId> {
    response.id.and_then(|raw| EntityId::new(raw).ok())
}

/// The single record of an authoritative fetch.
pub fn expect_single<T>(mut records: Vec<T>, id: EntityId) -> Result<T, ErrorKind> {
    if records.len() == 1 {
        if let Some(record) = records.pop() {
            return Ok(record);
        }
    }
    Err(ErrorKind::UnexpectedRecordCount {
        id,
        count: records.len(),
    })
}
