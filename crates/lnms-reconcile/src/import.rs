// Import key resolution
//
// An import names an existing remote entity by its numeric id. Only the
// id is seeded; everything else comes from the following read.

use crate::entity::EntityId;
use crate::error::ErrorKind;

/// Validate an external import key.
///
/// Surrounding whitespace is not accepted: the key must be exactly a
/// positive integer.
pub fn resolve_import_key(raw: &str) -> Result<EntityId, ErrorKind> {
    raw.parse().map_err(|source| ErrorKind::InvalidImportKey {
        key: raw.to_owned(),
        source,
    })
}
