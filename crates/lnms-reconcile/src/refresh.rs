// State refresh helpers
//
// Reads overlay the authoritative remote record onto the caller's
// last-known state. Remote attributes map directly; attributes LibreNMS
// folds into a derived blob keep their last-known value; nullable
// attributes missing from the record map to `None` rather than a zero
// value; membership lists become sets.

use std::collections::BTreeSet;
use std::str::FromStr;

use tracing::warn;

use crate::entity::EntityKind;

/// Keep a value the remote system never echoes back.
pub fn preserve<T: Clone>(last_known: Option<&T>) -> Option<T> {
    last_known.cloned()
}

/// A remote id list as an unordered set. `None` stays `None`; an empty
/// list stays an empty set.
pub fn membership(remote: Option<Vec<u32>>) -> Option<BTreeSet<u32>> {
    remote.map(|ids| ids.into_iter().collect())
}

/// Parse an enumerated remote value; unknown values map to `None` with a
/// warning rather than failing the read.
pub fn parse_known<T: FromStr>(
    entity: EntityKind,
    attribute: &'static str,
    remote: Option<&str>,
) -> Option<T> {
    let raw = remote?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%entity, attribute, value = raw, "unrecognized remote value left unset");
            None
        }
    }
}

/// Narrow a remote integer into the attribute's type; out-of-range maps to
/// `None` with a warning.
pub fn narrow<T: TryFrom<u32>>(
    entity: EntityKind,
    attribute: &'static str,
    remote: Option<u32>,
) -> Option<T> {
    let raw = remote?;
    T::try_from(raw).map_or_else(
        |_| {
            warn!(%entity, attribute, value = raw, "out-of-range remote value left unset");
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_distinguishes_absent_and_empty() {
        assert_eq!(membership(None), None);
        assert_eq!(membership(Some(vec![])), Some(BTreeSet::new()));
        assert_eq!(membership(Some(vec![3, 1, 3])), Some(BTreeSet::from([1, 3])));
    }

    #[test]
    fn parse_known_drops_unknown_values() {
        let ok: Option<u8> = parse_known(EntityKind::Device, "port", Some("7"));
        assert_eq!(ok, Some(7));
        let bad: Option<u8> = parse_known(EntityKind::Device, "port", Some("seven"));
        assert_eq!(bad, None);
        let absent: Option<u8> = parse_known(EntityKind::Device, "port", None);
        assert_eq!(absent, None);
    }

    #[test]
    fn narrow_drops_out_of_range() {
        let ok: Option<u16> = narrow(EntityKind::Device, "port", Some(161));
        assert_eq!(ok, Some(161));
        let bad: Option<u16> = narrow(EntityKind::Device, "port", Some(70_000));
        assert_eq!(bad, None);
    }

    #[test]
    fn preserve_keeps_last_known() {
        let last = Some("5m".to_string());
        assert_eq!(preserve(last.as_ref()), last);
        assert_eq!(preserve::<String>(None), None);
    }
}
