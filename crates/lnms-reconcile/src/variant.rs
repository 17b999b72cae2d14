// Variant resolution
//
// Some entities offer several mutually exclusive configuration shapes: a
// device is reached over SNMP v1, v2c, or v3, or by ICMP only; a device
// group is either a static member list or a dynamic rule tree. Each shape
// is a cluster of attributes. At most one cluster may be populated, and
// the active one is flattened into the remote system's field names so the
// planner never sees variant-specific structure.

use std::collections::BTreeMap;

use crate::error::ErrorKind;
use crate::plan::{FieldValue, Fields};

/// One mutually exclusive attribute cluster and the flat fields it emits.
#[derive(Debug)]
pub struct VariantCluster {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// A named set of clusters, in declared (resolution) order.
#[derive(Debug)]
pub struct VariantGroup {
    pub name: &'static str,
    pub clusters: &'static [VariantCluster],
}

impl VariantGroup {
    pub fn cluster(&self, name: &str) -> Option<&VariantCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    fn position(&self, name: &str) -> usize {
        self.clusters
            .iter()
            .position(|c| c.name == name)
            .unwrap_or(usize::MAX)
    }
}

/// A typed cluster payload that knows its flat representation.
pub trait Variant {
    /// Cluster name within its [`VariantGroup`].
    fn cluster(&self) -> &'static str;

    /// Write this cluster's remote fields into `out`.
    fn flatten(&self, out: &mut Fields);
}

/// The active cluster of a group, with its flattened fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<V> {
    pub cluster: &'static str,
    pub variant: V,
    pub fields: Fields,
}

/// Pick the single populated cluster of `group`.
///
/// `populated` holds one entry per cluster the caller filled in. More than
/// one is `MultipleVariantsSet`; none resolves to `Ok(None)` and leaves the
/// group unmanaged.
pub fn resolve<V: Variant>(
    group: &VariantGroup,
    mut populated: Vec<V>,
) -> Result<Option<Resolved<V>>, ErrorKind> {
    populated.sort_by_key(|v| group.position(v.cluster()));

    if populated.len() > 1 {
        return Err(ErrorKind::MultipleVariantsSet {
            group: group.name,
            clusters: populated.iter().map(Variant::cluster).collect(),
        });
    }

    Ok(populated.pop().map(|variant| {
        let mut fields = BTreeMap::new();
        variant.flatten(&mut fields);
        Resolved {
            cluster: variant.cluster(),
            variant,
            fields,
        }
    }))
}

/// Check that a discriminator's value is backed by its cluster.
///
/// e.g. `type = dynamic` requires the `rules` cluster.
pub fn require(
    discriminator: &'static str,
    value: &str,
    expected: &'static str,
    active: Option<&'static str>,
) -> Result<(), ErrorKind> {
    if active == Some(expected) {
        Ok(())
    } else {
        Err(ErrorKind::NoVariantSet {
            discriminator,
            value: value.to_owned(),
            expected,
        })
    }
}

/// Set `field` in `out` when `value` is present.
pub(crate) fn put(out: &mut Fields, field: &'static str, value: Option<impl Into<FieldValue>>) {
    if let Some(value) = value {
        out.insert(field, value.into());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    static SHAPES: VariantGroup = VariantGroup {
        name: "shape",
        clusters: &[
            VariantCluster {
                name: "circle",
                fields: &["kind", "radius"],
            },
            VariantCluster {
                name: "square",
                fields: &["kind", "side"],
            },
        ],
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Shape {
        Circle(i64),
        Square(i64),
    }

    impl Variant for Shape {
        fn cluster(&self) -> &'static str {
            match self {
                Self::Circle(_) => "circle",
                Self::Square(_) => "square",
            }
        }

        fn flatten(&self, out: &mut Fields) {
            match self {
                Self::Circle(r) => {
                    out.insert("kind", "circle".into());
                    out.insert("radius", (*r).into());
                }
                Self::Square(s) => {
                    out.insert("kind", "square".into());
                    out.insert("side", (*s).into());
                }
            }
        }
    }

    #[test]
    fn single_cluster_flattens() {
        let resolved = resolve(&SHAPES, vec![Shape::Square(3)]).unwrap().unwrap();
        assert_eq!(resolved.cluster, "square");
        assert_eq!(resolved.fields.get("side"), Some(&FieldValue::Int(3)));
        assert_eq!(
            resolved.fields.get("kind"),
            Some(&FieldValue::Text("square".into()))
        );
    }

    #[test]
    fn no_cluster_is_unmanaged() {
        assert!(resolve::<Shape>(&SHAPES, vec![]).unwrap().is_none());
    }

    #[test]
    fn multiple_clusters_report_in_declared_order() {
        let err = resolve(&SHAPES, vec![Shape::Square(1), Shape::Circle(2)]).unwrap_err();
        match err {
            ErrorKind::MultipleVariantsSet { group, clusters } => {
                assert_eq!(group, "shape");
                assert_eq!(clusters, vec!["circle", "square"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn require_checks_discriminator() {
        assert!(require("type", "dynamic", "rules", Some("rules")).is_ok());
        let err = require("type", "dynamic", "rules", None).unwrap_err();
        assert_eq!(err.to_string(), "`type` is `dynamic` but `rules` is not set");
        assert!(require("type", "static", "devices", Some("rules")).is_err());
    }
}
