// ── Reconciliation error types ──
//
// Every failure carries the entity kind and lifecycle operation it
// happened in. `ErrorKind` splits into three classes that callers treat
// differently: configuration errors are raised before any remote call,
// protocol errors may leave a created-but-unconfirmed entity behind, and
// remote errors are the collaborator's failures passed through verbatim.

use thiserror::Error;

use crate::entity::{EntityId, EntityKind, ParseIdError, Operation};
use crate::rules::RuleTreeError;

/// A failed lifecycle step, with entity and operation context.
#[derive(Debug, Error)]
#[error("{operation} {entity}: {kind}")]
pub struct Error {
    pub entity: EntityKind,
    pub operation: Operation,
    #[source]
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(entity: EntityKind, operation: Operation, kind: impl Into<ErrorKind>) -> Self {
        Self {
            entity,
            operation,
            kind: kind.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind.is_configuration()
    }

    pub fn is_protocol(&self) -> bool {
        self.kind.is_protocol()
    }

    pub fn is_remote(&self) -> bool {
        self.kind.is_remote()
    }

    /// Returns `true` if the remote system reported the entity missing.
    pub fn is_not_found(&self) -> bool {
        matches!(&self.kind, ErrorKind::Remote(e) if e.is_not_found())
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Error)]
pub enum ErrorKind {
    // ── Configuration ────────────────────────────────────────────────
    #[error("more than one `{group}` variant is set: {}", .clusters.join(", "))]
    MultipleVariantsSet {
        group: &'static str,
        clusters: Vec<&'static str>,
    },

    #[error("`{discriminator}` is `{value}` but `{expected}` is not set")]
    NoVariantSet {
        discriminator: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("`{}` and `{}` are mutually exclusive", .attributes[0], .attributes[1])]
    ConflictingRuleRepresentation { attributes: [&'static str; 2] },

    #[error("invalid import key {key:?}: {source}")]
    InvalidImportKey {
        key: String,
        #[source]
        source: ParseIdError,
    },

    #[error("malformed rule tree in `{attribute}`: {source}")]
    MalformedRuleTree {
        attribute: &'static str,
        #[source]
        source: RuleTreeError,
    },

    #[error("invalid `{attribute}`: {reason}")]
    ValidationFailed {
        attribute: &'static str,
        reason: String,
    },

    #[error("`{attribute}` cannot change after creation ({from} -> {to}); delete and recreate")]
    ImmutableAttribute {
        attribute: &'static str,
        from: String,
        to: String,
    },

    #[error("state has no identifier; create or import first")]
    MissingIdentifier,

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("expected exactly one record with {attribute} = {value:?}, found {matches}")]
    AmbiguousCreateMatch {
        attribute: &'static str,
        value: String,
        matches: usize,
    },

    #[error("no identifier in response message {message:?}")]
    IdentifierNotFound { message: String },

    #[error("identifier token {token:?} is not a valid id: {source}")]
    IdentifierParseError {
        token: String,
        #[source]
        source: ParseIdError,
    },

    #[error("expected exactly one record for id {id}, got {count}")]
    UnexpectedRecordCount { id: EntityId, count: usize },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("remote call failed: {0}")]
    Remote(#[from] lnms_api::Error),
}

impl ErrorKind {
    /// Raised before any remote call; fix the desired-state document.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MultipleVariantsSet { .. }
                | Self::NoVariantSet { .. }
                | Self::ConflictingRuleRepresentation { .. }
                | Self::InvalidImportKey { .. }
                | Self::MalformedRuleTree { .. }
                | Self::ValidationFailed { .. }
                | Self::ImmutableAttribute { .. }
                | Self::MissingIdentifier
        )
    }

    /// The remote entity may exist even though the operation failed.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousCreateMatch { .. }
                | Self::IdentifierNotFound { .. }
                | Self::IdentifierParseError { .. }
                | Self::UnexpectedRecordCount { .. }
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
