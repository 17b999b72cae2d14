// Per-entity lifecycle contract
//
// Each managed entity type is a desired-state document implementing
// `Resource`. The trait supplies the pieces the `Reconciler` composes:
// the flat snapshot fed to the planner, identity recovery after create,
// the authoritative fetch, and the refresh overlay.

use std::future::Future;

use crate::entity::{EntityId, EntityKind};
use crate::error::ErrorKind;
use crate::plan::{FieldPolicy, Snapshot, UpdatePlan};
use crate::remote::NmsApi;

pub trait Resource: Clone + Send + Sync + Sized {
    const KIND: EntityKind;
    const POLICY: &'static FieldPolicy;

    /// The decoded remote record a fetch returns.
    type Record: Send;

    /// Remote id; `None` until created.
    fn id(&self) -> Option<EntityId>;

    /// Minimal state for an import: only the id.
    fn seed(id: EntityId) -> Self;

    /// Checks that need no remote call: discriminators, value ranges, JSON
    /// validity.
    fn validate(&self) -> Result<(), ErrorKind> {
        Ok(())
    }

    /// Attributes that may not change after creation.
    fn check_transition(&self, _prior: &Self) -> Result<(), ErrorKind> {
        Ok(())
    }

    /// Flatten into remote field names, resolving variant groups.
    fn snapshot(&self) -> Result<Snapshot, ErrorKind>;

    /// Overlay `record` onto `self`, keeping what the remote never echoes.
    #[must_use]
    fn refresh(&self, record: Self::Record) -> Self;

    /// Submit the create call and recover the new id, using whichever
    /// [`identity`](crate::identity) strategy this entity's endpoint allows.
    fn create<A: NmsApi>(
        &self,
        api: &A,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<EntityId, ErrorKind>> + Send;

    /// Fetch by id. Anything but exactly one record is a protocol error
    /// for the caller to raise.
    fn fetch<A: NmsApi>(
        api: &A,
        id: EntityId,
    ) -> impl Future<Output = Result<Vec<Self::Record>, ErrorKind>> + Send;

    /// Apply a non-empty plan in a single call.
    ///
    /// `document` is the desired snapshot laid over the prior one, for
    /// entities the remote system only updates as a whole.
    fn apply<A: NmsApi>(
        &self,
        api: &A,
        id: EntityId,
        plan: &UpdatePlan,
        document: &Snapshot,
    ) -> impl Future<Output = Result<(), ErrorKind>> + Send;

    fn remove<A: NmsApi>(api: &A, id: EntityId) -> impl Future<Output = Result<(), ErrorKind>> + Send;
}
