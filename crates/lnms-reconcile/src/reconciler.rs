// ── Lifecycle facade ──
//
// Create, read, update, delete, and import for any `Resource`, composed
// from variant resolution, planning, identity recovery, and refresh.
// Each operation awaits its remote calls one after another and stops at
// the first failure; nothing is retried or rolled back.

use tracing::{debug, info};

use crate::entity::{EntityId, Operation};
use crate::error::{Error, ErrorKind};
use crate::identity;
use crate::import;
use crate::plan::{self, Snapshot, UpdatePlan};
use crate::remote::NmsApi;
use crate::resource::Resource;

/// Reconciles desired state against one LibreNMS instance.
///
/// Holds no per-entity state: every call is pure given its inputs and the
/// remote responses, so independent entities may be reconciled
/// concurrently by the caller.
#[derive(Debug, Clone)]
pub struct Reconciler<A> {
    api: A,
}

impl<A: NmsApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create `desired` remotely and return it refreshed from the created
    /// record.
    ///
    /// A protocol error after the create call means the entity may exist
    /// remotely without a confirmed id; it is never deleted here.
    pub async fn create<R: Resource>(&self, desired: &R) -> Result<R, Error> {
        let op = Operation::Create;
        desired.validate().map_err(|e| fail::<R>(op, e))?;
        let snapshot = desired.snapshot().map_err(|e| fail::<R>(op, e))?;

        debug!(entity = %R::KIND, "creating");
        let id = desired
            .create(&self.api, &snapshot)
            .await
            .map_err(|e| fail::<R>(op, e))?;

        let record = self.fetch_one::<R>(op, id).await?;
        info!(entity = %R::KIND, %id, "created");
        Ok(desired.refresh(record))
    }

    /// Refresh `state` from the remote record with its id.
    pub async fn read<R: Resource>(&self, state: &R) -> Result<R, Error> {
        self.read_as(Operation::Read, state).await
    }

    /// Apply the minimal update from `prior` to `desired`.
    ///
    /// An empty plan makes no remote call and returns `prior` unchanged.
    /// Otherwise the plan goes out in one call and the entity is re-read.
    pub async fn update<R: Resource>(&self, desired: &R, prior: &R) -> Result<R, Error> {
        let op = Operation::Update;
        let id = prior
            .id()
            .or_else(|| desired.id())
            .ok_or_else(|| fail::<R>(op, ErrorKind::MissingIdentifier))?;

        let (want, have) = prepare_update(desired, prior)?;
        let plan = plan::plan_with_last_applied(&want, &have, &have, R::POLICY);
        if plan.is_empty() {
            debug!(entity = %R::KIND, %id, "no changes");
            return Ok(prior.clone());
        }

        debug!(entity = %R::KIND, %id, fields = ?plan.fields(), "applying update");
        let document = have.merged(&want);
        desired
            .apply(&self.api, id, &plan, &document)
            .await
            .map_err(|e| fail::<R>(op, e))?;

        let record = self.fetch_one::<R>(op, id).await?;
        info!(entity = %R::KIND, %id, changed = plan.len(), "updated");
        Ok(desired.refresh(record))
    }

    /// Delete the entity `state` refers to.
    pub async fn delete<R: Resource>(&self, state: &R) -> Result<(), Error> {
        let op = Operation::Delete;
        let id = state
            .id()
            .ok_or_else(|| fail::<R>(op, ErrorKind::MissingIdentifier))?;
        R::remove(&self.api, id)
            .await
            .map_err(|e| fail::<R>(op, e))?;
        info!(entity = %R::KIND, %id, "deleted");
        Ok(())
    }

    /// Adopt an existing remote entity by its external key.
    pub async fn import<R: Resource>(&self, raw_key: &str) -> Result<R, Error> {
        let op = Operation::Import;
        let id = import::resolve_import_key(raw_key).map_err(|e| fail::<R>(op, e))?;
        let state = self.read_as(op, &R::seed(id)).await?;
        info!(entity = %R::KIND, %id, "imported");
        Ok(state)
    }

    async fn read_as<R: Resource>(&self, op: Operation, state: &R) -> Result<R, Error> {
        let id = state
            .id()
            .ok_or_else(|| fail::<R>(op, ErrorKind::MissingIdentifier))?;
        let record = self.fetch_one::<R>(op, id).await?;
        Ok(state.refresh(record))
    }

    async fn fetch_one<R: Resource>(&self, op: Operation, id: EntityId) -> Result<R::Record, Error> {
        let records = R::fetch(&self.api, id)
            .await
            .map_err(|e| fail::<R>(op, e))?;
        identity::expect_single(records, id).map_err(|e| fail::<R>(op, e))
    }
}

/// Compute the update plan for moving `prior` to `desired`, without
/// applying it.
///
/// `prior` is both the remote snapshot and the last-applied snapshot for
/// write-only attributes.
pub fn plan_update<R: Resource>(desired: &R, prior: &R) -> Result<UpdatePlan, Error> {
    let (want, have) = prepare_update(desired, prior)?;
    Ok(plan::plan_with_last_applied(&want, &have, &have, R::POLICY))
}

/// Validate `desired`, check it against `prior`, and snapshot both.
fn prepare_update<R: Resource>(desired: &R, prior: &R) -> Result<(Snapshot, Snapshot), Error> {
    let op = Operation::Update;
    desired.validate().map_err(|e| fail::<R>(op, e))?;
    desired
        .check_transition(prior)
        .map_err(|e| fail::<R>(op, e))?;
    let want = desired.snapshot().map_err(|e| fail::<R>(op, e))?;
    let have = prior.snapshot().map_err(|e| fail::<R>(op, e))?;
    Ok((want, have))
}

fn fail<R: Resource>(operation: Operation, kind: ErrorKind) -> Error {
    Error::new(R::KIND, operation, kind)
}
