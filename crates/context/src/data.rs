//! Data-context contracts.
//!
//! A [`DataContext`] stages changes through typed [`Repository`] handles
//! and applies everything pending in a single [`DataContext::save_changes`]
//! call. Scopes opened with [`DataContext::begin`] roll changes back when
//! dropped without a commit.

use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use common::Optional;

use crate::Result;
use crate::transaction::{TransactionOptions, TransactionScope};

/// A keyed, clonable row type the context can stage and persist.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The key type identifying one entity instance.
    type Key: Eq + Hash + Clone + Send + Sync + 'static;

    /// A stable name used in error messages.
    fn entity_name() -> &'static str;

    /// Returns the key of this instance.
    fn key(&self) -> Self::Key;
}

/// A shared predicate over entities, used by the bulk operations.
pub type EntityPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A shared in-place mutation applied by [`Repository::update_where`].
pub type EntityMutation<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Typed access to one entity set.
///
/// All mutating operations stage a change; nothing is applied until the
/// owning context's `save_changes` runs. Reads see committed rows with the
/// staged changes layered on top.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Finds an entity by key. Absence is `Empty`, never an error.
    async fn find(&self, key: &E::Key) -> Result<Optional<E>>;

    /// Stages an insert.
    async fn add(&self, entity: E) -> Result<()>;

    /// Stages one insert per entity.
    async fn add_all(&self, entities: Vec<E>) -> Result<()>;

    /// Stages a full-row update.
    async fn update(&self, entity: E) -> Result<()>;

    /// Stages a mutation of every entity matching `predicate`. Returns the
    /// number of rows matching at staging time.
    async fn update_where(
        &self,
        predicate: EntityPredicate<E>,
        apply: EntityMutation<E>,
    ) -> Result<usize>;

    /// Stages a removal by key.
    async fn remove(&self, key: &E::Key) -> Result<()>;

    /// Stages a removal of every entity matching `predicate`. Returns the
    /// number of rows matching at staging time.
    async fn remove_where(&self, predicate: EntityPredicate<E>) -> Result<usize>;
}

/// The unit-of-work seam the persistence and transaction decorators talk to.
#[async_trait]
pub trait DataContext: Send + Sync {
    /// Applies every pending change atomically and returns the number of
    /// rows affected. Idempotent when nothing is pending.
    async fn save_changes(&self) -> Result<usize>;

    /// Opens a transaction scope. Changes staged or saved inside the scope
    /// are rolled back if the scope drops without [`TransactionScope::commit`].
    ///
    /// At most one scope may be active per context.
    async fn begin(&self, options: TransactionOptions) -> Result<TransactionScope>;

    /// Number of staged changes not yet applied.
    async fn pending_changes(&self) -> usize;
}
