//! In-memory data-context implementation.
//!
//! Stores committed rows per entity type plus a journal of staged changes.
//! `save_changes` replays the journal against a copy of the rows and swaps
//! the copy in only when every change applies, so a failed save leaves both
//! the committed state and the journal untouched.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use common::Optional;
use parking_lot::RwLock;

use crate::data::{DataContext, Entity, EntityMutation, EntityPredicate, Repository};
use crate::error::{ContextError, Result};
use crate::transaction::{TransactionOptions, TransactionScope};

/// One staged change. Predicates and mutations are shared so the journal
/// stays clonable for transaction snapshots.
enum Change<E: Entity> {
    Insert(E),
    Update(E),
    UpdateWhere {
        predicate: EntityPredicate<E>,
        apply: EntityMutation<E>,
    },
    Remove(E::Key),
    RemoveWhere { predicate: EntityPredicate<E> },
}

impl<E: Entity> Clone for Change<E> {
    fn clone(&self) -> Self {
        match self {
            Change::Insert(e) => Change::Insert(e.clone()),
            Change::Update(e) => Change::Update(e.clone()),
            Change::UpdateWhere { predicate, apply } => Change::UpdateWhere {
                predicate: predicate.clone(),
                apply: apply.clone(),
            },
            Change::Remove(key) => Change::Remove(key.clone()),
            Change::RemoveWhere { predicate } => Change::RemoveWhere {
                predicate: predicate.clone(),
            },
        }
    }
}

/// Committed rows and the staged journal for one entity type.
struct Table<E: Entity> {
    rows: HashMap<E::Key, E>,
    journal: Vec<Change<E>>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            journal: Vec::new(),
        }
    }
}

impl<E: Entity> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            journal: self.journal.clone(),
        }
    }
}

impl<E: Entity> Table<E> {
    /// The row for `key` as it would look after the journal is applied.
    fn effective(&self, key: &E::Key) -> Option<E> {
        let mut current = self.rows.get(key).cloned();
        for change in &self.journal {
            match change {
                Change::Insert(e) | Change::Update(e) if e.key() == *key => {
                    current = Some(e.clone());
                }
                Change::UpdateWhere { predicate, apply } => {
                    if let Some(row) = current.as_mut()
                        && predicate(row)
                    {
                        apply(row);
                    }
                }
                Change::Remove(k) if k == key => current = None,
                Change::RemoveWhere { predicate } => {
                    if let Some(row) = current.as_ref()
                        && predicate(row)
                    {
                        current = None;
                    }
                }
                _ => {}
            }
        }
        current
    }

    /// Count of effective rows matching `predicate`.
    fn matching(&self, predicate: &EntityPredicate<E>) -> usize {
        // Keys only staged in the journal, deduplicated so repeated
        // inserts of one key count as the single row they produce.
        let staged: HashSet<E::Key> = self
            .journal
            .iter()
            .filter_map(|change| match change {
                Change::Insert(e) if !self.rows.contains_key(&e.key()) => Some(e.key()),
                _ => None,
            })
            .collect();

        self.rows
            .keys()
            .chain(staged.iter())
            .filter_map(|key| self.effective(key))
            .filter(|row| predicate(row))
            .count()
    }

    /// Replays the journal against a copy of the rows; swaps the copy in
    /// only when every change applies.
    fn flush(&mut self) -> Result<usize> {
        if self.journal.is_empty() {
            return Ok(0);
        }

        let mut rows = self.rows.clone();
        let mut applied = 0usize;

        for change in &self.journal {
            match change {
                Change::Insert(e) => {
                    let key = e.key();
                    if rows.contains_key(&key) {
                        return Err(ContextError::Conflict {
                            entity: E::entity_name(),
                            message: "duplicate key on insert".to_string(),
                        });
                    }
                    rows.insert(key, e.clone());
                    applied += 1;
                }
                Change::Update(e) => match rows.get_mut(&e.key()) {
                    Some(slot) => {
                        *slot = e.clone();
                        applied += 1;
                    }
                    None => {
                        return Err(ContextError::NotFound {
                            entity: E::entity_name(),
                        });
                    }
                },
                Change::UpdateWhere { predicate, apply } => {
                    for row in rows.values_mut().filter(|row| predicate(row)) {
                        apply(row);
                        applied += 1;
                    }
                }
                Change::Remove(key) => {
                    if rows.remove(key).is_none() {
                        return Err(ContextError::NotFound {
                            entity: E::entity_name(),
                        });
                    }
                    applied += 1;
                }
                Change::RemoveWhere { predicate } => {
                    rows.retain(|_, row| {
                        let matched = predicate(row);
                        if matched {
                            applied += 1;
                        }
                        !matched
                    });
                }
            }
        }

        self.rows = rows;
        self.journal.clear();
        Ok(applied)
    }
}

/// Type-erased view over [`Table`] so one context can hold tables for any
/// entity type.
trait AnyTable: Send + Sync {
    fn pending(&self) -> usize;
    fn flush(&mut self) -> Result<usize>;
    fn boxed_clone(&self) -> Box<dyn AnyTable>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Entity> AnyTable for Table<E> {
    fn pending(&self) -> usize {
        self.journal.len()
    }

    fn flush(&mut self) -> Result<usize> {
        Table::flush(self)
    }

    fn boxed_clone(&self) -> Box<dyn AnyTable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct ContextState {
    tables: HashMap<TypeId, Box<dyn AnyTable>>,
    in_transaction: bool,
}

impl ContextState {
    fn table<E: Entity>(&self) -> Option<&Table<E>> {
        self.tables
            .get(&TypeId::of::<E>())
            .and_then(|table| table.as_any().downcast_ref())
    }

    fn table_mut<E: Entity>(&mut self) -> &mut Table<E> {
        let table = self
            .tables
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Table::<E>::default()));
        match table.as_any_mut().downcast_mut() {
            Some(table) => table,
            // Tables are keyed by the entity's TypeId.
            None => unreachable!("table registered under a foreign TypeId"),
        }
    }

    fn snapshot(&self) -> HashMap<TypeId, Box<dyn AnyTable>> {
        self.tables
            .iter()
            .map(|(id, table)| (*id, table.boxed_clone()))
            .collect()
    }
}

/// In-memory [`DataContext`] for tests and single-process use.
///
/// Scoped to one logical request; not meant for concurrent use within that
/// scope, mirroring the contract of an ORM-backed context.
#[derive(Clone, Default)]
pub struct InMemoryDataContext {
    state: Arc<RwLock<ContextState>>,
}

impl InMemoryDataContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a typed repository handle backed by this context.
    pub fn repository<E: Entity>(&self) -> InMemoryRepository<E> {
        InMemoryRepository {
            state: self.state.clone(),
            _marker: PhantomData,
        }
    }

    /// Committed rows for one entity type, in no particular order.
    pub fn committed<E: Entity>(&self) -> Vec<E> {
        self.state
            .read()
            .table::<E>()
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataContext for InMemoryDataContext {
    async fn save_changes(&self) -> Result<usize> {
        let mut state = self.state.write();

        // Flush into clones first so a failure leaves every table intact.
        let mut flushed: Vec<(TypeId, Box<dyn AnyTable>)> = Vec::new();
        let mut total = 0usize;
        for (id, table) in &state.tables {
            if table.pending() == 0 {
                continue;
            }
            let mut clone = table.boxed_clone();
            total += clone.flush()?;
            flushed.push((*id, clone));
        }
        for (id, table) in flushed {
            state.tables.insert(id, table);
        }

        metrics::counter!("context_changes_persisted").increment(total as u64);
        tracing::debug!(applied = total, "pending changes persisted");
        Ok(total)
    }

    async fn begin(&self, _options: TransactionOptions) -> Result<TransactionScope> {
        let mut state = self.state.write();
        if state.in_transaction {
            return Err(ContextError::Conflict {
                entity: "transaction",
                message: "a transaction scope is already active".to_string(),
            });
        }
        state.in_transaction = true;
        let snapshot = state.snapshot();

        let commit_state = self.state.clone();
        let rollback_state = self.state.clone();
        Ok(TransactionScope::new(
            Box::new(move || {
                commit_state.write().in_transaction = false;
            }),
            Box::new(move || {
                let mut state = rollback_state.write();
                state.tables = snapshot;
                state.in_transaction = false;
            }),
        ))
    }

    async fn pending_changes(&self) -> usize {
        self.state
            .read()
            .tables
            .values()
            .map(|table| table.pending())
            .sum()
    }
}

/// Typed repository handle onto an [`InMemoryDataContext`].
pub struct InMemoryRepository<E: Entity> {
    state: Arc<RwLock<ContextState>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn find(&self, key: &E::Key) -> Result<Optional<E>> {
        let state = self.state.read();
        Ok(state
            .table::<E>()
            .and_then(|table| table.effective(key))
            .into())
    }

    async fn add(&self, entity: E) -> Result<()> {
        self.state
            .write()
            .table_mut::<E>()
            .journal
            .push(Change::Insert(entity));
        Ok(())
    }

    async fn add_all(&self, entities: Vec<E>) -> Result<()> {
        let mut state = self.state.write();
        let table = state.table_mut::<E>();
        table.journal.extend(entities.into_iter().map(Change::Insert));
        Ok(())
    }

    async fn update(&self, entity: E) -> Result<()> {
        self.state
            .write()
            .table_mut::<E>()
            .journal
            .push(Change::Update(entity));
        Ok(())
    }

    async fn update_where(
        &self,
        predicate: EntityPredicate<E>,
        apply: EntityMutation<E>,
    ) -> Result<usize> {
        let mut state = self.state.write();
        let table = state.table_mut::<E>();
        let matched = table.matching(&predicate);
        table.journal.push(Change::UpdateWhere { predicate, apply });
        Ok(matched)
    }

    async fn remove(&self, key: &E::Key) -> Result<()> {
        self.state
            .write()
            .table_mut::<E>()
            .journal
            .push(Change::Remove(key.clone()));
        Ok(())
    }

    async fn remove_where(&self, predicate: EntityPredicate<E>) -> Result<usize> {
        let mut state = self.state.write();
        let table = state.table_mut::<E>();
        let matched = table.matching(&predicate);
        table.journal.push(Change::RemoveWhere { predicate });
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: u32,
        balance: i64,
    }

    impl Entity for Account {
        type Key = u32;

        fn entity_name() -> &'static str {
            "Account"
        }

        fn key(&self) -> Self::Key {
            self.id
        }
    }

    fn account(id: u32, balance: i64) -> Account {
        Account { id, balance }
    }

    #[tokio::test]
    async fn staged_changes_apply_only_on_save() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.add(account(1, 100)).await.unwrap();
        assert!(ctx.committed::<Account>().is_empty());
        assert_eq!(ctx.pending_changes().await, 1);

        let applied = ctx.save_changes().await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(ctx.committed::<Account>(), vec![account(1, 100)]);
        assert_eq!(ctx.pending_changes().await, 0);
    }

    #[tokio::test]
    async fn save_with_nothing_pending_is_idempotent() {
        let ctx = InMemoryDataContext::new();
        assert_eq!(ctx.save_changes().await.unwrap(), 0);
        assert_eq!(ctx.save_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_sees_staged_changes_layered_over_committed() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.add(account(1, 100)).await.unwrap();
        ctx.save_changes().await.unwrap();

        repo.update(account(1, 250)).await.unwrap();
        let found = repo.find(&1).await.unwrap().into_option().unwrap();
        assert_eq!(found.balance, 250);

        repo.remove(&1).await.unwrap();
        assert!(repo.find(&1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_fails_and_leaves_journal_intact() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.add(account(1, 100)).await.unwrap();
        ctx.save_changes().await.unwrap();

        repo.add(account(1, 200)).await.unwrap();
        let err = ctx.save_changes().await.unwrap_err();
        assert!(matches!(err, ContextError::Conflict { .. }));

        // Nothing applied, change still pending.
        assert_eq!(ctx.committed::<Account>(), vec![account(1, 100)]);
        assert_eq!(ctx.pending_changes().await, 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.update(account(7, 1)).await.unwrap();
        let err = ctx.save_changes().await.unwrap_err();
        assert!(matches!(err, ContextError::NotFound { .. }));
    }

    #[tokio::test]
    async fn bulk_update_and_remove_by_predicate() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.add_all(vec![account(1, 10), account(2, 20), account(3, 30)])
            .await
            .unwrap();
        ctx.save_changes().await.unwrap();

        let matched = repo
            .update_where(
                Arc::new(|a: &Account| a.balance >= 20),
                Arc::new(|a: &mut Account| a.balance += 1),
            )
            .await
            .unwrap();
        assert_eq!(matched, 2);
        ctx.save_changes().await.unwrap();
        assert_eq!(
            repo.find(&3).await.unwrap().into_option().unwrap().balance,
            31
        );

        let removed = repo
            .remove_where(Arc::new(|a: &Account| a.balance > 15))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        ctx.save_changes().await.unwrap();
        assert_eq!(ctx.committed::<Account>().len(), 1);
    }

    #[tokio::test]
    async fn repeated_staged_inserts_of_one_key_match_once() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        // Two inserts for the same uncommitted key; the later one wins.
        repo.add(account(1, 10)).await.unwrap();
        repo.add(account(1, 20)).await.unwrap();

        let matched = repo
            .update_where(
                Arc::new(|_: &Account| true),
                Arc::new(|a: &mut Account| a.balance += 1),
            )
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let removed = repo
            .remove_where(Arc::new(|a: &Account| a.balance >= 10))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn rollback_restores_state_saved_inside_the_scope() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        repo.add(account(1, 100)).await.unwrap();
        ctx.save_changes().await.unwrap();

        let scope = ctx.begin(TransactionOptions::new()).await.unwrap();
        repo.add(account(2, 200)).await.unwrap();
        ctx.save_changes().await.unwrap();
        assert_eq!(ctx.committed::<Account>().len(), 2);

        drop(scope);
        assert_eq!(ctx.committed::<Account>(), vec![account(1, 100)]);
    }

    #[tokio::test]
    async fn commit_keeps_state_saved_inside_the_scope() {
        let ctx = InMemoryDataContext::new();
        let repo = ctx.repository::<Account>();

        let scope = ctx.begin(TransactionOptions::new()).await.unwrap();
        repo.add(account(1, 100)).await.unwrap();
        ctx.save_changes().await.unwrap();
        scope.commit();

        assert_eq!(ctx.committed::<Account>(), vec![account(1, 100)]);
    }

    #[tokio::test]
    async fn second_scope_while_active_is_a_conflict() {
        let ctx = InMemoryDataContext::new();
        let _scope = ctx.begin(TransactionOptions::new()).await.unwrap();
        let err = ctx.begin(TransactionOptions::new()).await.unwrap_err();
        assert!(matches!(err, ContextError::Conflict { .. }));
    }

    #[tokio::test]
    async fn scope_can_be_reopened_after_commit_and_rollback() {
        let ctx = InMemoryDataContext::new();

        ctx.begin(TransactionOptions::new()).await.unwrap().commit();
        drop(ctx.begin(TransactionOptions::new()).await.unwrap());
        ctx.begin(TransactionOptions::new()).await.unwrap().commit();
    }
}
