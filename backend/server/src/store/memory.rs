use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    time::Duration,
};

use async_trait::async_trait;
use ledger::models::Id;
use tokio::{sync::RwLock, time::Instant};

use super::backend::{Backend, Counter, Group, Index, StoreResult, Table};

#[derive(Default)]
struct Tables {
    sequences: HashMap<Table, Id>,
    records: HashMap<Table, BTreeMap<Id, String>>,
    groups: HashMap<Group, BTreeSet<Id>>,
    indexes: HashMap<(Index, String), Id>,
    counters: HashMap<(Counter, Id), u64>,
    sessions: HashMap<String, (Id, Instant)>,
}

/// Process local backend with the same semantics as Redis. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn next_id(&self, table: Table) -> StoreResult<Id> {
        let mut tables = self.tables.write().await;
        let sequence = tables.sequences.entry(table).or_insert(0);
        *sequence += 1;

        Ok(*sequence)
    }

    async fn load(&self, table: Table, id: Id) -> StoreResult<Option<String>> {
        let tables = self.tables.read().await;

        Ok(tables
            .records
            .get(&table)
            .and_then(|records| records.get(&id))
            .cloned())
    }

    async fn load_many(&self, table: Table, ids: &[Id]) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;
        let Some(records) = tables.records.get(&table) else {
            return Ok(Vec::new());
        };

        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn load_all(&self, table: Table) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;

        Ok(tables
            .records
            .get(&table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, table: Table, id: Id, record: String) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .records
            .entry(table)
            .or_default()
            .insert(id, record);

        Ok(())
    }

    async fn link(&self, group: Group, id: Id) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .groups
            .entry(group)
            .or_default()
            .insert(id);

        Ok(())
    }

    async fn members(&self, group: Group) -> StoreResult<Vec<Id>> {
        let tables = self.tables.read().await;

        Ok(tables
            .groups
            .get(&group)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn claim(&self, index: Index, key: &str, id: Id) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let slot = (index, key.to_string());

        if tables.indexes.contains_key(&slot) {
            return Ok(false);
        }

        tables.indexes.insert(slot, id);
        Ok(true)
    }

    async fn lookup(&self, index: Index, key: &str) -> StoreResult<Option<Id>> {
        let tables = self.tables.read().await;

        Ok(tables.indexes.get(&(index, key.to_string())).copied())
    }

    async fn release(&self, index: Index, key: &str) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .indexes
            .remove(&(index, key.to_string()));

        Ok(())
    }

    async fn bump(&self, counter: Counter, id: Id) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let value = tables.counters.entry((counter, id)).or_insert(0);
        *value += 1;

        Ok(*value)
    }

    async fn counter(&self, counter: Counter, id: Id) -> StoreResult<u64> {
        let tables = self.tables.read().await;

        Ok(tables.counters.get(&(counter, id)).copied().unwrap_or(0))
    }

    async fn put_session(&self, token: &str, user_id: Id, ttl: Duration) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let now = Instant::now();

        tables.sessions.retain(|_, (_, expires)| *expires > now);
        tables
            .sessions
            .insert(token.to_string(), (user_id, now + ttl));

        Ok(())
    }

    async fn session(&self, token: &str) -> StoreResult<Option<Id>> {
        let mut tables = self.tables.write().await;

        match tables.sessions.get(token).copied() {
            Some((user_id, expires)) if expires > Instant::now() => Ok(Some(user_id)),
            Some(_) => {
                tables.sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn drop_session(&self, token: &str) -> StoreResult<()> {
        self.tables.write().await.sessions.remove(token);

        Ok(())
    }
}
