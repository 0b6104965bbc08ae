//! # Redis
//!
//! Primary store for every record the dashboard keeps.
//!
//! ## Requirements
//!
//! - Ids unique across instances sharing the database
//! - Cheap per tenant listings, a company only ever reads its own emissions and reports
//! - Unique usernames, emails and article slugs even under concurrent registration
//! - Article views counted without lost updates
//! - Sessions that expire on their own
//!
//! ## Implementation
//!
//! Every key lives under the `carbon:` prefix.
//!
//! | Concern | Redis type | Key |
//! |---|---|---|
//! | records | hash, id to JSON | `carbon:<table>` |
//! | id sequence | string, `INCR` | `carbon:<table>:seq` |
//! | ownership | set of ids | `carbon:company:<id>:emissions`, ... |
//! | unique index | hash, `HSETNX` | `carbon:index:<name>` |
//! | counters | hash, `HINCRBY` | `carbon:help_articles:views` |
//! | sessions | string with `EX` | `carbon:session:<token>` |
//!
//! - Atomic operations, Redis loads operations into a queue
//! - Listing a tenant is `SMEMBERS` followed by one `HMGET`
use std::time::Duration;

use async_trait::async_trait;
use ledger::models::Id;
use redis::{
    AsyncCommands, Client, RedisResult,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::store::{Backend, Counter, Group, Index, StoreResult, Table};

const PREFIX: &str = "carbon";

pub async fn init_redis(redis_url: &str) -> RedisResult<ConnectionManager> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn connect(redis_url: &str) -> RedisResult<Self> {
        Ok(Self::new(init_redis(redis_url).await?))
    }

    fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

fn table_key(table: Table) -> String {
    format!("{PREFIX}:{}", table.key())
}

fn sequence_key(table: Table) -> String {
    format!("{PREFIX}:{}:seq", table.key())
}

fn group_key(group: Group) -> String {
    format!("{PREFIX}:{}", group.key())
}

fn index_key(index: Index) -> String {
    format!("{PREFIX}:{}", index.key())
}

fn counter_key(counter: Counter) -> String {
    format!("{PREFIX}:{}", counter.key())
}

fn session_key(token: &str) -> String {
    format!("{PREFIX}:session:{token}")
}

#[async_trait]
impl Backend for RedisBackend {
    async fn next_id(&self, table: Table) -> StoreResult<Id> {
        let id: Id = self.connection().incr(sequence_key(table), 1).await?;

        Ok(id)
    }

    async fn load(&self, table: Table, id: Id) -> StoreResult<Option<String>> {
        let record: Option<String> = self.connection().hget(table_key(table), id).await?;

        Ok(record)
    }

    async fn load_many(&self, table: Table, ids: &[Id]) -> StoreResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(table_key(table))
            .arg(ids)
            .query_async(&mut self.connection())
            .await?;

        Ok(records.into_iter().flatten().collect())
    }

    async fn load_all(&self, table: Table) -> StoreResult<Vec<String>> {
        let records: Vec<String> = self.connection().hvals(table_key(table)).await?;

        Ok(records)
    }

    async fn save(&self, table: Table, id: Id, record: String) -> StoreResult<()> {
        let _: () = self.connection().hset(table_key(table), id, record).await?;

        Ok(())
    }

    async fn link(&self, group: Group, id: Id) -> StoreResult<()> {
        let _: () = self.connection().sadd(group_key(group), id).await?;

        Ok(())
    }

    async fn members(&self, group: Group) -> StoreResult<Vec<Id>> {
        let ids: Vec<Id> = self.connection().smembers(group_key(group)).await?;

        Ok(ids)
    }

    async fn claim(&self, index: Index, key: &str, id: Id) -> StoreResult<bool> {
        let claimed: bool = self.connection().hset_nx(index_key(index), key, id).await?;

        Ok(claimed)
    }

    async fn lookup(&self, index: Index, key: &str) -> StoreResult<Option<Id>> {
        let id: Option<Id> = self.connection().hget(index_key(index), key).await?;

        Ok(id)
    }

    async fn release(&self, index: Index, key: &str) -> StoreResult<()> {
        let _: () = self.connection().hdel(index_key(index), key).await?;

        Ok(())
    }

    async fn bump(&self, counter: Counter, id: Id) -> StoreResult<u64> {
        let value: u64 = self.connection().hincr(counter_key(counter), id, 1).await?;

        Ok(value)
    }

    async fn counter(&self, counter: Counter, id: Id) -> StoreResult<u64> {
        let value: Option<u64> = self.connection().hget(counter_key(counter), id).await?;

        Ok(value.unwrap_or(0))
    }

    async fn put_session(&self, token: &str, user_id: Id, ttl: Duration) -> StoreResult<()> {
        let _: () = self
            .connection()
            .set_ex(session_key(token), user_id, ttl.as_secs().max(1))
            .await?;

        Ok(())
    }

    async fn session(&self, token: &str) -> StoreResult<Option<Id>> {
        let user_id: Option<Id> = self.connection().get(session_key(token)).await?;

        Ok(user_id)
    }

    async fn drop_session(&self, token: &str) -> StoreResult<()> {
        let _: () = self.connection().del(session_key(token)).await?;

        Ok(())
    }
}
