use std::time::Duration;

use async_trait::async_trait;
use ledger::models::Id;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Corrupt record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("{table} record {id} is missing")]
    Missing { table: &'static str, id: Id },

    #[error("{0} is already taken")]
    Duplicate(&'static str),

    #[error("{table} record {id} is closed")]
    Closed { table: &'static str, id: Id },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record kinds, one keyspace each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Companies,
    Categories,
    Emissions,
    Reports,
    Plans,
    Subscriptions,
    SupportCategories,
    Tickets,
    Messages,
    Articles,
}

impl Table {
    pub fn key(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Companies => "companies",
            Table::Categories => "emission_categories",
            Table::Emissions => "emissions",
            Table::Reports => "reports",
            Table::Plans => "subscription_plans",
            Table::Subscriptions => "subscriptions",
            Table::SupportCategories => "support_categories",
            Table::Tickets => "support_tickets",
            Table::Messages => "support_messages",
            Table::Articles => "help_articles",
        }
    }
}

/// Ownership sets, so listing a tenant's records never scans a whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    CompanyEmissions(Id),
    CompanyReports(Id),
    CompanySubscriptions(Id),
    UserTickets(Id),
    TicketMessages(Id),
}

impl Group {
    pub fn key(self) -> String {
        match self {
            Group::CompanyEmissions(id) => format!("company:{id}:emissions"),
            Group::CompanyReports(id) => format!("company:{id}:reports"),
            Group::CompanySubscriptions(id) => format!("company:{id}:subscriptions"),
            Group::UserTickets(id) => format!("user:{id}:tickets"),
            Group::TicketMessages(id) => format!("ticket:{id}:messages"),
        }
    }
}

/// Unique secondary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Username,
    Email,
    ArticleSlug,
}

impl Index {
    pub fn key(self) -> &'static str {
        match self {
            Index::Username => "index:username",
            Index::Email => "index:email",
            Index::ArticleSlug => "index:article_slug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    ArticleViews,
}

impl Counter {
    pub fn key(self) -> &'static str {
        match self {
            Counter::ArticleViews => "help_articles:views",
        }
    }
}

/// Primitive persistence operations. Records travel as JSON text, typing happens in
/// [`Store`](super::Store).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn next_id(&self, table: Table) -> StoreResult<Id>;

    async fn load(&self, table: Table, id: Id) -> StoreResult<Option<String>>;

    /// Missing ids are skipped.
    async fn load_many(&self, table: Table, ids: &[Id]) -> StoreResult<Vec<String>>;

    async fn load_all(&self, table: Table) -> StoreResult<Vec<String>>;

    async fn save(&self, table: Table, id: Id, record: String) -> StoreResult<()>;

    async fn link(&self, group: Group, id: Id) -> StoreResult<()>;

    async fn members(&self, group: Group) -> StoreResult<Vec<Id>>;

    /// Set-if-absent. `false` when the key already belongs to someone.
    async fn claim(&self, index: Index, key: &str, id: Id) -> StoreResult<bool>;

    async fn lookup(&self, index: Index, key: &str) -> StoreResult<Option<Id>>;

    async fn release(&self, index: Index, key: &str) -> StoreResult<()>;

    /// Atomic increment, returns the new value.
    async fn bump(&self, counter: Counter, id: Id) -> StoreResult<u64>;

    async fn counter(&self, counter: Counter, id: Id) -> StoreResult<u64>;

    async fn put_session(&self, token: &str, user_id: Id, ttl: Duration) -> StoreResult<()>;

    async fn session(&self, token: &str) -> StoreResult<Option<Id>>;

    async fn drop_session(&self, token: &str) -> StoreResult<()>;
}
