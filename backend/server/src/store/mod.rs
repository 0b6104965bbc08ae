//! # Storage
//!
//! Typed repository over a [`Backend`].
//!
//! ## Layout
//!
//! - One keyspace per record kind, records stored as JSON keyed by numeric id
//! - Ids handed out by a per kind sequence
//! - Tenant listings go through ownership sets (company emissions, user tickets, ...)
//! - Usernames, emails and article slugs are unique through set-if-absent indexes
//! - Article views are a separate atomic counter so concurrent readers never lose a view
//! - Read-modify-write of users and tickets happens under a per record lock, against a fresh read
//!
//! ## Backends
//!
//! - [`RedisBackend`](crate::database::RedisBackend): production, shared between instances
//! - [`MemoryBackend`]: tests and local runs
use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use ledger::{
    filter::{ArticleFilter, EmissionFilter, TicketFilter},
    models::{
        Company, Emission, EmissionCategory, EmissionWithCategory, HelpArticle, Id, Report,
        ReportStatus, ReportType, Role, Scope, Subscription, SubscriptionPlan, SubscriptionStatus,
        SubscriptionWithPlan, SupportCategory, SupportMessage, SupportTicket, TicketPriority,
        TicketStatus, User, DEFAULT_LANGUAGE,
    },
    summary::EmissionsSummary,
};
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

pub mod backend;
pub mod memory;

pub use backend::{Backend, Counter, Group, Index, StoreError, StoreResult, Table};
pub use memory::MemoryBackend;

pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub company_id: Option<Id>,
}

pub struct NewCompany {
    pub name: String,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub size: Option<String>,
}

pub struct NewCategory {
    pub name: String,
    pub scope: Scope,
    pub description: Option<String>,
    pub icon: Option<String>,
}

pub struct NewEmission {
    pub company_id: Id,
    pub category_id: Id,
    pub description: Option<String>,
    pub amount: Decimal,
    pub unit: String,
    pub date: DateTime<Utc>,
    pub document_url: Option<String>,
    pub verified_by: Option<Id>,
    pub created_by: Id,
}

pub struct NewReport {
    pub company_id: Id,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ReportStatus,
    pub kind: ReportType,
    pub data: Option<EmissionsSummary>,
    pub created_by: Id,
}

pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub features: Vec<String>,
}

pub struct NewSubscription {
    pub company_id: Id,
    pub plan_id: Id,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
}

pub struct NewSupportCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

pub struct NewTicket {
    pub user_id: Id,
    pub company_id: Option<Id>,
    pub category_id: Option<Id>,
    pub subject: String,
    pub priority: TicketPriority,
}

pub struct NewMessage {
    pub ticket_id: Id,
    pub user_id: Id,
    pub is_staff: bool,
    pub message: String,
    pub attachment_url: Option<String>,
}

pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category_id: Option<Id>,
    pub is_published: bool,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

const LOCK_STRIPES: usize = 64;

#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
    locks: Arc<[Mutex<()>]>,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Serializes writers of one record within this process. Never held across two records.
    async fn lock(&self, table: Table, id: Id) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        (table, id).hash(&mut hasher);

        self.locks[hasher.finish() as usize % self.locks.len()]
            .lock()
            .await
    }

    async fn fetch<T: DeserializeOwned>(&self, table: Table, id: Id) -> StoreResult<Option<T>> {
        match self.backend.load(table, id).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn fetch_group<T: DeserializeOwned>(
        &self,
        table: Table,
        group: Group,
    ) -> StoreResult<Vec<T>> {
        let ids = self.backend.members(group).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.backend
            .load_many(table, &ids)
            .await?
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }

    async fn fetch_all<T: DeserializeOwned>(&self, table: Table) -> StoreResult<Vec<T>> {
        self.backend
            .load_all(table)
            .await?
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }

    async fn persist<T: Serialize>(&self, table: Table, id: Id, record: &T) -> StoreResult<()> {
        #[cfg(feature = "verbose")]
        debug!("Persisting {} {id}", table.key());

        self.backend
            .save(table, id, serde_json::to_string(record)?)
            .await
    }

    // Users

    pub async fn user(&self, id: Id) -> StoreResult<Option<User>> {
        self.fetch(Table::Users, id).await
    }

    pub async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        match self.backend.lookup(Index::Username, username.trim()).await? {
            Some(id) => self.user(id).await,
            None => Ok(None),
        }
    }

    pub async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        match self.backend.lookup(Index::Email, &email_key(email)).await? {
            Some(id) => self.user(id).await,
            None => Ok(None),
        }
    }

    pub async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let id = self.backend.next_id(Table::Users).await?;
        let username = new.username.trim().to_string();
        let email = email_key(&new.email);

        if !self.backend.claim(Index::Username, &username, id).await? {
            return Err(StoreError::Duplicate("username"));
        }
        if !self.backend.claim(Index::Email, &email, id).await? {
            self.backend.release(Index::Username, &username).await?;
            return Err(StoreError::Duplicate("email"));
        }

        let now = Utc::now();
        let user = User {
            id,
            username,
            password_hash: new.password_hash,
            email,
            first_name: new.first_name,
            last_name: new.last_name,
            avatar_url: None,
            language: DEFAULT_LANGUAGE.to_string(),
            role: new.role,
            company_id: new.company_id,
            created_at: now,
            updated_at: now,
        };

        self.persist(Table::Users, id, &user).await?;
        debug!("Created user {id}");

        Ok(user)
    }

    /// Applies `change` to the latest stored copy of the user, moving the email index along
    /// when the address changed.
    pub async fn modify_user<F>(&self, id: Id, change: F) -> StoreResult<User>
    where
        F: FnOnce(&mut User) + Send,
    {
        let _guard = self.lock(Table::Users, id).await;
        let previous = self.user(id).await?.ok_or(StoreError::Missing {
            table: Table::Users.key(),
            id,
        })?;

        let mut user = previous.clone();
        change(&mut user);
        user.id = id;
        user.email = email_key(&user.email);
        if user.email != previous.email {
            if !self.backend.claim(Index::Email, &user.email, id).await? {
                return Err(StoreError::Duplicate("email"));
            }
            self.backend.release(Index::Email, &previous.email).await?;
        }

        user.updated_at = Utc::now();
        self.persist(Table::Users, id, &user).await?;

        Ok(user)
    }

    // Sessions

    pub async fn open_session(&self, user_id: Id, ttl: Duration) -> StoreResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        self.backend.put_session(&token, user_id, ttl).await?;

        Ok(token)
    }

    pub async fn session_user(&self, token: &str) -> StoreResult<Option<User>> {
        match self.backend.session(token).await? {
            Some(user_id) => self.user(user_id).await,
            None => Ok(None),
        }
    }

    pub async fn close_session(&self, token: &str) -> StoreResult<()> {
        self.backend.drop_session(token).await
    }

    // Companies

    pub async fn company(&self, id: Id) -> StoreResult<Option<Company>> {
        self.fetch(Table::Companies, id).await
    }

    pub async fn companies(&self) -> StoreResult<Vec<Company>> {
        let mut companies: Vec<Company> = self.fetch_all(Table::Companies).await?;
        companies.sort_by_key(|company| company.id);

        Ok(companies)
    }

    pub async fn create_company(&self, new: NewCompany) -> StoreResult<Company> {
        let id = self.backend.next_id(Table::Companies).await?;
        let now = Utc::now();
        let company = Company {
            id,
            name: new.name.trim().to_string(),
            industry: new.industry,
            address: new.address,
            city: new.city,
            country: new.country,
            size: new.size,
            created_at: now,
            updated_at: now,
        };

        self.persist(Table::Companies, id, &company).await?;

        Ok(company)
    }

    pub async fn update_company(&self, mut company: Company) -> StoreResult<Company> {
        company.updated_at = Utc::now();
        self.persist(Table::Companies, company.id, &company).await?;

        Ok(company)
    }

    // Emission categories

    pub async fn categories(&self) -> StoreResult<Vec<EmissionCategory>> {
        let mut categories: Vec<EmissionCategory> = self.fetch_all(Table::Categories).await?;
        categories.sort_by_key(|category| category.id);

        Ok(categories)
    }

    pub async fn category(&self, id: Id) -> StoreResult<Option<EmissionCategory>> {
        self.fetch(Table::Categories, id).await
    }

    pub async fn create_category(&self, new: NewCategory) -> StoreResult<EmissionCategory> {
        let id = self.backend.next_id(Table::Categories).await?;
        let category = EmissionCategory {
            id,
            name: new.name,
            scope: new.scope,
            description: new.description,
            icon: new.icon,
            created_at: Utc::now(),
        };

        self.persist(Table::Categories, id, &category).await?;

        Ok(category)
    }

    // Emissions

    async fn attach_category(&self, emission: Emission) -> StoreResult<EmissionWithCategory> {
        let category = self
            .category(emission.category_id)
            .await?
            .ok_or(StoreError::Missing {
                table: Table::Categories.key(),
                id: emission.category_id,
            })?;

        Ok(EmissionWithCategory { emission, category })
    }

    /// A company's emissions matching `filter`, newest first.
    pub async fn emissions(
        &self,
        company_id: Id,
        filter: &EmissionFilter,
    ) -> StoreResult<Vec<EmissionWithCategory>> {
        let emissions: Vec<Emission> = self
            .fetch_group(Table::Emissions, Group::CompanyEmissions(company_id))
            .await?;
        let categories: HashMap<Id, EmissionCategory> = self
            .categories()
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();

        let mut records = Vec::with_capacity(emissions.len());
        for emission in emissions {
            let category = categories
                .get(&emission.category_id)
                .cloned()
                .ok_or(StoreError::Missing {
                    table: Table::Categories.key(),
                    id: emission.category_id,
                })?;
            let record = EmissionWithCategory { emission, category };

            if filter.matches(&record) {
                records.push(record);
            }
        }

        records.sort_by(|a, b| {
            b.emission
                .date
                .cmp(&a.emission.date)
                .then(b.emission.id.cmp(&a.emission.id))
        });

        Ok(records)
    }

    pub async fn emission(&self, id: Id) -> StoreResult<Option<EmissionWithCategory>> {
        match self.fetch::<Emission>(Table::Emissions, id).await? {
            Some(emission) => Ok(Some(self.attach_category(emission).await?)),
            None => Ok(None),
        }
    }

    pub async fn create_emission(&self, new: NewEmission) -> StoreResult<EmissionWithCategory> {
        let id = self.backend.next_id(Table::Emissions).await?;
        let now = Utc::now();
        let emission = Emission {
            id,
            company_id: new.company_id,
            category_id: new.category_id,
            description: new.description,
            amount: new.amount,
            unit: new.unit,
            date: new.date,
            document_url: new.document_url,
            verified: new.verified_by.is_some(),
            verified_by: new.verified_by,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };

        let record = self.attach_category(emission).await?;
        self.persist(Table::Emissions, id, &record.emission).await?;
        self.backend
            .link(Group::CompanyEmissions(new.company_id), id)
            .await?;

        Ok(record)
    }

    pub async fn update_emission(&self, mut emission: Emission) -> StoreResult<EmissionWithCategory> {
        emission.updated_at = Utc::now();

        let record = self.attach_category(emission).await?;
        self.persist(Table::Emissions, record.emission.id, &record.emission)
            .await?;

        Ok(record)
    }

    // Reports

    /// Newest first.
    pub async fn reports(&self, company_id: Id) -> StoreResult<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .fetch_group(Table::Reports, Group::CompanyReports(company_id))
            .await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(reports)
    }

    pub async fn report(&self, id: Id) -> StoreResult<Option<Report>> {
        self.fetch(Table::Reports, id).await
    }

    pub async fn create_report(&self, new: NewReport) -> StoreResult<Report> {
        let id = self.backend.next_id(Table::Reports).await?;
        let now = Utc::now();
        let report = Report {
            id,
            company_id: new.company_id,
            name: new.name,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            kind: new.kind,
            data: new.data,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };

        self.persist(Table::Reports, id, &report).await?;
        self.backend
            .link(Group::CompanyReports(new.company_id), id)
            .await?;

        Ok(report)
    }

    pub async fn update_report(&self, mut report: Report) -> StoreResult<Report> {
        report.updated_at = Utc::now();
        self.persist(Table::Reports, report.id, &report).await?;

        Ok(report)
    }

    // Subscriptions

    pub async fn plans(&self) -> StoreResult<Vec<SubscriptionPlan>> {
        let mut plans: Vec<SubscriptionPlan> = self.fetch_all(Table::Plans).await?;
        plans.sort_by_key(|plan| plan.id);

        Ok(plans)
    }

    pub async fn create_plan(&self, new: NewPlan) -> StoreResult<SubscriptionPlan> {
        let id = self.backend.next_id(Table::Plans).await?;
        let plan = SubscriptionPlan {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            features: new.features,
            created_at: Utc::now(),
        };

        self.persist(Table::Plans, id, &plan).await?;

        Ok(plan)
    }

    /// The most recently started active subscription, with its plan.
    pub async fn active_subscription(
        &self,
        company_id: Id,
    ) -> StoreResult<Option<SubscriptionWithPlan>> {
        let subscriptions: Vec<Subscription> = self
            .fetch_group(Table::Subscriptions, Group::CompanySubscriptions(company_id))
            .await?;

        let Some(subscription) = subscriptions
            .into_iter()
            .filter(|subscription| subscription.status == SubscriptionStatus::Active)
            .max_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)))
        else {
            return Ok(None);
        };

        let plan = self
            .fetch(Table::Plans, subscription.plan_id)
            .await?
            .ok_or(StoreError::Missing {
                table: Table::Plans.key(),
                id: subscription.plan_id,
            })?;

        Ok(Some(SubscriptionWithPlan { subscription, plan }))
    }

    pub async fn create_subscription(&self, new: NewSubscription) -> StoreResult<Subscription> {
        let id = self.backend.next_id(Table::Subscriptions).await?;
        let now = Utc::now();
        let subscription = Subscription {
            id,
            company_id: new.company_id,
            plan_id: new.plan_id,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        self.persist(Table::Subscriptions, id, &subscription).await?;
        self.backend
            .link(Group::CompanySubscriptions(new.company_id), id)
            .await?;

        Ok(subscription)
    }

    // Support

    /// Alphabetical.
    pub async fn support_categories(&self) -> StoreResult<Vec<SupportCategory>> {
        let mut categories: Vec<SupportCategory> =
            self.fetch_all(Table::SupportCategories).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    pub async fn support_category(&self, id: Id) -> StoreResult<Option<SupportCategory>> {
        self.fetch(Table::SupportCategories, id).await
    }

    pub async fn create_support_category(
        &self,
        new: NewSupportCategory,
    ) -> StoreResult<SupportCategory> {
        let id = self.backend.next_id(Table::SupportCategories).await?;
        let category = SupportCategory {
            id,
            name: new.name,
            description: new.description,
            icon: new.icon,
        };

        self.persist(Table::SupportCategories, id, &category).await?;

        Ok(category)
    }

    /// A user's tickets, most recently active first.
    pub async fn tickets(
        &self,
        user_id: Id,
        filter: &TicketFilter,
    ) -> StoreResult<Vec<SupportTicket>> {
        let mut tickets: Vec<SupportTicket> = self
            .fetch_group(Table::Tickets, Group::UserTickets(user_id))
            .await?;
        tickets.retain(|ticket| filter.matches(ticket));
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(tickets)
    }

    pub async fn ticket(&self, id: Id) -> StoreResult<Option<SupportTicket>> {
        self.fetch(Table::Tickets, id).await
    }

    /// Opens a ticket, posting `first_message` on it when given.
    pub async fn create_ticket(
        &self,
        new: NewTicket,
        first_message: Option<String>,
    ) -> StoreResult<SupportTicket> {
        let id = self.backend.next_id(Table::Tickets).await?;
        let now = Utc::now();
        let ticket = SupportTicket {
            id,
            user_id: new.user_id,
            company_id: new.company_id,
            category_id: new.category_id,
            subject: new.subject,
            status: TicketStatus::Open,
            priority: new.priority,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        self.persist(Table::Tickets, id, &ticket).await?;
        self.backend.link(Group::UserTickets(new.user_id), id).await?;

        if let Some(message) = first_message {
            self.create_message(NewMessage {
                ticket_id: id,
                user_id: new.user_id,
                is_staff: false,
                message,
                attachment_url: None,
            })
            .await?;
        }

        Ok(ticket)
    }

    /// Applies `change` to the latest stored copy of the ticket and marks it as recently active.
    pub async fn modify_ticket<F>(&self, id: Id, change: F) -> StoreResult<SupportTicket>
    where
        F: FnOnce(&mut SupportTicket) + Send,
    {
        let _guard = self.lock(Table::Tickets, id).await;
        let mut ticket = self.ticket(id).await?.ok_or(StoreError::Missing {
            table: Table::Tickets.key(),
            id,
        })?;

        change(&mut ticket);
        ticket.id = id;
        ticket.updated_at = Utc::now();
        self.persist(Table::Tickets, id, &ticket).await?;

        Ok(ticket)
    }

    /// Oldest first.
    pub async fn messages(&self, ticket_id: Id) -> StoreResult<Vec<SupportMessage>> {
        let mut messages: Vec<SupportMessage> = self
            .fetch_group(Table::Messages, Group::TicketMessages(ticket_id))
            .await?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(messages)
    }

    /// Posts a message and marks the ticket as recently active. Closed tickets are refused.
    pub async fn create_message(&self, new: NewMessage) -> StoreResult<SupportMessage> {
        let _guard = self.lock(Table::Tickets, new.ticket_id).await;
        let mut ticket = self
            .ticket(new.ticket_id)
            .await?
            .ok_or(StoreError::Missing {
                table: Table::Tickets.key(),
                id: new.ticket_id,
            })?;

        if ticket.status == TicketStatus::Closed {
            return Err(StoreError::Closed {
                table: Table::Tickets.key(),
                id: ticket.id,
            });
        }

        let id = self.backend.next_id(Table::Messages).await?;
        let now = Utc::now();
        let message = SupportMessage {
            id,
            ticket_id: new.ticket_id,
            user_id: new.user_id,
            is_staff: new.is_staff,
            message: new.message,
            attachment_url: new.attachment_url,
            created_at: now,
        };

        self.persist(Table::Messages, id, &message).await?;
        self.backend
            .link(Group::TicketMessages(new.ticket_id), id)
            .await?;

        ticket.updated_at = now;
        self.persist(Table::Tickets, ticket.id, &ticket).await?;

        Ok(message)
    }

    // Help articles

    async fn with_views(&self, mut article: HelpArticle) -> StoreResult<HelpArticle> {
        article.views = self.backend.counter(Counter::ArticleViews, article.id).await?;

        Ok(article)
    }

    /// Alphabetical by title.
    pub async fn articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<HelpArticle>> {
        let all: Vec<HelpArticle> = self.fetch_all(Table::Articles).await?;

        let mut articles = Vec::new();
        for article in all.into_iter().filter(|article| filter.matches(article)) {
            articles.push(self.with_views(article).await?);
        }
        articles.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        Ok(articles)
    }

    pub async fn article_by_slug(&self, slug: &str) -> StoreResult<Option<HelpArticle>> {
        let Some(id) = self.backend.lookup(Index::ArticleSlug, slug).await? else {
            return Ok(None);
        };

        match self.fetch(Table::Articles, id).await? {
            Some(article) => Ok(Some(self.with_views(article).await?)),
            None => Ok(None),
        }
    }

    pub async fn create_article(&self, new: NewArticle) -> StoreResult<HelpArticle> {
        let id = self.backend.next_id(Table::Articles).await?;

        if !self.backend.claim(Index::ArticleSlug, &new.slug, id).await? {
            return Err(StoreError::Duplicate("slug"));
        }

        let now = Utc::now();
        let article = HelpArticle {
            id,
            title: new.title,
            slug: new.slug,
            content: new.content,
            category_id: new.category_id,
            is_published: new.is_published,
            views: 0,
            created_at: now,
            updated_at: now,
        };

        self.persist(Table::Articles, id, &article).await?;

        Ok(article)
    }

    /// Counts one view, returning the new total.
    pub async fn record_view(&self, article_id: Id) -> StoreResult<u64> {
        self.backend.bump(Counter::ArticleViews, article_id).await
    }
}
