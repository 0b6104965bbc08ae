//! # Seed
//!
//! Reference data every deployment needs, plus an optional demo tenant.
//!
//! ## Reference data
//!
//! - Subscription plans: Basic, Pro, Enterprise
//! - Nine emission categories spread over the three scopes
//! - Support categories and the starter help articles
//!
//! ## Demo tenant (`--demo`)
//!
//! - Company "EcoMetrics Demo Corp"
//! - Users `admin` and `user`, both with password `password123`
//! - Active Pro subscription for 30 days
//! - Random emissions over the last six months, amounts between 1 and 20, about 70% verified
//!
//! Every step checks for existing records first, so running the seeder twice is harmless.
use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use ledger::{
    filter::EmissionFilter,
    models::{
        Company, DEFAULT_UNIT, EmissionCategory, Id, Role, Scope, SubscriptionPlan,
        SubscriptionStatus, User,
    },
    validate,
};
use rand::{Rng, seq::SliceRandom};
use rust_decimal::Decimal;
use server::{
    auth::hash_password,
    store::{
        NewArticle, NewCategory, NewCompany, NewEmission, NewPlan, NewSubscription,
        NewSupportCategory, NewUser, Store,
    },
};
use tracing::info;

pub mod fixtures;

use fixtures::{ARTICLES, CATEGORIES, DEMO_PASSWORD, PLANS, SUPPORT_CATEGORIES};

pub struct SeedOptions {
    pub demo: bool,
    pub password_cost: u32,
    pub sample_emissions: usize,
    pub progress: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub plans: usize,
    pub categories: usize,
    pub support_categories: usize,
    pub articles: usize,
    pub users: usize,
    pub emissions: usize,
}

pub async fn seed(store: &Store, options: &SeedOptions) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let plans = seed_plans(store, &mut report).await?;
    let categories = seed_categories(store, &mut report).await?;
    seed_support(store, &mut report).await?;

    if options.demo {
        let pro = plans
            .iter()
            .find(|plan| plan.name == "Pro")
            .context("Pro plan missing after seeding")?;
        seed_demo(store, options, pro, &categories, &mut report).await?;
    }

    info!("Seeding finished: {report:?}");
    Ok(report)
}

async fn seed_plans(store: &Store, report: &mut SeedReport) -> Result<Vec<SubscriptionPlan>> {
    let existing: HashSet<String> = store
        .plans()
        .await?
        .into_iter()
        .map(|plan| plan.name)
        .collect();

    for plan in PLANS {
        if existing.contains(plan.name) {
            info!("Plan {} already exists, skipping creation", plan.name);
            continue;
        }

        store
            .create_plan(NewPlan {
                name: plan.name.to_string(),
                description: Some(plan.description.to_string()),
                price: plan.price.parse().context("plan price")?,
                features: plan.features.iter().map(|f| f.to_string()).collect(),
            })
            .await?;
        report.plans += 1;
        info!("Created plan: {}", plan.name);
    }

    Ok(store.plans().await?)
}

async fn seed_categories(store: &Store, report: &mut SeedReport) -> Result<Vec<EmissionCategory>> {
    let existing: HashSet<(String, Scope)> = store
        .categories()
        .await?
        .into_iter()
        .map(|category| (category.name, category.scope))
        .collect();

    for category in CATEGORIES {
        if existing.contains(&(category.name.to_string(), category.scope)) {
            info!(
                "Category {} ({}) already exists, skipping creation",
                category.name, category.scope
            );
            continue;
        }

        store
            .create_category(NewCategory {
                name: category.name.to_string(),
                scope: category.scope,
                description: Some(category.description.to_string()),
                icon: Some(category.icon.to_string()),
            })
            .await?;
        report.categories += 1;
        info!("Created category: {} ({})", category.name, category.scope);
    }

    Ok(store.categories().await?)
}

async fn seed_support(store: &Store, report: &mut SeedReport) -> Result<()> {
    let existing: HashSet<String> = store
        .support_categories()
        .await?
        .into_iter()
        .map(|category| category.name)
        .collect();

    for category in SUPPORT_CATEGORIES {
        if existing.contains(category.name) {
            continue;
        }

        store
            .create_support_category(NewSupportCategory {
                name: category.name.to_string(),
                description: Some(category.description.to_string()),
                icon: Some(category.icon.to_string()),
            })
            .await?;
        report.support_categories += 1;
    }

    let support_categories = store.support_categories().await?;
    for article in ARTICLES {
        let slug = article
            .slug
            .map_or_else(|| validate::slugify(article.title), str::to_string);
        validate::article(article.title, &slug)?;
        if store.article_by_slug(&slug).await?.is_some() {
            info!("Article {slug} already exists, skipping creation");
            continue;
        }

        let category_id = support_categories
            .iter()
            .find(|category| category.name == article.category)
            .map(|category| category.id);

        store
            .create_article(NewArticle {
                title: article.title.to_string(),
                slug,
                content: article.content.to_string(),
                category_id,
                is_published: true,
            })
            .await?;
        report.articles += 1;
        info!("Article '{}' created successfully", article.title);
    }

    Ok(())
}

async fn demo_company(store: &Store) -> Result<Company> {
    if let Some(company) = store
        .companies()
        .await?
        .into_iter()
        .find(|company| company.name == "EcoMetrics Demo Corp")
    {
        info!("Company {} already exists, skipping creation", company.name);
        return Ok(company);
    }

    let company = store
        .create_company(NewCompany {
            name: "EcoMetrics Demo Corp".to_string(),
            industry: Some("Technology".to_string()),
            address: Some("123 Green Street".to_string()),
            city: Some("Sustainable City".to_string()),
            country: Some("USA".to_string()),
            size: Some("51-200".to_string()),
        })
        .await?;
    info!("Created company: {}", company.name);

    Ok(company)
}

async fn demo_user(
    store: &Store,
    username: &str,
    first_name: &str,
    role: Role,
    company_id: Id,
    password_cost: u32,
    report: &mut SeedReport,
) -> Result<User> {
    if let Some(user) = store.user_by_username(username).await? {
        info!("User {username} already exists, skipping creation");
        return Ok(user);
    }

    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: hash_password(DEMO_PASSWORD.to_string(), password_cost).await?,
            email: format!("{username}@ecometrics.com"),
            first_name: Some(first_name.to_string()),
            last_name: Some("User".to_string()),
            role,
            company_id: Some(company_id),
        })
        .await?;
    report.users += 1;
    info!("Created user: {username}");

    Ok(user)
}

async fn seed_demo(
    store: &Store,
    options: &SeedOptions,
    plan: &SubscriptionPlan,
    categories: &[EmissionCategory],
    report: &mut SeedReport,
) -> Result<()> {
    let company = demo_company(store).await?;
    let cost = options.password_cost;
    let admin = demo_user(store, "admin", "Admin", Role::Admin, company.id, cost, report).await?;
    demo_user(store, "user", "Regular", Role::User, company.id, cost, report).await?;

    if store.active_subscription(company.id).await?.is_none() {
        let now = Utc::now();
        store
            .create_subscription(NewSubscription {
                company_id: company.id,
                plan_id: plan.id,
                start_date: now,
                end_date: Some(now + Duration::days(30)),
                status: SubscriptionStatus::Active,
            })
            .await?;
        info!("Created subscription for company {}", company.id);
    }

    let existing = store
        .emissions(company.id, &EmissionFilter::default())
        .await?;
    if !existing.is_empty() {
        info!(
            "{} emissions already exist for company {}, skipping creation",
            existing.len(),
            company.id
        );
        return Ok(());
    }

    let samples = sample_emissions(company.id, admin.id, categories, options.sample_emissions);

    let pb = if options.progress {
        ProgressBar::new(samples.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .context("progress template")?
        .progress_chars("=> "),
    );
    pb.set_message("Creating sample emissions");

    for sample in samples {
        store.create_emission(sample).await?;
        report.emissions += 1;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    info!(
        "Created {} sample emissions for company {}",
        report.emissions, company.id
    );

    Ok(())
}

/// Random emissions from the last six months. A scope is picked first, then a category of it.
fn sample_emissions(
    company_id: Id,
    user_id: Id,
    categories: &[EmissionCategory],
    count: usize,
) -> Vec<NewEmission> {
    if categories.is_empty() {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let window = Duration::days(182).num_seconds();

    (0..count)
        .filter_map(|_| {
            let scope = *Scope::ALL.choose(&mut rng)?;
            let in_scope: Vec<&EmissionCategory> = categories
                .iter()
                .filter(|category| category.scope == scope)
                .collect();
            let category = match in_scope.choose(&mut rng) {
                Some(category) => *category,
                None => categories.choose(&mut rng)?,
            };

            let verified = rng.gen_bool(0.7);

            Some(NewEmission {
                company_id,
                category_id: category.id,
                description: Some(format!("Sample {} emission", category.name)),
                amount: Decimal::new(rng.gen_range(10..=200), 1),
                unit: DEFAULT_UNIT.to_string(),
                date: now - Duration::seconds(rng.gen_range(0..=window)),
                document_url: None,
                verified_by: verified.then_some(user_id),
                created_by: user_id,
            })
        })
        .collect()
}
