//! # Emissions Summary
//!
//! Dashboard totals for a set of emission records that were already filtered by
//! company and period.
//!
//! ## Output
//!
//! - `total`: sum of every amount
//! - `scope1`, `scope2`, `scope3`: per scope subtotals, always reconciling with `total`
//! - `byCategory`: one entry per category with its amount and share of `total`
//!
//! ## Computation
//!
//! 1. Fold all records into fresh accumulators (total, three scope buckets, category buckets)
//! 2. Only once the total is final, derive each category's percentage
//!
//! Percentages cannot be computed on the fly since every later record changes the denominator.
//! Amounts stay at full decimal precision, only the percentage is rounded (one decimal place,
//! half away from zero) and only at the very end. Sums saturate at `Decimal::MAX` instead of
//! overflowing; validated amounts never get near it.
use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{EmissionWithCategory, Id, Scope};

/// Anything that can be counted towards a summary.
pub trait Attributed {
    fn amount(&self) -> Decimal;
    fn category_id(&self) -> Id;
    fn category_name(&self) -> &str;
    fn scope(&self) -> Scope;
}

impl<T: Attributed + ?Sized> Attributed for &T {
    fn amount(&self) -> Decimal {
        (**self).amount()
    }

    fn category_id(&self) -> Id {
        (**self).category_id()
    }

    fn category_name(&self) -> &str {
        (**self).category_name()
    }

    fn scope(&self) -> Scope {
        (**self).scope()
    }
}

impl Attributed for EmissionWithCategory {
    fn amount(&self) -> Decimal {
        self.emission.amount
    }

    fn category_id(&self) -> Id {
        self.category.id
    }

    fn category_name(&self) -> &str {
        &self.category.name
    }

    fn scope(&self) -> Scope {
        self.category.scope
    }
}

/// Bare record for callers that do not hold full emissions.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryInput {
    pub amount: Decimal,
    pub category_id: Id,
    pub category_name: String,
    pub scope: Scope,
}

impl Attributed for SummaryInput {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn category_id(&self) -> Id {
        self.category_id
    }

    fn category_name(&self) -> &str {
        &self.category_name
    }

    fn scope(&self) -> Scope {
        self.scope
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category_id: Id,
    pub name: String,
    pub scope: Scope,
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsSummary {
    pub total: Decimal,
    pub scope1: Decimal,
    pub scope2: Decimal,
    pub scope3: Decimal,
    pub by_category: Vec<CategoryShare>,
}

struct Bucket {
    name: String,
    scope: Scope,
    amount: Decimal,
}

#[derive(Default)]
struct Totals {
    total: Decimal,
    scope1: Decimal,
    scope2: Decimal,
    scope3: Decimal,
    categories: BTreeMap<Id, Bucket>,
}

impl Totals {
    fn add<R: Attributed>(mut self, record: R) -> Self {
        let amount = record.amount();
        self.total = self.total.saturating_add(amount);

        let scope = match record.scope() {
            Scope::ScopeOne => &mut self.scope1,
            Scope::ScopeTwo => &mut self.scope2,
            Scope::ScopeThree => &mut self.scope3,
        };
        *scope = scope.saturating_add(amount);

        let bucket = self
            .categories
            .entry(record.category_id())
            .or_insert_with(|| Bucket {
                name: record.category_name().to_string(),
                scope: record.scope(),
                amount: Decimal::ZERO,
            });
        bucket.amount = bucket.amount.saturating_add(amount);

        self
    }
}

pub fn summarize<I>(records: I) -> EmissionsSummary
where
    I: IntoIterator,
    I::Item: Attributed,
{
    let totals = records.into_iter().fold(Totals::default(), Totals::add);
    let total = totals.total;

    let by_category = totals
        .categories
        .into_iter()
        .map(|(category_id, bucket)| CategoryShare {
            category_id,
            name: bucket.name,
            scope: bucket.scope,
            amount: bucket.amount,
            percentage: percentage(bucket.amount, total),
        })
        .collect();

    EmissionsSummary {
        total,
        scope1: totals.scope1,
        scope2: totals.scope2,
        scope3: totals.scope3,
        by_category,
    }
}

/// Share of `total`, one decimal place. Zero when there is nothing to divide by.
pub fn percentage(amount: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (amount / total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
