//! # Ledger
//!
//! Domain core of the carbon dashboard. No I/O lives here, only records and the
//! computations the API serves on top of them.
//!
//! - [`models`]: persisted records and their wire format
//! - [`summary`]: totals, scope subtotals and per category shares
//! - [`timeline`]: totals per month, quarter or year
//! - [`filter`]: period, scope, status and publication filters
//! - [`validate`]: payload rules
pub mod filter;
pub mod models;
pub mod summary;
pub mod timeline;
pub mod validate;

pub use filter::{ArticleFilter, DateRange, EmissionFilter, TicketFilter};
pub use summary::{Attributed, CategoryShare, EmissionsSummary, SummaryInput, summarize};
pub use timeline::{Granularity, TimelinePoint, emissions_timeline, timeline};
