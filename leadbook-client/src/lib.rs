//! Leadbook client: the composition root and per-resource bundles.
//!
//! ```no_run
//! use leadbook_client::{CrmConfig, CrmContext};
//! use leadbook_query::ListParams;
//! use leadbook_types::LeadFilters;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = CrmContext::open(CrmConfig::from_env())?;
//! let mut leads = ctx.leads().list(ListParams {
//!     filters: LeadFilters::default(),
//!     page: 1,
//!     limit: 10,
//! });
//! let page = leads.load().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod error;
pub mod keys;
mod resources;

pub use config::CrmConfig;
pub use context::CrmContext;
pub use error::{ClientError, ClientResult};
pub use resources::{Clients, Dashboard, LeadSearch, Leads, Profile, Teams, Users};
