//! Core type definitions for Leadbook.
//!
//! This crate defines the records exchanged with the CRM backend:
//! - Record identifiers and id-or-document references
//! - Users, teams, leads, clients, comments and file attachments
//! - Form payloads and partial updates
//! - List filters and paginated results
//! - Response envelopes as the backend sends them
//!
//! Nothing here performs I/O. The gateway, session and cache crates build on
//! these types.

mod envelope;
mod filters;
mod forms;
mod ids;
mod pagination;
mod records;
mod stats;
mod status;

pub use envelope::{ErrorBody, FieldError, Payload};
pub use filters::{ClientFilters, Filters, LeadFilters, SortOrder};
pub use forms::{
    AuthResponse, ChangePasswordRequest, ClientForm, ClientPatch, ImportSummary, LeadForm,
    LeadPatch, LoginRequest, RegisterRequest, TeamForm, TeamPatch, UserPatch, UserProfileForm,
};
pub use ids::{RecordId, Ref, Referenced};
pub use pagination::{Page, Pagination};
pub use records::{Client, Comment, FileAttachment, Lead, Team, User};
pub use stats::{ClientStats, DashboardStats, DashboardSummary, LeadStats, MonthlyRevenue};
pub use status::{ClientStatus, LeadPriority, LeadStatus};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("empty record id")]
    EmptyId,
}
