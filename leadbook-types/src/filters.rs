//! List filters for the leads and clients screens.
//!
//! Filters serialize to camelCase query parameters; unset fields are omitted
//! so the backend applies its own defaults. Page and limit are not part of a
//! filter, the pagination state owns them.

use crate::ids::RecordId;
use crate::status::{ClientStatus, LeadPriority, LeadStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// A per-screen filter value.
pub trait Filters: Debug + Clone + Default + PartialEq + Serialize + Send + Sync + 'static {
    /// Copies every field set in `patch` over `self`.
    fn merge(&mut self, patch: Self);

    /// Unsets the field with the given snake_case name.
    ///
    /// Returns false if no such field exists or it was already unset.
    fn clear(&mut self, field: &str) -> bool;

    /// True when no field is set.
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filters accepted by `GET /leads`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

/// Filters accepted by `GET /clients`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

macro_rules! impl_filters {
    ($ty:ty, [$($field:ident),+ $(,)?]) => {
        impl Filters for $ty {
            fn merge(&mut self, patch: Self) {
                $(if patch.$field.is_some() {
                    self.$field = patch.$field;
                })+
            }

            fn clear(&mut self, field: &str) -> bool {
                match field {
                    $(stringify!($field) => self.$field.take().is_some(),)+
                    _ => false,
                }
            }
        }
    };
}

impl_filters!(
    LeadFilters,
    [status, priority, assigned_to, search, sort_by, sort_order, date_from, date_to]
);

impl_filters!(
    ClientFilters,
    [status, assigned_to, search, sort_by, sort_order, date_from, date_to]
);

/// Screens without filters (teams, users) paginate with the unit filter.
impl Filters for () {
    fn merge(&mut self, _patch: Self) {}

    fn clear(&mut self, _field: &str) -> bool {
        false
    }
}
