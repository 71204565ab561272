//! Cache keys of every resource query.
//!
//! Each resource lives under its own first segment, so invalidating
//! `leads()` reaches every lead list, record, stats and search entry.

use leadbook_query::{ListParams, QueryKey, query_key};
use leadbook_types::{ClientFilters, LeadFilters, RecordId};

pub fn leads() -> QueryKey {
    query_key!["leads"]
}

pub fn lead_list(params: &ListParams<LeadFilters>) -> QueryKey {
    query_key!["leads", params]
}

pub fn lead(id: &RecordId) -> QueryKey {
    query_key!["leads", id]
}

pub fn lead_stats() -> QueryKey {
    query_key!["leads", "stats"]
}

pub fn lead_search(term: &str) -> QueryKey {
    query_key!["leads", "search", term]
}

pub fn clients() -> QueryKey {
    query_key!["clients"]
}

pub fn client_list(params: &ListParams<ClientFilters>) -> QueryKey {
    query_key!["clients", params]
}

pub fn client(id: &RecordId) -> QueryKey {
    query_key!["clients", id]
}

pub fn client_stats() -> QueryKey {
    query_key!["clients", "stats"]
}

pub fn teams() -> QueryKey {
    query_key!["teams"]
}

pub fn team(id: &RecordId) -> QueryKey {
    query_key!["teams", id]
}

pub fn dashboard_stats() -> QueryKey {
    query_key!["dashboardStats"]
}

pub fn profile() -> QueryKey {
    query_key!["profile"]
}

pub fn users() -> QueryKey {
    query_key!["users"]
}

pub fn user(id: &RecordId) -> QueryKey {
    query_key!["users", id]
}
