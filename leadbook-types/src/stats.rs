//! Aggregates served by the stats endpoints.

use crate::records::{Client, Lead};
use crate::status::{ClientStatus, LeadPriority, LeadStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_leads: u64,
    pub total_clients: u64,
    pub conversion_rate: f64,
    pub total_revenue: f64,
    pub leads_this_month: u64,
    pub clients_this_month: u64,
    pub revenue_this_month: f64,
    pub average_deal_value: f64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// Revenue booked in one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

/// Payload of `GET /dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub recent_leads: Vec<Lead>,
    pub recent_clients: Vec<Client>,
}

/// Payload of `GET /leads/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadStats {
    pub total: u64,
    pub by_status: BTreeMap<LeadStatus, u64>,
    pub by_priority: BTreeMap<LeadPriority, u64>,
    pub conversion_rate: f64,
    pub average_value: f64,
}

/// Payload of `GET /clients/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientStats {
    pub total: u64,
    pub by_status: BTreeMap<ClientStatus, u64>,
    pub total_value: f64,
}
