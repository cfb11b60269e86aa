use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

/// Columns the loader refuses to run without. Everything else in the CSV is
/// ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "order_id",
    "order_purchase_timestamp",
    "payment_type",
    "payment_value",
    "delivery_status",
    "delivery_time",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub order_id: Option<String>,
    pub order_purchase_timestamp: Option<String>,
    pub payment_type: Option<String>,
    pub payment_value: Option<String>,
    pub delivery_status: Option<String>,
    pub delivery_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeliveryStatus {
    #[serde(rename = "On Time")]
    OnTime,
    #[serde(rename = "Delayed")]
    Delayed,
}

impl DeliveryStatus {
    /// Fixed display order used by every status summary.
    pub const ALL: [DeliveryStatus; 2] = [DeliveryStatus::OnTime, DeliveryStatus::Delayed];

    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::OnTime => "On Time",
            DeliveryStatus::Delayed => "Delayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "On Time" => Some(DeliveryStatus::OnTime),
            "Delayed" => Some(DeliveryStatus::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub purchased_at: NaiveDateTime,
    pub payment_type: String,
    pub payment_value: f64,
    pub delivery_status: DeliveryStatus,
    /// Days from purchase to delivery; `None` until the order is delivered.
    pub delivery_time: Option<f64>,
}

/// Inclusive purchase-date range selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MonthlySummaryRow {
    #[tabled(rename = "OrderDate")]
    pub order_date: String,
    #[tabled(rename = "OrderCount")]
    pub order_count: usize,
    #[tabled(rename = "Revenue", display_with = "display_amount")]
    pub revenue: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PaymentTypeRow {
    #[tabled(rename = "PaymentType")]
    pub payment_type: String,
    #[tabled(rename = "OrderCount")]
    pub order_count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DeliveryStatusRow {
    #[tabled(rename = "DeliveryStatus")]
    pub delivery_status: DeliveryStatus,
    #[tabled(rename = "OrderCount")]
    pub order_count: usize,
}

/// Max/min/mean delivery time in days. `None` means no delivered orders
/// were available to measure.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq)]
pub struct DeliveryTimeStats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OverviewStats {
    pub total_orders: usize,
    pub total_sales: f64,
    pub average_sales: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub overview: OverviewStats,
    pub on_time_delivery: DeliveryTimeStats,
    pub delayed_delivery: DeliveryTimeStats,
}
