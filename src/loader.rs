use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::error::DashboardError;
use crate::types::{DeliveryStatus, OrderRecord, RawRow, REQUIRED_COLUMNS};
use crate::util::{parse_f64_safe, parse_timestamp_safe};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn load_and_clean(path: &Path) -> Result<(Vec<OrderRecord>, LoadReport), DashboardError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;

    // Rows deserialize by exact header name, so the check must not trim.
    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records: Vec<OrderRecord> = Vec::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = idx + 1, error = %e, "Skipping unreadable row");
                parse_errors += 1;
                continue;
            }
        };
        match clean_row(row) {
            Some(record) => records.push(record),
            None => {
                debug!(row = idx + 1, "Skipping row with invalid fields");
                parse_errors += 1;
            }
        }
    }

    if parse_errors > 0 {
        warn!(skipped = parse_errors, "Rows skipped due to parse/validation errors");
    }

    // Stable sort keeps the file order for identical timestamps.
    records.sort_by_key(|r| r.purchased_at);

    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        parse_errors,
        first_date: records.first().map(|r| r.purchased_at.date()),
        last_date: records.last().map(|r| r.purchased_at.date()),
    };
    info!(
        path = %path.display(),
        rows = report.loaded_rows,
        "Order data loaded"
    );
    Ok((records, report))
}

fn clean_row(row: RawRow) -> Option<OrderRecord> {
    let order_id = row.order_id?.trim().to_string();
    if order_id.is_empty() {
        return None;
    }
    let purchased_at = parse_timestamp_safe(row.order_purchase_timestamp.as_deref())?;
    let payment_value = parse_f64_safe(row.payment_value.as_deref())?;
    let delivery_status = DeliveryStatus::parse(row.delivery_status.as_deref()?)?;
    let payment_type = row
        .payment_type
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "not_defined".to_string());
    // Blank or NaN means not delivered yet; anything else must be a number.
    let delivery_time = match row.delivery_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("nan") => None,
        Some(s) => Some(parse_f64_safe(Some(s))?),
    };

    Some(OrderRecord {
        order_id,
        purchased_at,
        payment_type,
        payment_value,
        delivery_status,
        delivery_time,
    })
}
