//! Aggregation engine: derived tables computed from a slice of order records.
//!
//! Every function here is a pure transformation of its input. Order counts are
//! always distinct `order_id` counts since one order may span several rows.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::types::{
    DeliveryStatus, DeliveryStatusRow, DeliveryTimeStats, MonthlySummaryRow, OrderRecord,
    OverviewStats, PaymentTypeRow,
};
use crate::util::mean;

/// Rows purchased on a date within `[start, end]`. An inverted range simply
/// matches nothing.
pub fn filter_by_date_range(
    data: &[OrderRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<OrderRecord> {
    data.iter()
        .filter(|r| {
            let date = r.purchased_at.date();
            start <= date && date <= end
        })
        .cloned()
        .collect()
}

/// Month-by-month order count and revenue for one calendar year.
///
/// Buckets cover every month from the first to the last month present in
/// `data`, so quiet months inside that span show up with zero orders. A year
/// without any orders yields no rows at all.
pub fn monthly_summary(data: &[OrderRecord], year: i32) -> Vec<MonthlySummaryRow> {
    #[derive(Default)]
    struct Acc<'a> {
        orders: HashSet<&'a str>,
        revenue: f64,
    }

    let mut buckets: BTreeMap<(i32, u32), Acc> = BTreeMap::new();
    for r in data {
        let key = (r.purchased_at.year(), r.purchased_at.month());
        let e = buckets.entry(key).or_default();
        e.orders.insert(r.order_id.as_str());
        e.revenue += r.payment_value;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };
    if !buckets.keys().any(|(y, _)| *y == year) {
        return Vec::new();
    }

    month_span(first, last)
        .filter(|(y, _)| *y == year)
        .map(|(y, m)| {
            let (order_count, revenue) = buckets
                .get(&(y, m))
                .map(|acc| (acc.orders.len(), acc.revenue))
                .unwrap_or((0, 0.0));
            MonthlySummaryRow {
                order_date: month_name(m),
                order_count,
                revenue,
            }
        })
        .collect()
}

/// Distinct orders per payment type, most used first.
pub fn payment_type_summary(data: &[OrderRecord]) -> Vec<PaymentTypeRow> {
    let mut map: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in data {
        map.entry(r.payment_type.as_str())
            .or_default()
            .insert(r.order_id.as_str());
    }
    let mut rows: Vec<PaymentTypeRow> = map
        .into_iter()
        .map(|(payment_type, orders)| PaymentTypeRow {
            payment_type: payment_type.to_string(),
            order_count: orders.len(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.order_count
            .cmp(&a.order_count)
            .then_with(|| a.payment_type.cmp(&b.payment_type))
    });
    rows
}

/// Always two rows, "On Time" then "Delayed"; a missing status counts zero.
pub fn delivery_status_summary(data: &[OrderRecord]) -> Vec<DeliveryStatusRow> {
    let mut map: HashMap<DeliveryStatus, HashSet<&str>> = HashMap::new();
    for r in data {
        map.entry(r.delivery_status)
            .or_default()
            .insert(r.order_id.as_str());
    }
    DeliveryStatus::ALL
        .into_iter()
        .map(|status| DeliveryStatusRow {
            delivery_status: status,
            order_count: map.get(&status).map_or(0, HashSet::len),
        })
        .collect()
}

/// Partition into `(on_time, delayed)`.
pub fn split_by_delivery_status(data: &[OrderRecord]) -> (Vec<OrderRecord>, Vec<OrderRecord>) {
    data.iter()
        .cloned()
        .partition(|r| r.delivery_status == DeliveryStatus::OnTime)
}

pub fn delivery_time_stats(subset: &[OrderRecord]) -> DeliveryTimeStats {
    let times: Vec<f64> = subset.iter().filter_map(|r| r.delivery_time).collect();
    let max = times
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let min = times
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    DeliveryTimeStats {
        max,
        min,
        mean: mean(&times),
    }
}

pub fn overview(data: &[OrderRecord]) -> OverviewStats {
    let orders: HashSet<&str> = data.iter().map(|r| r.order_id.as_str()).collect();
    let values: Vec<f64> = data.iter().map(|r| r.payment_value).collect();
    OverviewStats {
        total_orders: orders.len(),
        total_sales: values.iter().sum(),
        average_sales: mean(&values),
    }
}

/// Calendar years touched by `[start, end]`, ascending.
pub fn years_in_range(start: NaiveDate, end: NaiveDate) -> Vec<i32> {
    if start > end {
        return Vec::new();
    }
    (start.year()..=end.year()).collect()
}

/// Earliest and latest purchase date in `data`.
pub fn date_bounds(data: &[OrderRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let first = data.iter().map(|r| r.purchased_at.date()).min()?;
    let last = data.iter().map(|r| r.purchased_at.date()).max()?;
    Some((first, last))
}

fn month_span(first: (i32, u32), last: (i32, u32)) -> impl Iterator<Item = (i32, u32)> {
    std::iter::successors(Some(first), |&(y, m)| {
        Some(if m == 12 { (y + 1, 1) } else { (y, m + 1) })
    })
    .take_while(move |&ym| ym <= last)
}

fn month_name(month: u32) -> String {
    NaiveDate::from_ymd_opt(2000, month, 1)
        .map(|d| d.format("%B").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(
        id: &str,
        at: &str,
        payment_type: &str,
        value: f64,
        status: DeliveryStatus,
        delivery_time: Option<f64>,
    ) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            purchased_at: ts(at),
            payment_type: payment_type.to_string(),
            payment_value: value,
            delivery_status: status,
            delivery_time,
        }
    }

    fn sample() -> Vec<OrderRecord> {
        use DeliveryStatus::*;
        vec![
            order("o1", "2016-12-20 10:00:00", "credit_card", 50.0, OnTime, Some(10.0)),
            order("o2", "2017-01-05 08:00:00", "credit_card", 100.0, OnTime, Some(7.0)),
            // o2 split across two payment rows
            order("o2", "2017-01-05 08:00:00", "voucher", 20.0, OnTime, Some(7.0)),
            order("o3", "2017-03-10 23:59:59", "boleto", 200.0, Delayed, Some(30.5)),
            order("o4", "2018-02-01 00:00:00", "credit_card", 80.0, Delayed, None),
        ]
    }

    #[test]
    fn test_monthly_summary_example() {
        use DeliveryStatus::OnTime;
        let data = vec![
            order("a", "2017-01-05 12:00:00", "credit_card", 100.0, OnTime, None),
            order("b", "2017-02-10 12:00:00", "credit_card", 200.0, OnTime, None),
        ];
        let rows = monthly_summary(&data, 2017);
        assert_eq!(
            rows,
            vec![
                MonthlySummaryRow {
                    order_date: "January".to_string(),
                    order_count: 1,
                    revenue: 100.0
                },
                MonthlySummaryRow {
                    order_date: "February".to_string(),
                    order_count: 1,
                    revenue: 200.0
                },
            ]
        );
    }

    #[test]
    fn test_monthly_summary_only_target_year() {
        let data = sample();
        let rows = monthly_summary(&data, 2016);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_date, "December");
        assert_eq!(rows[0].order_count, 1);

        // 2017 spans every month because 2018 data follows it.
        let rows = monthly_summary(&data, 2017);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].order_date, "January");
        assert_eq!(rows[11].order_date, "December");

        let rows = monthly_summary(&data, 2018);
        let months: Vec<&str> = rows.iter().map(|r| r.order_date.as_str()).collect();
        assert_eq!(months, vec!["January", "February"]);
    }

    #[test]
    fn test_monthly_summary_counts_distinct_orders_and_fills_gaps() {
        let data = sample();
        let rows = monthly_summary(&data, 2017);
        assert_eq!(rows[0].order_count, 1);
        assert_eq!(rows[0].revenue, 120.0);
        assert_eq!(rows[1].order_date, "February");
        assert_eq!(rows[1].order_count, 0);
        assert_eq!(rows[1].revenue, 0.0);
        assert_eq!(rows[2].order_count, 1);
        assert_eq!(rows[2].revenue, 200.0);
    }

    #[test]
    fn test_monthly_summary_year_without_data_is_empty() {
        assert!(monthly_summary(&sample(), 2019).is_empty());
        assert!(monthly_summary(&[], 2017).is_empty());
    }

    #[test]
    fn test_monthly_summary_year_inside_span_without_orders_is_empty() {
        use DeliveryStatus::OnTime;
        let data = vec![
            order("a", "2016-12-01 10:00:00", "boleto", 10.0, OnTime, None),
            order("b", "2018-01-01 10:00:00", "boleto", 20.0, OnTime, None),
        ];
        assert!(monthly_summary(&data, 2017).is_empty());
        assert_eq!(monthly_summary(&data, 2016).len(), 1);
        assert_eq!(monthly_summary(&data, 2018).len(), 1);
    }

    #[test]
    fn test_payment_type_summary() {
        let rows = payment_type_summary(&sample());
        assert_eq!(
            rows,
            vec![
                PaymentTypeRow {
                    payment_type: "credit_card".to_string(),
                    order_count: 3
                },
                PaymentTypeRow {
                    payment_type: "boleto".to_string(),
                    order_count: 1
                },
                PaymentTypeRow {
                    payment_type: "voucher".to_string(),
                    order_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_delivery_status_summary_fixed_order() {
        use DeliveryStatus::*;
        let mut data = sample();
        data.reverse();
        let rows = delivery_status_summary(&data);
        assert_eq!(rows[0].delivery_status, OnTime);
        assert_eq!(rows[0].order_count, 2);
        assert_eq!(rows[1].delivery_status, Delayed);
        assert_eq!(rows[1].order_count, 2);
    }

    #[test]
    fn test_delivery_status_summary_zero_fills_missing_status() {
        use DeliveryStatus::*;
        let data = vec![
            order("x", "2017-05-01 10:00:00", "boleto", 10.0, Delayed, Some(20.0)),
            order("x", "2017-05-01 10:00:00", "voucher", 5.0, Delayed, Some(20.0)),
        ];
        let rows = delivery_status_summary(&data);
        assert_eq!(
            rows,
            vec![
                DeliveryStatusRow {
                    delivery_status: OnTime,
                    order_count: 0
                },
                DeliveryStatusRow {
                    delivery_status: Delayed,
                    order_count: 1
                },
            ]
        );

        let rows = delivery_status_summary(&[]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.order_count == 0));
    }

    #[test]
    fn test_split_by_delivery_status_partitions_input() {
        let data = sample();
        let (on_time, delayed) = split_by_delivery_status(&data);
        assert_eq!(on_time.len() + delayed.len(), data.len());
        assert!(on_time
            .iter()
            .all(|r| r.delivery_status == DeliveryStatus::OnTime));
        assert!(delayed
            .iter()
            .all(|r| r.delivery_status == DeliveryStatus::Delayed));
        for r in &data {
            assert!(on_time.contains(r) || delayed.contains(r));
        }

        let (on_time, delayed) = split_by_delivery_status(&[]);
        assert!(on_time.is_empty() && delayed.is_empty());
    }

    #[test]
    fn test_filter_by_date_range_inclusive_dates() {
        let data = sample();
        let rows = filter_by_date_range(&data, date(2017, 1, 5), date(2017, 3, 10));
        let ids: Vec<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
        // o3 is bought at 23:59:59 on the end date and still included.
        assert_eq!(ids, vec!["o2", "o2", "o3"]);
    }

    #[test]
    fn test_filter_by_date_range_inverted_is_empty() {
        let rows = filter_by_date_range(&sample(), date(2018, 1, 1), date(2017, 1, 1));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_filter_leaves_monthly_summary_in_range() {
        let filtered = filter_by_date_range(&sample(), date(2017, 1, 1), date(2017, 12, 31));
        let rows = monthly_summary(&filtered, 2017);
        let months: Vec<&str> = rows.iter().map(|r| r.order_date.as_str()).collect();
        assert_eq!(months, vec!["January", "February", "March"]);
        assert!(monthly_summary(&filtered, 2016).is_empty());
    }

    #[test]
    fn test_delivery_time_stats() {
        let (on_time, delayed) = split_by_delivery_status(&sample());
        let stats = delivery_time_stats(&on_time);
        assert_eq!(stats.max, Some(10.0));
        assert_eq!(stats.min, Some(7.0));
        assert_eq!(stats.mean, Some(8.0));

        // Null delivery times are skipped.
        let stats = delivery_time_stats(&delayed);
        assert_eq!(stats.max, Some(30.5));
        assert_eq!(stats.min, Some(30.5));
        assert_eq!(stats.mean, Some(30.5));
    }

    #[test]
    fn test_delivery_time_stats_no_data() {
        let empty = delivery_time_stats(&[]);
        assert_eq!(empty, DeliveryTimeStats::default());
        assert!(empty.max.is_none() && empty.min.is_none() && empty.mean.is_none());

        let undelivered = vec![order(
            "u",
            "2018-08-01 10:00:00",
            "boleto",
            10.0,
            DeliveryStatus::Delayed,
            None,
        )];
        assert_eq!(delivery_time_stats(&undelivered), DeliveryTimeStats::default());
    }

    #[test]
    fn test_overview() {
        let stats = overview(&sample());
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_sales, 450.0);
        assert_eq!(stats.average_sales, Some(90.0));

        let stats = overview(&[]);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.average_sales, None);
    }

    #[test]
    fn test_years_in_range() {
        assert_eq!(
            years_in_range(date(2016, 9, 4), date(2018, 10, 17)),
            vec![2016, 2017, 2018]
        );
        assert_eq!(years_in_range(date(2017, 2, 1), date(2017, 3, 1)), vec![2017]);
        assert!(years_in_range(date(2018, 1, 1), date(2017, 1, 1)).is_empty());
    }

    #[test]
    fn test_date_bounds() {
        assert_eq!(
            date_bounds(&sample()),
            Some((date(2016, 12, 20), date(2018, 2, 1)))
        );
        assert_eq!(date_bounds(&[]), None);
    }
}
