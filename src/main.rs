// Entry point and high-level CLI flow.
//
// Interactive mode offers a small menu:
// - [1] loads and cleans the orders CSV,
// - [2] narrows the purchase-date range (defaults to the whole dataset),
// - [3] writes every report for the range and previews it,
// - [4] shows delivery-time statistics for On Time or Delayed orders.
// `--batch` runs load + reports once and exits.
mod cli;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{debug, error};

use cli::{Cli, ENV_LOG};
use error::DashboardError;
use types::{DashboardSummary, DateRange, DeliveryStatus, DeliveryTimeStats, OrderRecord};

/// What the user has loaded and selected so far. Passed explicitly to every
/// handler; nothing lives in globals.
struct Session {
    data: Option<Vec<OrderRecord>>,
    bounds: Option<DateRange>,
    range: Option<DateRange>,
}

impl Session {
    fn new() -> Self {
        Session {
            data: None,
            bounds: None,
            range: None,
        }
    }

    /// The user's range, or the full span of the loaded data.
    fn active_range(&self) -> Option<DateRange> {
        self.range.or(self.bounds)
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to Menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and clean the orders CSV.
///
/// On success the rows replace whatever the session held and the date range
/// resets to the span of the new data.
fn handle_load(session: &mut Session, path: &Path) {
    match loader::load_and_clean(path) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} rows loaded)",
                util::format_int(report.total_rows),
                util::format_int(report.loaded_rows)
            );
            if report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors.",
                    util::format_int(report.parse_errors)
                );
            }
            session.bounds = match (report.first_date, report.last_date) {
                (Some(start), Some(end)) => Some(DateRange { start, end }),
                _ => None,
            };
            if let Some(bounds) = session.bounds {
                println!("Time range available: {}", bounds);
            }
            println!();
            session.range = None;
            session.data = Some(data);
        }
        Err(e) => {
            error!(error = %e, "Failed to load order data");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: ask for a start and end date within the loaded data.
fn handle_set_range(session: &mut Session) {
    let Some(bounds) = session.bounds else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    println!("Time range available: {}", bounds);

    let start = read_line(&format!("Start Date [{}]: ", bounds.start));
    let end = read_line(&format!("End Date [{}]: ", bounds.end));
    let range = match (
        parse_date_input(&start, bounds.start),
        parse_date_input(&end, bounds.end),
    ) {
        (Ok(start), Ok(end)) => DateRange { start, end },
        (Err(e), _) | (_, Err(e)) => {
            println!("{}\n", e);
            return;
        }
    };

    if range.start > range.end {
        println!("Start date must not be after end date.\n");
        return;
    }
    if !bounds.contains(range.start) || !bounds.contains(range.end) {
        println!("Dates must fall within {}.\n", bounds);
        return;
    }
    println!("Time range set to {}\n", range);
    session.range = Some(range);
}

/// Empty input keeps `default`.
fn parse_date_input(input: &str, default: NaiveDate) -> Result<NaiveDate, DashboardError> {
    if input.is_empty() {
        return Ok(default);
    }
    util::parse_date_safe(Some(input))
        .ok_or_else(|| DashboardError::InvalidDate(input.to_string()))
}

/// Write every report for `range` to `out_dir` and preview them on the
/// console. Returns the filtered rows so callers can show more detail.
fn generate_reports(
    data: &[OrderRecord],
    range: DateRange,
    out_dir: &Path,
    preview_rows: usize,
) -> Result<Vec<OrderRecord>, DashboardError> {
    let filtered = reports::filter_by_date_range(data, range.start, range.end);
    debug!(rows = filtered.len(), %range, "Filtered order data");

    std::fs::create_dir_all(out_dir)?;

    println!("Generating reports for {}...", range);
    println!("Outputs saved to {}\n", out_dir.display());

    let overview = reports::overview(&filtered);
    println!("Total Orders:  {}", util::format_int(overview.total_orders));
    println!("Total Sales:   {}", util::format_currency(overview.total_sales));
    println!(
        "Average Sales: {}\n",
        overview
            .average_sales
            .map(util::format_currency)
            .unwrap_or_else(|| "No data available".to_string())
    );

    for year in reports::years_in_range(range.start, range.end) {
        let rows = reports::monthly_summary(&filtered, year);
        output::write_csv(&out_dir.join(format!("monthly_orders_{}.csv", year)), &rows)?;
    }

    let payment_types = reports::payment_type_summary(&filtered);
    output::write_csv(&out_dir.join("payment_types.csv"), &payment_types)?;
    output::preview_table(
        "Ratio of Payment Types Based on Order Count",
        None,
        &payment_types,
        preview_rows,
    );

    let delivery_status = reports::delivery_status_summary(&filtered);
    output::write_csv(&out_dir.join("delivery_status.csv"), &delivery_status)?;
    output::preview_table("Delivery Status Comparison", None, &delivery_status, preview_rows);

    let (on_time, delayed) = reports::split_by_delivery_status(&filtered);
    let summary = DashboardSummary {
        range,
        overview,
        on_time_delivery: reports::delivery_time_stats(&on_time),
        delayed_delivery: reports::delivery_time_stats(&delayed),
    };
    output::write_json(&out_dir.join("summary.json"), &summary)?;

    Ok(filtered)
}

fn preview_monthly(filtered: &[OrderRecord], year: i32, preview_rows: usize) {
    let rows = reports::monthly_summary(filtered, year);
    output::preview_table(
        &format!("Number of Orders and Total Revenue per Month ({})", year),
        Some(&format!("exported to monthly_orders_{}.csv", year)),
        &rows,
        preview_rows,
    );
}

fn select_year(years: &[i32]) -> Option<i32> {
    match years {
        [] => None,
        [only] => Some(*only),
        _ => loop {
            let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
            let input = read_line(&format!("Select Year ({}): ", listed.join("/")));
            match input.parse::<i32>() {
                Ok(y) if years.contains(&y) => return Some(y),
                _ => println!("Invalid year. Please choose one of {}.", listed.join(", ")),
            }
        },
    }
}

/// Handle option [3]: write every report for the active range, then let the
/// user pick a year for the monthly preview.
///
/// Returns `true` if the reports were written.
fn handle_generate_reports(session: &Session, cli: &Cli) -> bool {
    let (Some(data), Some(range)) = (session.data.as_deref(), session.active_range()) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return false;
    };

    match generate_reports(data, range, &cli.out_dir, cli.preview_rows) {
        Ok(filtered) => {
            let years = reports::years_in_range(range.start, range.end);
            if let Some(year) = select_year(&years) {
                preview_monthly(&filtered, year, cli.preview_rows);
            }
            true
        }
        Err(e) => {
            error!(error = %e, "Report generation failed");
            eprintln!("Write error: {}\n", e);
            false
        }
    }
}

fn print_delivery_time(status: DeliveryStatus, stats: &DeliveryTimeStats) {
    println!("Delivery Time Status: {}", status);
    println!("Max Delivery Time:     {}", util::format_days(stats.max));
    println!("Min Delivery Time:     {}", util::format_days(stats.min));
    println!("Average Delivery Time: {}\n", util::format_days(stats.mean));
}

/// Handle option [4]: delivery-time statistics for On Time or Delayed orders
/// in the active range.
fn handle_delivery_time(session: &Session) {
    let (Some(data), Some(range)) = (session.data.as_deref(), session.active_range()) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    println!("Delivery Time Status:");
    println!("[1] {}", DeliveryStatus::OnTime);
    println!("[2] {}", DeliveryStatus::Delayed);
    let status = match read_choice().as_str() {
        "1" => DeliveryStatus::OnTime,
        "2" => DeliveryStatus::Delayed,
        _ => {
            println!("Invalid choice. Please enter 1 or 2.\n");
            return;
        }
    };

    let filtered = reports::filter_by_date_range(data, range.start, range.end);
    let (on_time, delayed) = reports::split_by_delivery_status(&filtered);
    let subset = match status {
        DeliveryStatus::OnTime => on_time,
        DeliveryStatus::Delayed => delayed,
    };
    println!();
    print_delivery_time(status, &reports::delivery_time_stats(&subset));
}

fn run_batch(cli: &Cli) -> anyhow::Result<()> {
    let (data, report) = loader::load_and_clean(&cli.data)
        .with_context(|| format!("Failed to load {}", cli.data.display()))?;
    let (first, last) = reports::date_bounds(&data).ok_or(DashboardError::NoData)?;
    let range = DateRange {
        start: cli.start.unwrap_or(first),
        end: cli.end.unwrap_or(last),
    };
    println!(
        "Processing dataset... ({} rows read, {} rows loaded)\n",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_rows)
    );

    let filtered = generate_reports(&data, range, &cli.out_dir, cli.preview_rows)
        .context("Failed to generate reports")?;
    for year in reports::years_in_range(range.start, range.end) {
        preview_monthly(&filtered, year, cli.preview_rows);
    }

    let (on_time, delayed) = reports::split_by_delivery_status(&filtered);
    print_delivery_time(DeliveryStatus::OnTime, &reports::delivery_time_stats(&on_time));
    print_delivery_time(DeliveryStatus::Delayed, &reports::delivery_time_stats(&delayed));
    Ok(())
}

fn run_menu(cli: &Cli) {
    let mut session = Session::new();
    loop {
        println!("Order Analytics Dashboard");
        if let Some(range) = session.active_range() {
            println!("(Time range: {})", range);
        }
        println!("[1] Load the file");
        println!("[2] Set date range");
        println!("[3] Generate reports");
        println!("[4] Delivery time statistics");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut session, &cli.data),
            "2" => handle_set_range(&mut session),
            "3" => {
                println!();
                if handle_generate_reports(&session, cli) && !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_delivery_time(&session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if cli.batch {
        if let Err(e) = run_batch(&cli) {
            eprintln!("\nError: {:#}\n", e);
            std::process::exit(1);
        }
    } else {
        run_menu(&cli);
    }
}
