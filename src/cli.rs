use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

pub const ENV_DATA: &str = "DASHBOARD_DATA";
pub const ENV_OUT_DIR: &str = "DASHBOARD_OUT_DIR";
pub const ENV_LOG: &str = "DASHBOARD_LOG";

pub const DEFAULT_DATA_FILE: &str = "all_orders.csv";

#[derive(Parser, Debug)]
#[command(name = "orders-dashboard")]
#[command(version, about = "E-commerce order analytics dashboard", long_about = None)]
pub struct Cli {
    /// Path to the cleaned orders CSV
    #[arg(long, short = 'd', env = ENV_DATA, default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Directory the report files are written to
    #[arg(long, short = 'o', env = ENV_OUT_DIR, default_value = ".")]
    pub out_dir: PathBuf,

    /// First purchase date to include (YYYY-MM-DD); defaults to the earliest in the data
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last purchase date to include (YYYY-MM-DD); defaults to the latest in the data
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Load, write every report and exit without the interactive menu
    #[arg(long)]
    pub batch: bool,

    /// Rows shown in each console table preview
    #[arg(long, default_value_t = 12)]
    pub preview_rows: usize,
}
