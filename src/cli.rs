use chrono::NaiveDate;
use clap::Parser;

use crate::domain::{RosterConfig, RosterError};

/// A tui based, virtualized person table.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Number of generated person records
    #[arg(short = 'n', long, default_value_t = 500)]
    pub rows: u32,

    /// Seed of the record generator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Terminal lines per table row
    #[arg(long, default_value_t = 1)]
    pub row_height: u16,

    /// Rows rendered above and below the visible window
    #[arg(long, default_value_t = 10)]
    pub overscan: usize,

    /// Upper bound for a column's width in characters
    #[arg(long, default_value_t = 40)]
    pub max_column_width: usize,

    /// Reference date (YYYY-MM-DD) for "days since registered", defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Log file, `~` and environment variables are expanded
    #[arg(long)]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn config(&self) -> Result<RosterConfig, RosterError> {
        let mut cfg = RosterConfig::default()
            .with_record_count(self.rows)
            .with_seed(self.seed)
            .with_row_height(self.row_height)
            .with_overscan(self.overscan)
            .with_max_column_width(self.max_column_width);
        if let Some(today) = self.today {
            cfg = cfg.with_today(today);
        }
        cfg.validate()
    }
}
