use clap::Parser;
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "apura")]
#[command(
    version,
    about = "Average-cost ledger and annual report for B3/CEI brokerage statements"
)]
#[command(
    long_about = "Reads a CEI negotiation statement (.xls/.xlsx/.csv), replays every \
trade and corporate action through an average-cost ledger and prints the \
per-asset positions and monthly realized results needed for the annual tax return."
)]
pub struct Cli {
    /// Path to the statement file. Defaults to InfoCEI.xls in the current
    /// directory or ~/Downloads.
    pub file: Option<PathBuf>,

    /// Corporate-action list (semicolon CSV: ticker;date;kind;ratio;quantity;price)
    #[arg(long)]
    pub actions: Option<PathBuf>,

    /// Reference year, overriding the statement banner
    #[arg(long)]
    pub year: Option<i32>,

    /// Abort on the first malformed row instead of skipping and reporting
    #[arg(long)]
    pub strict: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
