use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, global = true, default_value = "INFO")]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the PostgreSQL schema and tables.
    Migrate,

    /// Scrape and store one or more companies with their dividend history.
    Ingest {
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// Delete a company, its dividends and its autocomplete entry.
    Remove { ticker: String },

    /// Page through the stored companies.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Print the stored dividend history of a company.
    Dividends { ticker: String },

    /// Company names starting with a prefix (at most 10).
    Autocomplete { prefix: String },

    /// Seed or unseed autocomplete names by hand and print the matches.
    ///
    /// Preview only; not persisted. The index is rebuilt from the company
    /// store on every run.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Rebuild the autocomplete index from the company store.
    Reindex,

    /// Fetch a company and its dividends without storing anything.
    Scrape { ticker: String },
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    Add { name: String },
    Rm { name: String },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
