use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, IndexAction, TraceLevel};
use divvy_warehouse::memory::{MemoryCompanies, MemoryDividends};
use divvy_warehouse::schema::{self, company::PgCompanies, dividend::PgDividends};
use divvy_warehouse::scrape::YahooFinance;
use divvy_warehouse::{AutocompleteIndex, Catalog, Config, Error, PageRequest};
use futures::{stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

type PgCatalog = Catalog<YahooFinance, PgCompanies, PgDividends>;

fn preprocess(trace_level: Level) -> Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a rejected operation and map it to its exit code.
fn fail(err: &Error) -> ExitCode {
    let kind = err.kind();
    error!("{err}");
    eprintln!("{}", json!({ "error": kind.code(), "message": err.to_string() }));
    ExitCode::from(kind.exit_code())
}

async fn connect(config: &Config) -> Result<PgCatalog> {
    debug!("Establishing PostgreSQL pool");
    let pool = schema::pool(config.require_postgres_url()?).map_err(Error::from)?;
    Ok(Catalog::new(
        YahooFinance::from_config(config)?,
        PgCompanies::new(pool.clone()),
        PgDividends::new(pool),
        Arc::new(AutocompleteIndex::new(config.case_sensitive)),
    ))
}

/// A catalog whose index reflects the company store; the index lives only as
/// long as the process.
async fn connect_indexed(config: &Config) -> Result<PgCatalog> {
    let catalog = connect(config).await?;
    catalog.rebuild_index().await?;
    Ok(catalog)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level)?;
    trace!("Command line input recorded: {cli:#?}");
    let config = Config::from_env()?;

    match run(cli, config).await {
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) => Ok(fail(err)),
            None => Err(e),
        },
        ok => ok,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    // cli framework:
    // "> divvy <COMMAND>"
    match cli.command {
        // "> divvy migrate"
        Migrate => {
            let pool = schema::pool(config.require_postgres_url()?).map_err(Error::from)?;
            schema::migrate(&pool).await.map_err(Error::from)?;
            info!("Schema migrated");
        }

        // "> divvy ingest AAPL MSFT ..."
        // each ticker succeeds or fails on its own; the exit code is that of the first failure
        Ingest { tickers } => {
            let catalog = connect_indexed(&config).await?;
            let catalog = &catalog;
            let outcomes: Vec<_> = stream::iter(tickers)
                .map(|ticker| async move {
                    let outcome = catalog.ingest(&ticker).await;
                    (ticker, outcome)
                })
                .buffered(num_cpus::get())
                .collect()
                .await;

            let mut exit = None;
            let mut report = Vec::with_capacity(outcomes.len());
            for (ticker, outcome) in outcomes {
                match outcome {
                    Ok(record) => report.push(json!({ "ticker": ticker, "company": record })),
                    Err(e) => {
                        exit.get_or_insert(fail(&e));
                        report.push(json!({ "ticker": ticker, "error": e.kind().code() }));
                    }
                }
            }
            print(&report)?;
            return Ok(exit.unwrap_or(ExitCode::SUCCESS));
        }

        // "> divvy remove AAPL"
        Remove { ticker } => {
            let catalog = connect_indexed(&config).await?;
            match catalog.remove(&ticker).await {
                Ok(name) => print(&json!({ "ticker": ticker, "removed": name }))?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        // "> divvy list --page 0 --size 20"
        List { page, size } => {
            let catalog = connect(&config).await?;
            match catalog.list_companies(PageRequest::new(page, size)).await {
                Ok(page) => print(&page)?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        // "> divvy dividends AAPL"
        Dividends { ticker } => {
            let catalog = connect(&config).await?;
            match catalog.dividends(&ticker).await {
                Ok(history) => print(&history)?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        // "> divvy autocomplete App"
        Autocomplete { prefix } => {
            let catalog = connect_indexed(&config).await?;
            print(&catalog.autocomplete(&prefix))?;
        }

        // "> divvy index [add rm] <NAME>"
        // prints what the name now matches in the rebuilt index
        Index { action } => {
            let catalog = connect_indexed(&config).await?;
            let name = match action {
                IndexAction::Add { name } => {
                    catalog.index_company_name(&name);
                    name
                }
                IndexAction::Rm { name } => {
                    catalog.unindex_company_name(&name);
                    name
                }
            };
            print(&catalog.autocomplete(&name))?;
        }

        // "> divvy reindex"
        Reindex => {
            let catalog = connect(&config).await?;
            match catalog.rebuild_index().await {
                Ok(indexed) => print(&json!({ "indexed": indexed }))?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        // "> divvy scrape AAPL"
        // dry run; needs no database
        Scrape { ticker } => {
            let catalog = Catalog::new(
                YahooFinance::from_config(&config)?,
                MemoryCompanies::new(),
                MemoryDividends::new(),
                Arc::new(AutocompleteIndex::new(config.case_sensitive)),
            );
            match catalog.scrape(&ticker).await {
                Ok(scraped) => print(&scraped)?,
                Err(e) => return Ok(fail(&e)),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
