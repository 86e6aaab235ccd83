use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use flyscanner::common::constants::{DEFAULT_PROVIDER, DEFAULT_SAVE_PATH};
use flyscanner::config::Config;
use flyscanner::logging;
use flyscanner::output::{print_suggestion, ConsolePrinter, OfferSink, SheetWriter};
use flyscanner::{CancelToken, ProviderRegistry, ScanRequest, Scanner};

const BANNER: &str = r"
    ________      _____
   / ____/ /_  __/ ___/_________ _____  ____  ___  _____
  / /_  / / / / /\__ \/ ___/ __ `/ __ \/ __ \/ _ \/ ___/
 / __/ / / /_/ /___/ / /__/ /_/ / / / / / / /  __/ /
/_/   /_/\__, //____/\___/\__,_/_/ /_/_/ /_/\___/_/
        /____/
";

#[derive(Parser)]
#[command(name = "flyscanner")]
#[command(about = "Scan one-way flight prices across a range of dates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search flights on the selected provider
    Search(SearchArgs),
    /// Helper to find the IATA code of a city or airport
    Autocomplete {
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,
        /// Free-text location name
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },
    /// List available providers
    Providers,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,
    /// Departure airport
    #[arg(long = "from", visible_alias = "departure", short = 'f', value_name = "IATA", value_parser = parse_iata)]
    from: String,
    /// Destination airport
    #[arg(long = "to", visible_alias = "destination", short = 't', value_name = "IATA", value_parser = parse_iata)]
    to: String,
    /// First date to search
    #[arg(long, short = 'd', value_name = "YYYY-MM-DD")]
    date: NaiveDate,
    /// Last date to search, inclusive
    #[arg(long, value_name = "YYYY-MM-DD")]
    to_date: Option<NaiveDate>,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    passengers: u32,
    /// Show every offer of the day, not only the cheapest
    #[arg(long, conflicts_with = "list")]
    all: bool,
    /// Reduce verbosity
    #[arg(long)]
    list: bool,
    /// Append offers to a CSV sheet
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_SAVE_PATH)]
    save: Option<PathBuf>,
}

fn parse_iata(value: &str) -> Result<String, String> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(value.to_ascii_uppercase())
    } else {
        Err("must be a 3-letter IATA code (use `autocomplete` to find it)".to_string())
    }
}

async fn run_search(registry: &ProviderRegistry, config: &Config, args: SearchArgs) -> anyhow::Result<()> {
    if let Some(to_date) = args.to_date {
        if to_date < args.date {
            bail!("--to-date {} is before --date {}", to_date, args.date);
        }
    }

    let provider = registry.connect(&args.provider, config).await?;

    let origin = provider
        .resolve_location(&args.from)
        .await
        .with_context(|| format!("--from: invalid IATA {}", args.from))?;
    let destination = provider
        .resolve_location(&args.to)
        .await
        .with_context(|| format!("--to: invalid IATA {}", args.to))?;

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current date");
            on_signal.cancel();
        }
    });

    let mut console = ConsolePrinter::stdout(args.all, !args.list);
    let mut sheet = match &args.save {
        Some(path) => Some(SheetWriter::open(path, provider.provider_name())?),
        None => None,
    };
    let mut sinks: Vec<&mut dyn OfferSink> = vec![&mut console];
    if let Some(sheet) = sheet.as_mut() {
        sinks.push(sheet);
    }

    println!("Provider: {}", provider.provider_name());
    let request = ScanRequest {
        origin,
        destination,
        from_date: args.date,
        to_date: args.to_date,
        adults: args.passengers,
    };
    let summary = Scanner::new(provider.as_ref(), cancel)
        .run(&request, &mut sinks)
        .await?;

    info!(
        "Searched {} dates, {} offers{}",
        summary.dates_searched,
        summary.offers_found,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

async fn run_autocomplete(
    registry: &ProviderRegistry,
    config: &Config,
    provider: &str,
    terms: &[String],
) -> anyhow::Result<()> {
    let provider = registry.connect(provider, config).await?;
    let suggestions = provider.autocomplete(&terms.join(" ")).await?;

    let mut out = io::stdout().lock();
    for suggestion in &suggestions {
        print_suggestion(&mut out, suggestion, 0)?;
        writeln!(out)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref());

    println!("{BANNER}");
    let registry = ProviderRegistry::new();

    match cli.command {
        Commands::Search(args) => run_search(&registry, &config, args).await?,
        Commands::Autocomplete { provider, terms } => {
            run_autocomplete(&registry, &config, &provider, &terms).await?
        }
        Commands::Providers => {
            println!("Providers:");
            for name in registry.list_providers() {
                println!("  • {name}");
            }
        }
    }

    println!("Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iata_uppercases_codes() {
        assert_eq!(parse_iata("fco").unwrap(), "FCO");
        assert!(parse_iata("ROME").is_err());
        assert!(parse_iata("F1O").is_err());
    }

    #[test]
    fn test_save_flag_defaults_to_desktop_sheet() {
        let cli = Cli::try_parse_from([
            "flyscanner", "search", "--from", "fco", "--to", "cdg", "--date", "2024-06-01", "--save",
        ])
        .unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.from, "FCO");
        assert_eq!(args.provider, DEFAULT_PROVIDER);
        assert_eq!(args.save, Some(PathBuf::from(DEFAULT_SAVE_PATH)));
        assert_eq!(args.passengers, 1);
    }

    #[test]
    fn test_all_and_list_conflict() {
        let parsed = Cli::try_parse_from([
            "flyscanner", "search", "--from", "FCO", "--to", "CDG", "--date", "2024-06-01", "--all",
            "--list",
        ]);
        assert!(parsed.is_err());
    }
}
