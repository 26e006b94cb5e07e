//! census CLI binary.
//!
//! Provides command-line access to raw Census tables and derived variables.

mod logging;

use census_data::{CENSUS_BASE_URL, CensusClient, ClientConfig, FetchRequest, Geography, Year};
use census_output::{write_derived_table, write_raw_table};
use census_vars::{ResolveOptions, VariableDefinition, available_presets, preset, resolve};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "census")]
#[command(about = "Pull Census Bureau tables and derived variables", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Census API key
    #[arg(long, env = "CENSUS_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API host
    #[arg(long, default_value = CENSUS_BASE_URL, global = true)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "60", global = true)]
    timeout_secs: u64,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract raw fields for one year
    Fetch {
        /// Survey year
        #[arg(long)]
        year: Year,

        /// Geography: state, county or zcta
        #[arg(long)]
        geo: Geography,

        /// Dataset family (acs, dec)
        #[arg(long, default_value = "acs")]
        dataset: String,

        /// Table (acs1, acs5, sf1)
        #[arg(long)]
        table: String,

        /// Field identifiers, e.g. B01001_001E
        #[arg(long, num_args = 1.., required = true)]
        fields: Vec<String>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Compute a derived variable for every year of a definition
    Derive {
        /// Geography: state, county or zcta
        #[arg(long)]
        geo: Geography,

        /// Dataset family (acs, dec)
        #[arg(long, default_value = "acs")]
        dataset: String,

        /// Table (acs1, acs5, sf1)
        #[arg(long)]
        table: String,

        /// Output variable name (defaults to the preset name)
        #[arg(long)]
        name: Option<String>,

        /// JSON file mapping year to numerator/denominator fields
        #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
        definition: Option<PathBuf>,

        /// Built-in definition (see `census presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// List built-in variable definitions
    Presets,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::default()
        .with_base_url(cli.base_url)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    config.api_key = cli.api_key.filter(|k| !k.trim().is_empty());

    match cli.command {
        Commands::Fetch {
            year,
            geo,
            dataset,
            table,
            fields,
            out,
        } => {
            let client = client(config)?;
            let request = FetchRequest::new(year, geo, dataset, table, fields);
            fetch_raw(&client, &request, &out).await?;
        }
        Commands::Derive {
            geo,
            dataset,
            table,
            name,
            definition,
            preset: preset_name,
            out,
        } => {
            let (definition, default_name) = match (definition, preset_name) {
                (Some(path), _) => (VariableDefinition::from_path(&path)?, None),
                (None, Some(name)) => (preset(&name)?, Some(name)),
                (None, None) => return Err("either --definition or --preset is required".into()),
            };
            let name = name
                .or(default_name)
                .ok_or("--name is required with --definition")?;
            let options = ResolveOptions::new(geo, dataset, table, name)?;

            let client = client(config)?;
            derive_variable(&client, &definition, &options, &out).await?;
        }
        Commands::Presets => list_presets(),
    }

    Ok(())
}

fn client(config: ClientConfig) -> Result<CensusClient, Box<dyn std::error::Error>> {
    if config.api_key.is_none() {
        tracing::warn!("no API key configured; the Census API may throttle or reject requests");
    }
    Ok(CensusClient::new(config)?)
}

async fn fetch_raw(
    client: &CensusClient,
    request: &FetchRequest,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner(format!(
        "Fetching {} fields for {} ({})...",
        request.fields.len(),
        request.year,
        request.geography
    ));

    match client.fetch(request).await {
        Ok(df) => {
            pb.finish_and_clear();
            write_raw_table(&df, out, &request.table, request.year, request.geography)?;
        }
        Err(e) => {
            pb.finish_and_clear();
            tracing::warn!(year = request.year, error = %e, "cannot generate for year");
        }
    }
    Ok(())
}

async fn derive_variable(
    client: &CensusClient,
    definition: &VariableDefinition,
    options: &ResolveOptions,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    for problem in definition.validate() {
        tracing::warn!(%problem, "definition has an invalid year; it will be skipped");
    }
    if definition.is_empty() {
        tracing::info!("definition has no years; nothing to do");
        return Ok(());
    }

    let pb = spinner(format!(
        "Resolving {} for {} year(s)...",
        options.output_name,
        definition.len()
    ));
    let resolution = resolve(client, definition, options).await;
    pb.finish_and_clear();

    let mut written = 0usize;
    for (year, df) in &resolution.tables {
        match write_derived_table(
            df,
            out,
            &options.output_name,
            &options.table,
            *year,
            options.geography,
        ) {
            Ok(_) => written += 1,
            Err(e) => tracing::error!(year = *year, error = %e, "failed to write table"),
        }
    }

    tracing::info!(
        written,
        failed = resolution.failures.len(),
        "finished {}",
        options.output_name
    );
    Ok(())
}

fn list_presets() {
    println!("{:<20} {:<8} {:<8} DESCRIPTION", "NAME", "DATASET", "TABLE");
    for info in available_presets() {
        println!(
            "{:<20} {:<8} {:<8} {}",
            info.name, info.dataset, info.table, info.description
        );
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}
