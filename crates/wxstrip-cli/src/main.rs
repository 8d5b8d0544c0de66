mod render;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wxstrip_core::{ProductSelection, SessionConfig, DEFAULT_REQUEST_DELAY_MS};
use wxstrip_fetch::{resolve_site, WeatherFetcher};

#[derive(Debug, Parser)]
#[command(name = "wxstrip")]
#[command(about = "Aviation weather briefing fetcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch text bulletins and imagery for one or more sites
    Fetch {
        /// ICAO identifiers; the first is the primary site
        #[arg(required = true)]
        sites: Vec<String>,
        /// Text products, comma separated (defaults to metar,taf,notam,sigmet,pirep)
        #[arg(long, value_delimiter = ',')]
        alpha: Option<Vec<String>>,
        /// Image products, comma separated (e.g. GFA/CLDWX,RADAR/COMPOSITE)
        #[arg(long, value_delimiter = ',')]
        image: Option<Vec<String>>,
        /// Delay between consecutive requests for one site, in milliseconds
        #[arg(long, env = "WXSTRIP_REQUEST_DELAY_MS", default_value_t = DEFAULT_REQUEST_DELAY_MS)]
        delay_ms: u64,
        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the known product catalog
    Products,
    /// Show the GFA region serving a site
    Region { site: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Fetch {
            sites,
            alpha,
            image,
            delay_ms,
            json,
        } => {
            let config = wxstrip_core::load_client_config_from_env()?;
            init_tracing(&config.log_level)?;

            let mut sites = sites.into_iter();
            let session = SessionConfig {
                primary_site: sites.next().unwrap_or_default(),
                additional_sites: sites.collect(),
                request_delay_ms: delay_ms,
            };
            let defaults = ProductSelection::default();
            let products = ProductSelection {
                alpha: alpha.unwrap_or(defaults.alpha),
                image: image.unwrap_or(defaults.image),
            };
            run_fetch(WeatherFetcher::new(config)?, &session, &products, json).await?;
        }
        Commands::Products => print!("{}", render::render_catalog()),
        Commands::Region { site } => match resolve_site(&site) {
            Some(region) => println!(
                "{}: {} ({})",
                site.to_ascii_uppercase(),
                region.code(),
                region.display_name()
            ),
            None => println!("{}: no GFA region", site.to_ascii_uppercase()),
        },
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so
/// `--json` output stays clean.
fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run_fetch(
    fetcher: WeatherFetcher,
    session: &SessionConfig,
    products: &ProductSelection,
    json: bool,
) -> anyhow::Result<()> {
    tracing::debug!(?session, ?products, "starting fetch");
    let snapshot = fetcher.fetch_weather_data(session, products).await?;
    let status = fetcher.status();
    let Some(snapshot) = snapshot else {
        eprintln!("{}", status.message);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    } else {
        print!("{}", render::render_snapshot(&snapshot));
    }
    eprintln!("{}", status.message);
    Ok(())
}
