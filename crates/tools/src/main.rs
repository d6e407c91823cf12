use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tools::{SimulateOptions, ToolError, check_report, filter_preview, load_config, load_registry};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::bootstrap::style_document;
use viewer::fetch::{DirFetcher, HttpFetcher};

#[derive(Parser, Debug)]
#[command(author, version, about = "Barcelona IMPD accessibility map tools")]
struct Args {
    /// Viewer configuration JSON (default: built-in Barcelona setup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layer registry JSON (default: built-in IMPD layers)
    #[arg(long)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the registry and list its layers in stacking order
    Check,

    /// Print a MapLibre style document for the configured map
    Style,

    /// Print the filter each layer would carry
    Filters {
        /// Checked categories (repeatable; default: all)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Range start, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Range end, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
    },

    /// Load every layer into a headless map and replay a session
    Simulate {
        /// Directory or http(s) base URL holding `<layer>.geojson` files
        /// (default: the configured data URL)
        #[arg(long)]
        data: Option<String>,

        /// Checked categories (repeatable; default: all)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Click the first feature of every layer
        #[arg(long)]
        click: bool,

        /// Run the date slider to its last day
        #[arg(long)]
        play: bool,

        /// Toggle rotation on for a viewport this many pixels wide
        #[arg(long)]
        rotate: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ToolError> {
    let config = load_config(args.config.as_deref())?;
    let registry = load_registry(args.registry.as_deref())?;

    match args.command {
        Command::Check => {
            print!("{}", check_report(&registry));
            info!("{} layers OK", registry.len());
        }
        Command::Style => {
            let doc = style_document(&config, &registry);
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::Filters {
            categories,
            start,
            end,
        } => {
            let categories = (!categories.is_empty()).then_some(categories);
            let preview = filter_preview(
                &config,
                &registry,
                categories.as_deref(),
                start.as_deref(),
                end.as_deref(),
            );
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Command::Simulate {
            data,
            categories,
            click,
            play,
            rotate,
        } => {
            let options = SimulateOptions {
                categories: (!categories.is_empty()).then_some(categories),
                click,
                play,
                rotate_width: rotate,
            };
            let data = data.unwrap_or_else(|| config.data_url.clone());
            info!("replaying with data from {data}");
            let report = if data.starts_with("http://") || data.starts_with("https://") {
                tools::simulate(config, registry, &HttpFetcher::new(data), &options).await?
            } else {
                tools::simulate(config, registry, &DirFetcher::new(data), &options).await?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
