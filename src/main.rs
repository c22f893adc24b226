//! renderlens CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use renderlens::{
    commands::{cmd_analyze, cmd_init, print_analysis, resolve_config_path, AnalyzeOptions, InitOptions},
    config::Config,
    error::Result,
    progress::LogWriterFactory,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "renderlens")]
#[command(version, about = "Classify how a web page is rendered: SSR, CSR or hybrid", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "RENDERLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the rendering strategy of a page
    Analyze {
        /// Page URL
        url: String,

        /// Analyze a rendered DOM saved from a browser instead of fetching
        #[arg(long, value_name = "FILE", conflicts_with = "render")]
        rendered_html: Option<PathBuf>,

        /// Render the page in headless Chrome (requires the js-rendering feature)
        #[arg(long)]
        render: bool,

        /// Skip the raw HTML vs rendered DOM comparison
        #[arg(long)]
        no_compare: bool,

        /// Collect page type, device, tech stack, SEO, hydration and navigation telemetry
        #[arg(long)]
        telemetry: bool,

        /// Submit the telemetry payload to the configured endpoint
        #[arg(long)]
        submit: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "renderlens", &mut std::io::stdout());
        }

        Commands::Init { force } => {
            let config_path = resolve_config_path(cli.config.as_deref());
            let written = cmd_init(&InitOptions { config_path, force })?;

            println!("✓ renderlens initialized");
            println!("  Config: {}", written.display());
            println!("\nNext steps:");
            println!("  1. Tune weights and thresholds under [detection]");
            println!("  2. Set [telemetry] endpoint to submit results");
            println!("  3. Analyze a page: renderlens analyze https://example.com");
        }

        Commands::Analyze {
            url,
            rendered_html,
            render,
            no_compare,
            telemetry,
            submit,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = AnalyzeOptions {
                url,
                rendered_html,
                render,
                compare: !no_compare,
                telemetry,
                submit,
            };

            let report = cmd_analyze(&config, options).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_analysis(&report);
            }
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; otherwise defaults apply when no
/// config has been written
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&resolve_config_path(Some(path))),
        None => Config::load_from(None),
    }
}
