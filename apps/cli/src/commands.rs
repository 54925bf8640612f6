//! CLI command definitions, routing, and tracing setup.

use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use harvestdoc_export::ExportFormat;
use harvestdoc_server::ServerState;
use harvestdoc_shared::{AppConfig, TransportPolicy, load_config, load_config_from};
use harvestdoc_source::CatalogSource;
use tracing::info;

const EXAMPLES: &str = "\
Examples:

  Export a CSV file.

    harvestdoc http://harvest.research.chop.edu/demo/api/ > demo.csv

  Serve exports over HTTP.

    harvestdoc http --port 8080";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// harvestdoc: pull down Harvest concept data and export it.
#[derive(Parser)]
#[command(
    name = "harvestdoc",
    version,
    about = "Pull down Harvest concept data and export it as CSV.",
    long_about = None,
    arg_required_else_help = true,
    after_help = EXAMPLES,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.harvestdoc/harvestdoc.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub export: ExportArgs,
}

/// Arguments of the default (export) command.
#[derive(Args)]
pub(crate) struct ExportArgs {
    /// Export format.
    #[arg(long, default_value = "csv")]
    pub format: ExportFormat,

    /// API token if authorization is required.
    #[arg(long, env = "HARVESTDOC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Harvest API endpoint or path to a concepts JSON file.
    pub target: Option<String>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve exports over HTTP (`POST /` with {"url", "token"}).
    Http {
        /// Interface to bind (overrides the config file).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries the export.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "harvestdoc=info",
        1 => "harvestdoc=debug",
        _ => "harvestdoc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Some(Command::Http { host, port }) => cmd_http(&config, host, port).await,
        None => {
            let ExportArgs {
                format,
                token,
                target,
            } = cli.export;

            let Some(target) = target else {
                Cli::command()
                    .error(
                        clap::error::ErrorKind::MissingRequiredArgument,
                        "an endpoint URL or concepts file is required",
                    )
                    .exit();
            };

            cmd_export(&config, &target, token.as_deref(), format).await
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_export(
    config: &AppConfig,
    target: &str,
    token: Option<&str>,
    format: ExportFormat,
) -> Result<()> {
    let policy = TransportPolicy::from(config);
    let source = CatalogSource::from_target(target, token, &policy)?;

    info!(source = %source.describe(), %format, "exporting catalog");

    let stdout = io::stdout();
    let summary = harvestdoc_core::export(&source, format, stdout.lock()).await?;

    info!(
        concepts = summary.concepts,
        rows = summary.rows,
        "export written to stdout"
    );

    Ok(())
}

async fn cmd_http(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let state = ServerState {
        policy: TransportPolicy::from(config),
    };

    info!(%addr, "starting HTTP service");
    println!("Serving exports on http://{addr}/");

    harvestdoc_server::serve(&addr, state)
        .await
        .map_err(|e| eyre!("HTTP service on {addr} failed: {e}"))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_export_target() {
        let cli = Cli::try_parse_from([
            "harvestdoc",
            "--format",
            "csv",
            "--token",
            "abc",
            "http://harvest.example.org/demo/api/",
        ])
        .expect("parse");

        assert!(cli.command.is_none());
        assert_eq!(cli.export.format, ExportFormat::Csv);
        assert_eq!(cli.export.token.as_deref(), Some("abc"));
        assert_eq!(
            cli.export.target.as_deref(),
            Some("http://harvest.example.org/demo/api/")
        );
    }

    #[test]
    fn parses_file_target_with_equals_flags() {
        let cli = Cli::try_parse_from(["harvestdoc", "--format=csv", "concepts.json"]).expect("parse");
        assert_eq!(cli.export.target.as_deref(), Some("concepts.json"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["harvestdoc", "--format", "xlsx", "concepts.json"]).is_err());
    }

    #[test]
    fn parses_http_subcommand() {
        let cli = Cli::try_parse_from(["harvestdoc", "http", "--host", "0.0.0.0", "--port", "9000"])
            .expect("parse");

        match cli.command {
            Some(Command::Http { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            None => panic!("expected http subcommand"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["harvestdoc", "http", "-vv", "--log-format", "json"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[tokio::test]
    async fn export_reports_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/concepts/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let target = format!("{}/api", server.uri());
        let err = cmd_export(&AppConfig::default(), &target, None, ExportFormat::Csv)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("client: 404 Not Found"));
    }

    #[tokio::test]
    async fn export_rejects_malformed_url() {
        let err = cmd_export(&AppConfig::default(), "http://exa mple.com", None, ExportFormat::Csv)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid endpoint"));
    }
}
