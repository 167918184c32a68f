//! Perplexity-RS: Perplexity Sonar search as MCP tools
//!
//! This is the main entry point for the application.

use anyhow::{bail, Context, Result};
use perplexity_rs::{
    config,
    network::PerplexityClient,
    search::{Search, SearchParams},
    server::{serve_http, serve_stdio, McpHandler, ToolDispatcher},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    http: bool,
    query: Option<String>,
}

enum Command {
    Run(Options),
    Help,
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        Command::Run(options) => options,
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            println!("perplexity-rs {}", perplexity_rs::VERSION);
            return Ok(());
        }
    };

    // Logs go to stderr; stdout carries the MCP stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Perplexity-RS v{}", perplexity_rs::VERSION);

    // Load configuration
    let settings = Arc::new(config::load(options.config.clone())?);
    info!(
        "Default model {}, pro model {}, caching {}",
        settings.search.default_model,
        settings.search.pro_model,
        if settings.results_root().is_some() { "enabled" } else { "disabled" }
    );

    // Initialize HTTP client
    let client = PerplexityClient::with_settings(&settings.api)?;
    let search = Arc::new(Search::new(client, settings.clone()));

    if let Some(query) = options.query {
        let text = search.search(SearchParams::new(query)).await?;
        println!("{}", text);
        return Ok(());
    }

    let handler = McpHandler::new(ToolDispatcher::new(search));

    if options.http {
        let addr = SocketAddr::new(
            settings
                .server
                .bind_address
                .parse()
                .with_context(|| format!("invalid bind address '{}'", settings.server.bind_address))?,
            settings.server.port,
        );
        serve_http(handler, addr).await
    } else {
        serve_stdio(handler).await
    }
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Command> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--http" => options.http = true,
            "-c" | "--config" => {
                let path = args.next().context("--config requires a file path")?;
                options.config = Some(PathBuf::from(path));
            }
            "-q" | "--query" => {
                let query = args.next().context("--query requires a query string")?;
                options.query = Some(query);
            }
            other => bail!("unknown argument '{}' (see --help)", other),
        }
    }

    Ok(Command::Run(options))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Perplexity-RS v{}
Perplexity Sonar search exposed as MCP tools

USAGE:
    perplexity-rs [OPTIONS]

OPTIONS:
    -c, --config <FILE>    Path to a YAML settings file
        --http             Serve MCP over HTTP instead of stdio
    -q, --query <TEXT>     Run one search, print the result and exit
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    PERPLEXITY_API_KEY               API key (required)
    PERPLEXITY_API_URL               Chat completions endpoint
    PERPLEXITY_SETTINGS_PATH         Path to a YAML settings file
    PERPLEXITY_DEFAULT_MODEL         Model for general search (sonar)
    PERPLEXITY_PRO_MODEL             Model for specialized searches (sonar-pro)
    PERPLEXITY_MAX_TOKENS            Default max tokens (1024)
    PERPLEXITY_TEMPERATURE           Default temperature, 0-2 (0.2)
    PERPLEXITY_TOP_P                 Default top-p, 0-1 (0.9)
    PERPLEXITY_TOP_K                 Default top-k, 0 disables (0)
    PERPLEXITY_TIMEOUT               Request timeout, e.g. 30s (30s)
    PERPLEXITY_RETURN_IMAGES         Return images by default (false)
    PERPLEXITY_RETURN_RELATED        Return related questions by default (false)
    PERPLEXITY_RESULTS_ROOT_FOLDER   Enable the result cache in this folder
    PERPLEXITY_BIND_ADDRESS          HTTP bind address (127.0.0.1)
    PERPLEXITY_PORT                  HTTP port (8808)
    RUST_LOG                         Log filter (info)
"#,
        perplexity_rs::VERSION
    );
}
