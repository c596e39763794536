//! ep - execute typed HTTP calls from the command line

use std::error::Error;
use std::fmt::Debug;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use endpoints::response::{JsonFormat, ResponseFormat, TextFormat};
use endpoints::{
    CachePolicy, Call, CallError, CallExecutor, CallOutput, RestMethod, Session, SessionConfig,
};
use serde_json::Value;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "ep")]
#[command(about = "Execute an HTTP call with optional offline-cache fallback", long_about = None)]
struct Cli {
    /// Path relative to the base URL (e.g. "/get")
    #[arg(value_name = "PATH")]
    path: String,

    /// Base URL calls are resolved against [default: $ENDPOINTS_BASE_URL]
    #[arg(short = 'b', long, value_name = "URL")]
    base_url: Option<Url>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET", value_name = "METHOD")]
    method: RestMethod,

    /// Query parameter (repeatable: -q a=1 -q b=2)
    #[arg(short = 'q', long = "query", value_name = "NAME=VALUE", value_parser = parse_query)]
    query: Vec<(String, String)>,

    /// Request header (repeatable: -H "Accept: text/plain")
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Request body
    #[arg(short = 'd', long, value_name = "DATA")]
    data: Option<String>,

    /// How to parse and print the response body
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Serve a stored response when the origin cannot be reached
    #[arg(long)]
    offline_cache: bool,

    /// Cache policy (normal, reload-ignoring-cache, return-cache-else-load, return-cache-only)
    #[arg(long, default_value = "normal", value_name = "POLICY")]
    cache_policy: CachePolicy,

    /// Request timeout in seconds [default: $ENDPOINTS_TIMEOUT_SECS or 30]
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase verbosity (-v, -vv dumps requests and responses, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Parse as JSON and pretty-print
    Json,
    /// Decode as text using the response charset
    Text,
}

fn parse_query(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    Ok((name.to_string(), value.to_string()))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `NAME: VALUE`, got `{raw}`"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Initialize tracing subscriber based on verbosity level
fn init_tracing(verbose: u8, json: bool) {
    // Default (verbose=0) shows only WARN; offline-cache notices are warnings
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,endpoints=info".to_string(),
            2 => "info,endpoints=debug".to_string(),
            _ => "debug,endpoints=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

/// Printable form of a parsed response body.
trait Render {
    fn render(&self) -> String;
}

impl Render for Value {
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_string())
    }
}

impl Render for String {
    fn render(&self) -> String {
        self.clone()
    }
}

fn print_output<T: Render>(output: &CallOutput<T>) {
    eprintln!("{} ({})", output.response.status(), output.source);
    println!("{}", output.value.render());
}

/// Prints an error and its causes to stderr.
fn report(err: &dyn Error) {
    eprintln!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn session_from(cli: &Cli) -> Result<Session, Box<dyn Error>> {
    let mut config = SessionConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if cli.log_verbosity >= 2 {
        config.debug = true;
    }
    Ok(Session::from_config(&config)?)
}

async fn execute<F>(session: &Session, cli: &Cli) -> ExitCode
where
    F: ResponseFormat,
    F::Output: Render + Debug,
{
    let mut builder = Call::<F>::builder().method(cli.method).path(cli.path.as_str());
    for (name, value) in &cli.query {
        builder = builder.query(name.as_str(), value.as_str());
    }
    for (name, value) in &cli.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(data) = &cli.data {
        builder = builder.body(data.clone().into_bytes());
    }
    let call = builder.build();

    match session.call(&call, cli.cache_policy, cli.offline_cache).await {
        Ok(output) => {
            print_output(&output);
            ExitCode::SUCCESS
        }
        Err(CallError::NoResponseWithCache { cached, cause }) => {
            tracing::warn!(error = %cause, "Origin unreachable, showing stored response");
            eprintln!("warning: origin failed ({cause}); showing stored response");
            print_output(&*cached);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    let session = match session_from(&cli) {
        Ok(session) => session,
        Err(e) => {
            report(e.as_ref());
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(base_url = %session.base_url(), "Session ready");

    match cli.format {
        OutputFormat::Json => execute::<JsonFormat<Value>>(&session, &cli).await,
        OutputFormat::Text => execute::<TextFormat>(&session, &cli).await,
    }
}
