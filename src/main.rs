/// Main entry point for the GNews MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gnews_mcp::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use gnews_mcp::{GNewsConfig, GNewsServer};

/// Command line arguments for the GNews MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GNews API key
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Root URL of the GNews API
    #[arg(long, env = "GNEWS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout for each GNews request, in seconds
    #[arg(long, env = "GNEWS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gnews_mcp={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Send logs to stderr, not stdout
        .init();

    info!("Starting GNews MCP server");

    let config = GNewsConfig::new(args.api_key, &args.base_url, args.timeout_secs)?;

    // Reference data is loaded here; a failure aborts startup
    let server = GNewsServer::new(config)?;

    // Run the MCP server - this will handle JSON-RPC communication over stdin/stdout
    server.run().await?;

    info!("GNews MCP server shutdown complete");
    Ok(())
}
