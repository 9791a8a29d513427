//! TNS Redirect Proxy Command Line Tool
//!
//! This binary is the command-line interface for TNS Redirect Proxy.

use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

use tns_redirect_proxy::common::{init_logger, Result};
use tns_redirect_proxy::config::{validate_config, ConfigLoader, ConfigOverrides, ProxyConfig};
use tns_redirect_proxy::{Proxy, APP_NAME, VERSION};

/// TNS Redirect Proxy: transparent TNS proxy that follows backend redirects
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Load configuration from a JSON file (defaults to config.json if present)
    #[clap(long, env = "TNS_PROXY_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Listen host
    #[clap(long)]
    host: Option<String>,

    /// Listen port
    #[clap(short, long)]
    port: Option<u16>,

    /// Session timeout; sessions end after timeout/2 idle poll rounds
    #[clap(short, long)]
    timeout: Option<u64>,

    /// Backend address (host:port). Repeatable; only the first is used
    #[clap(short, long = "backend")]
    backends: Vec<String>,

    /// Poll interval of one forwarding round in milliseconds
    #[clap(long)]
    poll_interval_ms: Option<u64>,

    /// Backend connect timeout in seconds
    #[clap(long)]
    connect_timeout: Option<u64>,

    /// Read each packet payload until its declared length
    #[clap(long)]
    strict_framing: bool,

    /// Log level
    #[clap(long)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            timeout: args.timeout,
            backends: args.backends,
            poll_interval_ms: args.poll_interval_ms,
            connect_timeout: args.connect_timeout,
            strict_framing: args.strict_framing,
            log_level: args.log_level,
            log_file: args.log_file,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let config = ProxyConfig::load(args.config_file.as_deref())?
        .apply(ConfigOverrides::from(args))?;

    init_logger(&config.log_level, config.log_file.as_deref())?;

    info!("Starting {} v{}", APP_NAME, VERSION);

    validate_config(&config)?;

    if let Ok(json) = serde_json::to_string(&config) {
        debug!("Effective configuration: {}", json);
    }
    info!("Session timeout: {} ({} idle rounds)", config.timeout, config.idle_round_limit());

    let proxy = Proxy::new(Arc::new(config));

    info!("Proxy service ready, press Ctrl+C to stop");

    // Run proxy service
    proxy.run().await?;

    Ok(())
}
