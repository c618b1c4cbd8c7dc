use std::{error::Error, net::SocketAddr, process, sync::Arc, time::Duration};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, LevelFilter};
use url::Url;

use ynison_proxy::{
    catalog::{Catalog, YandexCatalog},
    config::Config,
    server::{self, AppState},
    websocket::Tungstenite,
    ynison,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, value_name = "ADDR", env = "YNISON_PROXY_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Ynison redirector endpoint
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url, env = "YNISON_PROXY_REDIRECTOR_URL", default_value = Config::REDIRECTOR_URL)]
    redirector_url: Url,

    /// Catalog API base URL
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url, env = "YNISON_PROXY_CATALOG_URL", default_value = Config::CATALOG_URL)]
    catalog_url: Url,

    /// `Origin` header presented to Ynison
    #[arg(long, env = "YNISON_PROXY_ORIGIN", default_value = Config::ORIGIN)]
    origin: String,

    /// Timeout in seconds
    ///
    /// Bounds every WebSocket connect and every wait for a reply.
    #[arg(short, long, value_name = "SECS", env = "YNISON_PROXY_TIMEOUT", default_value_t = Config::TIMEOUT.as_secs())]
    timeout: u64,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose` is 0
                // by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Builds the application and serves it until shut down.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the listening
/// socket cannot be bound.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.timeout == 0 {
        return Err("timeout must be at least one second".into());
    }

    let mut config = Config::new(args.redirector_url, args.catalog_url);
    config.origin = args.origin;
    config.timeout = Duration::from_secs(args.timeout);
    debug!("{config:#?}");

    let catalog: Arc<dyn Catalog> = Arc::new(YandexCatalog::new(&config)?);
    let ynison = ynison::Client::new(&config, Arc::new(Tungstenite))?;
    let router = server::router(Arc::new(AppState { ynison, catalog }));

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("listening on {}", listener.local_addr()?);

    server::serve(listener, router).await?;
    Ok(())
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and starts serving.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
