//! servicebot entry point

use servicebot::Config;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("servicebot v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: servicebot [CONFIG_FILE]");
        println!();
        println!("CONFIG_FILE defaults to $SERVICEBOT_CONFIG, then ./config.json.");
        println!();
        println!("Environment variables:");
        println!("  SERVICEBOT_CONFIG  Path to the JSON config file");
        println!("  RUST_LOG           Log level override (trace..error)");
        return Ok(());
    }

    let config_path = Config::resolve_path(args.get(1).map(String::as_str));
    let config = Config::load(&config_path)?;

    // RUST_LOG wins over the config file's verbosity flag.
    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(if config.is_verbose { Level::DEBUG } else { Level::INFO });

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("servicebot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Config: {:?}", config_path);

    servicebot::telegram::run_bot(config).await
}
