//! ==============================================================================
//! main.rs - cpu temperature logger entry point
//! ==============================================================================
//!
//! purpose:
//!     samples the raspberry pi cpu temperature once per interval and appends
//!     `timestamp,value` lines to a csv file, forever.
//!
//! responsibilities:
//!     - load configuration (config/sampler.toml, all fields optional)
//!     - install the tracing subscriber
//!     - wire ctrl-c to the shutdown token
//!     - run the sampler loop and propagate its failure as the exit status
//!
//! relationships:
//!     - uses: config.rs (SamplerConfig)
//!     - uses: sampler.rs (the loop itself)
//!     - uses: shutdown.rs (ctrl-c -> stop)
//!
//! architecture:
//!
//!     ┌──────────────┐   stdout    ┌─────────┐   line    ┌───────────────┐
//!     │ vcgencmd     │ ──────────> │ sampler │ ────────> │ cpu_temp.csv  │
//!     │ measure_temp │             │ (1s)    │           └───────────────┘
//!     └──────────────┘             └────┬────┘
//!                                       │ optional
//!                                       ▼
//!                                ┌──────────────┐
//!                                │ cpu_temp.svg │
//!                                └──────────────┘
//!
//! ==============================================================================

mod config;
mod csv_log;
mod domain;
mod plot;
mod sampler;
mod sensor;
mod shutdown;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  CPU Temperature Logger");
    println!("===========================================================");

    // step 1: load configuration
    // the subscriber is not up yet, so config loading logs go nowhere unless
    // we install a provisional filter first
    let config = {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt().with_env_filter(EnvFilter::new("info")).finish(),
        );
        config::SamplerConfig::load_or_default()
    };

    // step 2: logging (RUST_LOG wins over the config file)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    config.summary();

    // step 3: ctrl-c stops the loop between samples
    let (handle, token) = shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("ctrl-c received, stopping");
                handle.trigger();
            }
            Err(e) => tracing::warn!("cannot listen for ctrl-c: {}", e),
        }
    });

    // step 4: polling loop
    let mut sampler = sampler::Sampler::from_config(&config);
    tracing::info!("starting sensor polling ({}ms interval)", config.polling.interval_ms);

    match sampler.run(token).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("fatal: {:#}", e);
            Err(e)
        }
    }
}
