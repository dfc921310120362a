use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::sync::Arc;

use modista::core::config::{self, ModistaConfig};
use modista::core::storage::{DisabledStorage, FileStorage, Storage};
use modista::tui;

#[derive(Parser)]
#[command(name = "modista", about = "Terminal client for the Modista fashion assistant")]
struct Args {
    /// Backend address, e.g. http://localhost:8000
    #[arg(long)]
    base_url: Option<String>,

    /// Username to pre-fill in the login form
    #[arg(short, long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to modista.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("modista.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}. Using defaults.");
            warn!("Config error: {}", e);
            ModistaConfig::default()
        }
    };
    let resolved = config::resolve(&file_config, args.base_url.as_deref(), args.username.as_deref());
    info!("Modista starting up against {}", resolved.base_url);

    let storage: Arc<dyn Storage> = match resolved.storage_dir.as_ref().map(FileStorage::open) {
        Some(Ok(storage)) => {
            info!("Storage at {}", storage.dir().display());
            Arc::new(storage)
        }
        Some(Err(e)) => {
            warn!("Storage unavailable ({}), nothing will be persisted", e);
            Arc::new(DisabledStorage)
        }
        None => {
            warn!("No home directory, nothing will be persisted");
            Arc::new(DisabledStorage)
        }
    };

    tui::run(resolved, storage)
}
