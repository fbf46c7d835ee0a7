use std::fs::File;
use std::sync::{Arc, Mutex};

use trust_layer_support::{log_error, log_info, App, SupportConfig};
use trust_layer_support::util::log::log_dir;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = match SupportConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log_error!("Failed to load support config: {}", e);
            return Err(e.into());
        }
    };
    log_info!("Starting support chat for {}", config.customer_name);

    let terminal = ratatui::init();
    let result = match App::new(config).await {
        Ok(app) => app.run(terminal).await,
        Err(e) => Err(e),
    };
    ratatui::restore();
    result
}

/// Spans go to `trace.log` next to the other logs; stdout belongs to the TUI.
fn init_tracing() {
    let dir = log_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    if let Ok(file) = File::create(dir.join("trace.log")) {
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
}
