use anyhow::Context;
use hyprbt::{App, Config, Flags};
use hyprbt_core::ProgramOptions;
use std::process::ExitCode;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hyprbt: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env();
    hyprbt::config::init_logging(config.log_file.as_deref())?;
    for issue in &config.rejected {
        warn!("{issue}");
    }
    info!(
        bluetoothctl = %config.bluetoothctl.display(),
        scan_window = ?config.scan_window,
        "starting"
    );

    let options = ProgramOptions {
        mouse_capture: true,
        title: Some("hyprbt".into()),
        ..ProgramOptions::default()
    };
    hyprbt_core::run_with::<App>(Flags::from(&config), options)
        .await
        .context("terminal UI failed")?;

    info!("exiting");
    Ok(())
}
