use c6_updater::config::loader;
use c6_updater::pipeline::{InteractiveChooser, Pipeline, ProcessRunner, STORAGE_IMAGE};
use c6_updater::{UpdateError, UpdateOutcome};
use log::{error, info};
use std::process;

fn main() {
    // Logging first, so every later failure is visible through the same pipe
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== ESP32-C6 Firmware Updater ===");

    match run() {
        Ok(outcome) => {
            println!("\nUpdate complete!");
            println!(
                "The 'binaries/{}' file has been updated with version {}.",
                STORAGE_IMAGE, outcome.tag
            );
            println!("Run './flash_c6_firmware.sh' to flash it to your board.");
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn run() -> Result<UpdateOutcome, UpdateError> {
    let settings_path = loader::settings_path()?;
    let config = loader::load_or_default(&settings_path)?;
    info!("Mirror directory: {}", config.mirror_dir.display());

    let pipeline = Pipeline::new(config, ProcessRunner);
    pipeline.run(&InteractiveChooser)
}
