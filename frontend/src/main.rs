mod app;

slint::include_modules!();

extern crate pretty_env_logger;
#[macro_use] extern crate log;

use std::path::Path;

use player::{ViewerConfig, DEFAULT_CONFIG_FILE};

fn main() -> Result<(), slint::PlatformError> {
    pretty_env_logger::init();

    info!("Starting forecast viewer...");

    let main_window = MainWindow::new()?;

    let config = match ViewerConfig::load(Path::new(DEFAULT_CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to read {}: {}", DEFAULT_CONFIG_FILE, e);
            main_window.set_error_message(format!("Ignoring {}: {}", DEFAULT_CONFIG_FILE, e).into());
            ViewerConfig::default()
        }
    };

    let viewer = app::viewer::build_viewer(&main_window, &config);
    app::viewer::setup_viewer_callbacks(&main_window, &viewer);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| slint::PlatformError::Other(format!("Failed to start runtime: {}", e)))?;

    let loader = config.manifest_loader();
    match rt.block_on(loader.load()) {
        Ok(manifest) => {
            info!(
                "Manifest loaded: {} cycles, {} hours",
                manifest.cycles().len(),
                manifest.hours().len()
            );
            app::viewer::load_manifest(&main_window, &viewer, manifest);
        }
        Err(e) => {
            error!("Failed to load manifest: {}", e);
            viewer.borrow_mut().fail(e.to_string());
        }
    }

    main_window.set_loading(false);

    main_window.run()
}
