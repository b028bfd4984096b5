#![allow(clippy::too_many_arguments)]

use eframe::egui;
use retouch_studio::app::RetouchApp;
use retouch_studio::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        std::process::exit(cli::run(args));
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Retouch Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Retouch Studio",
        options,
        Box::new(|cc| Box::new(RetouchApp::new(cc))),
    )
}
