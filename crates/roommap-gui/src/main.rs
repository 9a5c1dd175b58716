use std::process::ExitCode;

use clap::Parser;
use roommap_gui::{RoomMapApp, cli::Cli};
use tracing_subscriber::layer::SubscriberExt;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish()
        .with(tracing_tracy::TracyLayer::default());

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the tracing subscriber: {err}");
    }
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Failed to forward log records: {err}");
    }

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };
    tracing::info!(
        "Listings API at {}, {} map provider",
        config.api_base,
        config.provider_kind()
    );

    let native_options = eframe::NativeOptions {
        renderer: eframe::Renderer::Wgpu,
        viewport: egui::ViewportBuilder::default()
            .with_title("RoomMap")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    match eframe::run_native(
        "RoomMap",
        native_options,
        Box::new(move |cc| Ok(Box::new(RoomMapApp::new(cc, config)?))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
