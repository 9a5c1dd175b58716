use std::{error::Error, fmt::Display, time::Duration};

use eframe::CreationContext;
use egui::Frame;
use map::{
    MapInteraction, MapSurface,
    provider::{GalileoProvider, HostedTiles, OpenTiles},
};
use reqwest::Url;
use roommap::{
    Config, Explorer, MapState,
    api::{ApiError, HttpListingsApi},
    config::ConfigError,
    events::EventHandler,
    geolocation::GeolocationSource,
    provider::ProviderKind,
};
use tokio::runtime::{Handle, Runtime};
use widgets::modals::AlertModal;

pub mod cli;
pub mod map;
pub mod widgets;

/// Background results are picked up at least this often.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct RoomMapApp {
    explorer: Explorer<HttpListingsApi, dyn MapSurface>,
    events: EventHandler,
    link_base: Url,
    alert: AlertModal,
    runtime: Runtime,
}

impl RoomMapApp {
    pub fn new(cc: &CreationContext<'_>, config: Config) -> Result<Self, AppError> {
        let runtime = Runtime::new().map_err(AppError::Runtime)?;
        let render_state = cc
            .wgpu_render_state
            .clone()
            .ok_or(AppError::NoRenderState)?;

        let link_base = config.api_base_url()?;
        let api = HttpListingsApi::new(link_base.clone())?;
        let geolocator = GeolocationSource::from_config(&config.geolocation)?;
        let surface = map_surface(
            &config,
            cc.egui_ctx.clone(),
            render_state,
            link_base.clone(),
            runtime.handle(),
        )?;

        let (mut explorer, events) = Explorer::new(
            api,
            surface,
            geolocator,
            &config,
            runtime.handle().clone(),
        );
        explorer.start();

        Ok(Self {
            explorer,
            events,
            link_base,
            alert: AlertModal::new("location_alert"),
            runtime,
        })
    }
}

fn map_surface(
    config: &Config,
    ctx: egui::Context,
    render_state: egui_wgpu::RenderState,
    link_base: Url,
    runtime: &Handle,
) -> Result<Box<dyn MapSurface>, AppError> {
    Ok(match config.provider_kind() {
        ProviderKind::OpenTiles => Box::new(GalileoProvider::new(
            OpenTiles::new(&config.tiles),
            ctx,
            render_state,
            &config.tiles,
            link_base,
        )),
        ProviderKind::Hosted => {
            let bootstrap = Url::parse(&config.hosted.bootstrap_url())
                .map_err(|err| ConfigError::InvalidUrl(format!("hosted bootstrap URL: {err}")))?;
            Box::new(GalileoProvider::new(
                HostedTiles::bootstrap(bootstrap, runtime),
                ctx,
                render_state,
                &config.tiles,
                link_base,
            ))
        }
    })
}

impl eframe::App for RoomMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let _rt_ctx = self.runtime.enter();

        if let Err(err) = self.events.handle_events(&mut self.explorer) {
            log::error!("[app] {err}");
        }

        egui::SidePanel::left("search_panel")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.add(widgets::SearchPanel::new(&mut self.explorer));
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add(widgets::SidebarCards::new(&mut self.explorer, &self.link_base));
                    ui.separator();
                    ui.add(widgets::FindmatesPanel::new(&mut self.explorer));
                });
            });

        egui::CentralPanel::default()
            .frame(Frame::new().inner_margin(0).outer_margin(0))
            .show(ctx, |ui| {
                if let MapState::Failed(message) = self.explorer.map_state() {
                    ui.centered_and_justified(|ui| {
                        ui.colored_label(ui.visuals().error_fg_color, message);
                    });
                    return;
                }

                match self.explorer.provider_mut().show(ui) {
                    Some(MapInteraction::MarkerClicked(marker)) => {
                        self.explorer.marker_clicked(marker)
                    }
                    Some(MapInteraction::BackgroundClicked) => self.explorer.map_clicked(),
                    None => (),
                }
            });

        if let Some(message) = self.explorer.alert() {
            if self.alert.show(ctx, "Location", message) {
                self.explorer.dismiss_alert();
            }
        }

        ctx.request_repaint_after(EVENT_POLL_INTERVAL);
    }
}

#[derive(Debug)]
pub enum AppError {
    Runtime(std::io::Error),
    NoRenderState,
    Config(ConfigError),
    Api(ApiError),
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Runtime(err) => Some(err),
            Self::NoRenderState => None,
            Self::Config(err) => Some(err),
            Self::Api(err) => Some(err),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Runtime(err) => write!(f, "Failed to start the async runtime: {err}"),
            Self::NoRenderState => write!(f, "The map needs the wgpu renderer"),
            Self::Config(err) => write!(f, "Invalid configuration: {err}"),
            Self::Api(err) => write!(f, "Listings API unavailable: {err}"),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}
