//! galileo renders into an offscreen wgpu texture which egui paints as an image.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use egui::load::SizedTexture;
use galileo::{
    Messenger,
    control::{MouseButton, RawUserEvent},
    render::WgpuRenderer,
};
use galileo_types::cartesian::{Point2, Size};
use roommap::provider::ProviderError;

use crate::map::Map;

/// Wheel deltas in points per zoom step.
const POINTS_PER_WHEEL_STEP: f64 = 40.0;

/// Raised by galileo whenever the map content changed, consumed once per frame.
#[derive(Debug, Clone)]
pub struct RedrawRequest {
    pending: Arc<AtomicBool>,
    ctx: egui::Context,
}

impl RedrawRequest {
    fn new(ctx: egui::Context) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(true)),
            ctx,
        }
    }

    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Messenger for RedrawRequest {
    fn request_redraw(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.ctx.request_repaint();
        }
    }
}

/// The renderer's texture as registered with egui.
struct Target {
    id: egui::TextureId,
    view: wgpu::TextureView,
    size: egui::Vec2,
}

impl Target {
    fn register(render_state: &egui_wgpu::RenderState, renderer: &WgpuRenderer) -> Option<Self> {
        let view = renderer.get_target_texture_view()?;
        let size = renderer.size();
        let id = render_state.renderer.write().register_native_texture(
            &render_state.device,
            &view,
            wgpu::FilterMode::Linear,
        );

        Some(Self {
            id,
            view,
            size: egui::vec2(size.width() as f32, size.height() as f32),
        })
    }

    fn release(self, render_state: &egui_wgpu::RenderState) {
        render_state.renderer.write().free_texture(&self.id);
    }
}

pub struct EguiMapState {
    map: Map,
    renderer: WgpuRenderer,
    render_state: egui_wgpu::RenderState,
    target: Target,
    redraw: RedrawRequest,
}

impl EguiMapState {
    pub fn new(
        ctx: egui::Context,
        render_state: egui_wgpu::RenderState,
        mut map: Map,
    ) -> Result<Self, ProviderError> {
        let redraw = RedrawRequest::new(ctx);
        map.set_messenger(redraw.clone());

        // The real size is only known once the central panel is laid out.
        let initial = Size::new(1, 1);
        map.map_mut().set_size(initial.cast());
        let renderer = WgpuRenderer::new_with_device_and_texture(
            render_state.device.clone(),
            render_state.queue.clone(),
            initial,
        );
        let target = Target::register(&render_state, &renderer)
            .ok_or_else(|| ProviderError::Backend("map renderer has no target".to_string()))?;

        Ok(Self {
            map,
            renderer,
            render_state,
            target,
            redraw,
        })
    }

    /// Fills the available space with the map and feeds it the pointer input over it.
    pub fn render(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        if response.contains_pointer() {
            // galileo may request a repaint while handling, so the input lock is released first.
            let origin = rect.min.to_vec2();
            let events = ui.input(|input| input.events.clone());
            events
                .iter()
                .filter_map(|event| to_raw_event(event, origin))
                .for_each(|event| self.map.handle_event(event));
        }

        self.map.map_mut().animate();

        if rect.size() != self.target.size {
            self.resize(rect.size());
        }
        if self.redraw.take() {
            self.draw();
        }

        egui::Image::from_texture(SizedTexture::new(self.target.id, self.target.size))
            .paint_at(ui, rect);

        response
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    fn resize(&mut self, size: egui::Vec2) {
        log::trace!("[map] Resizing to {size:?}");

        self.map
            .map_mut()
            .set_size(Size::new(size.x as f64, size.y as f64));
        self.renderer
            .resize(Size::new(size.x.max(1.0) as u32, size.y.max(1.0) as u32));

        match Target::register(&self.render_state, &self.renderer) {
            Some(target) => std::mem::replace(&mut self.target, target).release(&self.render_state),
            None => log::error!("[map] Renderer lost its target while resizing"),
        }

        self.map.redraw();
    }

    fn draw(&mut self) {
        let map = self.map.map();
        map.load_layers();
        self.renderer.render_to_texture_view(map, &self.target.view);
    }
}

fn mouse_button(button: egui::PointerButton) -> MouseButton {
    match button {
        egui::PointerButton::Primary => MouseButton::Left,
        egui::PointerButton::Secondary => MouseButton::Right,
        egui::PointerButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

/// Translates an egui input event into map coordinates relative to `origin`.
fn to_raw_event(event: &egui::Event, origin: egui::Vec2) -> Option<RawUserEvent> {
    match event {
        egui::Event::PointerButton {
            button, pressed, ..
        } => {
            let button = mouse_button(*button);
            Some(if *pressed {
                RawUserEvent::ButtonPressed(button)
            } else {
                RawUserEvent::ButtonReleased(button)
            })
        }
        egui::Event::PointerMoved(position) => {
            let local = *position - origin;
            Some(RawUserEvent::PointerMoved(Point2::new(
                local.x as f64,
                local.y as f64,
            )))
        }
        egui::Event::MouseWheel { unit, delta, .. } => {
            let steps = match unit {
                egui::MouseWheelUnit::Point => delta.y as f64 / POINTS_PER_WHEEL_STEP,
                egui::MouseWheelUnit::Line => delta.y as f64,
                egui::MouseWheelUnit::Page => delta.y as f64 * 3.0,
            };
            (steps.abs() >= 1e-4).then_some(RawUserEvent::Scroll(steps))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn pointer_positions_are_relative_to_the_map() {
        let event = egui::Event::PointerMoved(egui::pos2(420.0, 130.0));

        match to_raw_event(&event, egui::vec2(360.0, 30.0)) {
            Some(RawUserEvent::PointerMoved(point)) => assert_eq!(point, Point2::new(60.0, 100.0)),
            _ => panic!("expected a pointer move"),
        }
    }

    #[test]
    fn touchpad_scrolling_is_scaled_down() {
        let wheel = |unit, y| egui::Event::MouseWheel {
            unit,
            delta: egui::vec2(0.0, y),
            modifiers: egui::Modifiers::NONE,
        };

        match to_raw_event(&wheel(egui::MouseWheelUnit::Point, 80.0), egui::Vec2::ZERO) {
            Some(RawUserEvent::Scroll(steps)) => assert_relative_eq!(steps, 2.0),
            _ => panic!("expected a scroll"),
        }
        match to_raw_event(&wheel(egui::MouseWheelUnit::Line, -1.0), egui::Vec2::ZERO) {
            Some(RawUserEvent::Scroll(steps)) => assert_relative_eq!(steps, -1.0),
            _ => panic!("expected a scroll"),
        }
        assert!(to_raw_event(&wheel(egui::MouseWheelUnit::Line, 0.0), egui::Vec2::ZERO).is_none());
    }
}
