//! Markers and the popup, painted with the egui painter on top of the map texture.

use egui::{Align2, Color32, Pos2, Shape, Stroke, Vec2, pos2, vec2};
use reqwest::Url;
use roommap::provider::{MarkerId, MarkerStyle, PopupContent};

/// Clicks farther than this from every marker hit the map background.
pub const HIT_RADIUS: f32 = 16.0;

const PIN_RED: Color32 = Color32::from_rgb(0xe5, 0x39, 0x35);
const USER_BLUE: Color32 = Color32::from_rgb(0x1e, 0x88, 0xe5);
const DEAL_AMBER: Color32 = Color32::from_rgb(0xff, 0xb3, 0x00);

const PIN_HEAD_RADIUS: f32 = 9.0;
const PIN_HEIGHT: f32 = 22.0;
const USER_RADIUS: f32 = 8.0;
const DEAL_RADIUS: f32 = 12.0;

/// Center of the clickable part of a marker whose geographic anchor is drawn at `anchor`.
pub fn hit_point(style: MarkerStyle, anchor: Pos2) -> Pos2 {
    match style {
        MarkerStyle::Listing => anchor - vec2(0.0, PIN_HEIGHT - PIN_HEAD_RADIUS),
        MarkerStyle::UserLocation | MarkerStyle::FlashDeal => anchor,
    }
}

/// Screen offset from the anchor to the bottom edge of an attached popup.
fn popup_offset(style: MarkerStyle) -> Vec2 {
    match style {
        MarkerStyle::Listing => vec2(0.0, -PIN_HEIGHT - 6.0),
        MarkerStyle::UserLocation => vec2(0.0, -USER_RADIUS - 6.0),
        MarkerStyle::FlashDeal => vec2(0.0, -DEAL_RADIUS - 6.0),
    }
}

pub fn paint_marker(painter: &egui::Painter, style: MarkerStyle, anchor: Pos2, highlighted: bool) {
    let outline = match highlighted {
        true => Stroke::new(2.5, Color32::BLACK),
        false => Stroke::new(1.5, Color32::WHITE),
    };

    match style {
        MarkerStyle::Listing => {
            let head = hit_point(style, anchor);
            let half = PIN_HEAD_RADIUS * 0.8;
            painter.add(Shape::convex_polygon(
                vec![
                    head + vec2(-half, half * 0.6),
                    head + vec2(half, half * 0.6),
                    anchor,
                ],
                PIN_RED,
                Stroke::NONE,
            ));
            painter.circle_filled(head, PIN_HEAD_RADIUS, PIN_RED);
            painter.circle_stroke(head, PIN_HEAD_RADIUS, outline);
            painter.circle_filled(head, PIN_HEAD_RADIUS * 0.4, Color32::WHITE);
        }
        MarkerStyle::UserLocation => {
            painter.circle_filled(anchor, USER_RADIUS, USER_BLUE);
            painter.circle_stroke(anchor, USER_RADIUS, Stroke::new(3.0, Color32::WHITE));
        }
        MarkerStyle::FlashDeal => {
            painter.circle_filled(anchor, DEAL_RADIUS, DEAL_AMBER);
            painter.circle_stroke(anchor, DEAL_RADIUS, outline);
            painter.text(
                anchor,
                Align2::CENTER_CENTER,
                "⚡",
                egui::FontId::proportional(DEAL_RADIUS * 1.2),
                Color32::WHITE,
            );
        }
    }
}

/// Nearest marker to `pointer` within `radius`, measured from each marker's [`hit_point`].
pub fn hit_test<I>(markers: I, pointer: Pos2, radius: f32) -> Option<MarkerId>
where
    I: IntoIterator<Item = (MarkerId, MarkerStyle, Pos2)>,
{
    markers
        .into_iter()
        .map(|(id, style, anchor)| (id, hit_point(style, anchor).distance(pointer)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id)
}

/// Absolute URL of a popup or card link. Relative paths resolve against `base`.
pub fn resolve_link(base: &Url, href: &str) -> String {
    match base.join(href) {
        Ok(url) => url.to_string(),
        Err(err) => {
            log::debug!("[overlay] Keeping link {href} as is: {err}");
            href.to_string()
        }
    }
}

/// Draws the open popup above its marker, clamped to `bounds`. Returns `true` when its close
/// button was clicked.
pub fn show_popup(
    ctx: &egui::Context,
    bounds: egui::Rect,
    anchor: Pos2,
    style: Option<MarkerStyle>,
    content: &PopupContent,
    link_base: &Url,
) -> bool {
    let bottom = match style {
        Some(style) => anchor + popup_offset(style),
        None => anchor,
    };

    let mut closed = false;
    egui::Area::new(egui::Id::new("map_popup"))
        .order(egui::Order::Foreground)
        .pivot(Align2::CENTER_BOTTOM)
        .fixed_pos(bottom)
        .constrain_to(bounds)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(240.0);
                ui.horizontal(|ui| {
                    ui.strong(&content.title);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        closed = ui.small_button("✕").clicked();
                    });
                });
                for line in &content.lines {
                    ui.label(line);
                }
                if !content.links.is_empty() {
                    ui.horizontal(|ui| {
                        for link in &content.links {
                            let url = resolve_link(link_base, &link.href);
                            if link.primary {
                                let button =
                                    egui::Button::new(egui::RichText::new(&link.label).strong())
                                        .fill(PIN_RED);
                                if ui.add(button).clicked() {
                                    ui.ctx().open_url(egui::OpenUrl::new_tab(url));
                                }
                            } else {
                                ui.hyperlink_to(&link.label, url);
                            }
                        }
                    });
                }
            });
        });

    closed
}

pub fn to_pos(pixel: geo_types::Coord<f64>, origin: Pos2) -> Pos2 {
    pos2(origin.x + pixel.x as f32, origin.y + pixel.y as f32)
}
