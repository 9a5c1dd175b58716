use egui::{Color32, RichText, Sense, Stroke, Widget};
use reqwest::Url;
use roommap::{Explorer, api::ListingsApi, cards::RoomCard, provider::MapProvider};

use crate::map::overlay::resolve_link;

const ACTIVE_STROKE: Color32 = Color32::from_rgb(0xe5, 0x39, 0x35);

/// The cards of the current render cycle. Clicking one selects its listing on the map.
pub struct SidebarCards<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    explorer: &'a mut Explorer<A, P>,
    link_base: &'a Url,
}

impl<'a, A, P> SidebarCards<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    pub fn new(explorer: &'a mut Explorer<A, P>, link_base: &'a Url) -> Self {
        Self {
            explorer,
            link_base,
        }
    }
}

impl<A, P> Widget for SidebarCards<'_, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let explorer = self.explorer;
        let link_base = self.link_base;
        let mut selected = None;

        let response = ui
            .vertical(|ui| {
                let sync = explorer.sync();
                if let Some(placeholder) = sync.placeholder() {
                    ui.weak(placeholder);
                }

                for (index, card) in sync.cards().enumerate() {
                    let stroke = match sync.is_active(index) {
                        true => Stroke::new(2.0, ACTIVE_STROKE),
                        false => ui.visuals().widgets.noninteractive.bg_stroke,
                    };

                    let frame = egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.strong(&card.title);
                        ui.label(RichText::new(&card.price).strong().color(ACTIVE_STROKE));
                        ui.label(&card.location);
                        ui.horizontal(|ui| {
                            ui.weak(&card.meta);
                            ui.hyperlink_to(
                                "Book Now",
                                resolve_link(link_base, &card.booking_path),
                            );
                        });
                    });

                    if frame.response.interact(Sense::click()).clicked() {
                        selected = Some(index);
                    }
                }
            })
            .response;

        if let Some(index) = selected {
            explorer.select_card(index);
        }

        response
    }
}

/// Rooms with open slots, refreshable.
pub struct FindmatesPanel<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    explorer: &'a mut Explorer<A, P>,
}

impl<'a, A, P> FindmatesPanel<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    pub fn new(explorer: &'a mut Explorer<A, P>) -> Self {
        Self { explorer }
    }
}

impl<A, P> Widget for FindmatesPanel<'_, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let explorer = self.explorer;

        let inner = ui.vertical(|ui| {
            let refresh = ui
                .horizontal(|ui| {
                    ui.heading("Findmates");
                    ui.small_button("⟳").clicked()
                })
                .inner;

            match explorer.findmates() {
                None => {
                    ui.spinner();
                }
                Some([]) => {
                    ui.weak(explorer.findmates_empty_text());
                }
                Some(cards) => {
                    for card in cards {
                        room_card(ui, card);
                    }
                }
            }

            refresh
        });

        if inner.inner {
            explorer.load_findmates();
        }

        inner.response
    }
}

fn room_card(ui: &mut egui::Ui, card: &RoomCard) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.strong(&card.title);
            if card.verified {
                ui.label(RichText::new("✔ Verified").small().color(Color32::DARK_GREEN));
            }
        });
        ui.weak(&card.subtitle);
        ui.label(RichText::new(format!("{}/mo", card.price)).strong());
        ui.label(&card.amenities);
        ui.small(&card.capacity);
        ui.small(&card.owner);
    });
}
