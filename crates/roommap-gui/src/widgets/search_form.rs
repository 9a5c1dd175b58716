use std::ops::RangeInclusive;

use egui::{ComboBox, Key, Slider, TextEdit, Widget};
use roommap::{
    Explorer, api::ListingsApi, filter::SortOrder, provider::MapProvider, search::SearchStatus,
};

const BUDGET_RANGE: RangeInclusive<u32> = 2_000..=50_000;
const BUDGET_STEP: f64 = 500.0;

/// Query box, filters and map actions of the left panel.
pub struct SearchPanel<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    explorer: &'a mut Explorer<A, P>,
}

impl<'a, A, P> SearchPanel<'a, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    pub fn new(explorer: &'a mut Explorer<A, P>) -> Self {
        Self { explorer }
    }
}

impl<A, P> Widget for SearchPanel<'_, A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let explorer = self.explorer;

        ui.vertical(|ui| {
            ui.heading("Find a room");

            ui.horizontal(|ui| {
                let mut query = explorer.form().query.clone();
                let input = ui.add(
                    TextEdit::singleline(&mut query)
                        .hint_text("Area, college or property")
                        .desired_width(ui.available_width() - 70.0),
                );
                if input.changed() {
                    explorer.on_query_input(query);
                }
                let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                if ui.button("Search").clicked() || submitted {
                    explorer.execute_search();
                }
            });

            completions(ui, explorer);

            ui.horizontal(|ui| {
                let current = explorer.form().property_type.clone();
                let mut picked = None;
                ComboBox::from_id_salt("property_type")
                    .selected_text(match current.as_str() {
                        "" => "All types",
                        other => other,
                    })
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(current.is_empty(), "All types").clicked() {
                            picked = Some(String::new());
                        }
                        for property_type in explorer.property_types() {
                            if ui
                                .selectable_label(current == *property_type, property_type)
                                .clicked()
                            {
                                picked = Some(property_type.clone());
                            }
                        }
                    });
                if let Some(property_type) = picked.filter(|picked| *picked != current) {
                    explorer.on_property_type_changed(property_type);
                }

                let sort = explorer.form().sort;
                let mut picked = sort;
                ComboBox::from_id_salt("sort")
                    .selected_text(sort.label())
                    .show_ui(ui, |ui| {
                        for order in SortOrder::ALL {
                            ui.selectable_value(&mut picked, order, order.label());
                        }
                    });
                if picked != sort {
                    explorer.on_sort_changed(picked);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Max budget");
                ui.strong(explorer.budget_label());
            });
            let mut budget = explorer
                .form()
                .budget
                .unwrap_or(roommap::filter::DEFAULT_BUDGET);
            let slider = ui.add(
                Slider::new(&mut budget, BUDGET_RANGE)
                    .step_by(BUDGET_STEP)
                    .show_value(false),
            );
            // Dragging only moves the label, the release searches.
            if slider.changed() {
                explorer.on_budget_input(budget);
            }
            if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
                explorer.on_budget_changed(budget);
            }

            let mut include_unverified = explorer.form().include_unverified;
            if ui
                .checkbox(&mut include_unverified, "Include unverified listings")
                .changed()
            {
                explorer.set_include_unverified(include_unverified);
            }
            let mut findmates_only = explorer.form().findmates_only;
            if ui
                .checkbox(&mut findmates_only, "Only rooms with open slots")
                .changed()
            {
                explorer.set_findmates_only(findmates_only);
            }

            ui.horizontal(|ui| {
                if ui.button("Clear filters").clicked() {
                    explorer.clear_filters();
                }
                let locate = explorer.locate_control();
                if ui
                    .add_enabled(!locate.is_busy(), egui::Button::new(locate.label()))
                    .clicked()
                {
                    explorer.locate_user();
                }
                if ui.button("Recenter").clicked() {
                    explorer.recenter();
                }
            });

            ui.horizontal(|ui| {
                let status = explorer.status();
                if status.is_loading() {
                    ui.spinner();
                }
                match status {
                    SearchStatus::Failed => {
                        ui.colored_label(ui.visuals().error_fg_color, status.text());
                    }
                    _ => {
                        ui.weak(status.text());
                    }
                }
            });
        })
        .response
    }
}

/// Suggestions from the API followed by matching college names.
fn completions<A, P>(ui: &mut egui::Ui, explorer: &mut Explorer<A, P>)
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    let mut picked = None;

    for suggestion in explorer.suggestions() {
        let label = match suggestion.kind.as_str() {
            "" => suggestion.text.clone(),
            kind => format!("{}  ·  {kind}", suggestion.text),
        };
        if ui.selectable_label(false, label).clicked() {
            picked = Some(suggestion.text.clone());
        }
    }
    for college in explorer.matching_colleges().take(5) {
        if ui.selectable_label(false, format!("🎓 {college}")).clicked() {
            picked = Some(college.to_string());
        }
    }

    if let Some(text) = picked {
        explorer.select_suggestion(text);
    }
}
