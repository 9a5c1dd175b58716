use std::hash::Hash;

/// Blocking message with a single OK button.
pub struct AlertModal {
    id: egui::Id,
}

impl AlertModal {
    pub fn new(id: impl Hash) -> Self {
        Self {
            id: egui::Id::new(id),
        }
    }

    /// Shows `message` for this frame. Returns `true` once the user dismissed it.
    pub fn show(&self, ctx: &egui::Context, title: &str, message: &str) -> bool {
        let response = egui::Modal::new(self.id).show(ctx, |ui| {
            ui.set_max_width(320.0);
            ui.heading(title);
            ui.add_space(4.0);
            ui.label(message);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| ui.button("OK").clicked()).inner
        });

        response.inner || response.should_close()
    }
}
