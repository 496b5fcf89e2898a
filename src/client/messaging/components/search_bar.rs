//! Search Bar Component
//!
//! Filters the conversation list by participant name.

use eframe::egui;

use crate::shared::config::Locale;

/// Render the search bar
pub fn render(ui: &mut egui::Ui, query: &mut String, locale: Locale) {
    let hint = match locale {
        Locale::Arabic => "ابحث في المحادثات...",
        Locale::English => "Search conversations...",
    };

    ui.horizontal(|ui| {
        ui.add_space(8.0);
        ui.label("🔍");
        ui.add(
            egui::TextEdit::singleline(query)
                .hint_text(hint)
                .desired_width(ui.available_width() - 40.0),
        );
        if !query.is_empty() && ui.button("✕").clicked() {
            query.clear();
        }
        ui.add_space(8.0);
    });
}
