//! Unread Badge
//!
//! The orange pill drawn next to icons and conversation rows. Nothing is drawn
//! for a zero count.

use eframe::egui;

use crate::client::messaging::unread::BadgeCount;
use crate::client::theme::colors;

/// Draw `count` as a pill. Returns `None` when there is nothing to show.
pub fn render(ui: &mut egui::Ui, count: BadgeCount) -> Option<egui::Response> {
    let label = count.label()?;
    let response = egui::Frame::new()
        .fill(colors::UNREAD_BADGE)
        .corner_radius(egui::CornerRadius::same(9))
        .inner_margin(egui::Margin::symmetric(6, 1))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(label)
                    .color(colors::TEXT_LIGHT)
                    .small()
                    .strong(),
            );
        })
        .response;
    Some(response)
}

/// An icon button with a badge beside it. Returns true when clicked.
pub fn icon_button(ui: &mut egui::Ui, icon: &str, count: BadgeCount) -> bool {
    ui.horizontal(|ui| {
        let clicked = ui.button(icon).clicked();
        render(ui, count);
        clicked
    })
    .inner
}
