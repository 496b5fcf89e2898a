//! Conversation Item Component
//!
//! One row of the conversation list: avatar initial, name, listing title,
//! preview, relative time and unread badge.

use eframe::egui;

use super::unread_badge;
use crate::client::messaging::list_view::ConversationRow;
use crate::client::theme::{colors, styles};

/// Render a conversation row. Returns true if it was clicked.
pub fn render(ui: &mut egui::Ui, row: &ConversationRow, is_selected: bool) -> bool {
    let id = ui.make_persistent_id(("conversation-row", row.chat_id.0));
    let hovered = ui.ctx().data(|d| d.get_temp::<bool>(id)).unwrap_or(false);

    let response = styles::row_frame(is_selected, hovered)
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.horizontal(|ui| {
                let initial = row
                    .name
                    .chars()
                    .next()
                    .map(|c| c.to_uppercase().to_string())
                    .unwrap_or_else(|| "?".to_string());
                egui::Frame::new()
                    .fill(colors::ACCENT)
                    .corner_radius(egui::CornerRadius::same(20))
                    .inner_margin(egui::Margin::same(10))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(initial).color(colors::TEXT_LIGHT).strong());
                    });

                ui.add_space(8.0);
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        let dot = if row.online {
                            colors::STATUS_ONLINE
                        } else {
                            colors::STATUS_OFFLINE
                        };
                        ui.colored_label(dot, "●");
                        ui.label(egui::RichText::new(&row.name).color(colors::TEXT_LIGHT).strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.colored_label(colors::TEXT_MUTED, &row.timestamp);
                        });
                    });
                    if let Some(listing) = &row.listing {
                        ui.colored_label(colors::ACCENT, egui::RichText::new(listing).small());
                    }
                    ui.horizontal(|ui| {
                        ui.colored_label(colors::TEXT_MUTED, &row.preview);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            unread_badge::render(ui, row.unread);
                        });
                    });
                });
            });
        })
        .response
        .interact(egui::Sense::click());

    ui.ctx().data_mut(|d| d.insert_temp(id, response.hovered()));
    response.clicked()
}
