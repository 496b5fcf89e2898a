//! Message Bubble Component
//!
//! Displays a single message with its time and, for own messages, the seen
//! marker.

use chrono::{DateTime, Local};
use eframe::egui;

use crate::client::messaging::list_view::format_timestamp;
use crate::client::theme::{colors, styles};
use crate::shared::config::Locale;
use crate::shared::messaging::Message;

/// Render a message bubble
pub fn render(ui: &mut egui::Ui, message: &Message, now: &DateTime<Local>, locale: Locale) {
    let outgoing = message.is_self;
    let align = if outgoing { egui::Align::RIGHT } else { egui::Align::LEFT };

    ui.with_layout(egui::Layout::top_down(align), |ui| {
        let max_width = ui.available_width() * 0.7;
        ui.allocate_ui_with_layout(
            egui::vec2(max_width, 0.0),
            egui::Layout::top_down(align),
            |ui| {
                styles::bubble_frame(outgoing).show(ui, |ui| {
                    let text = message.body.text();
                    if !text.is_empty() {
                        ui.label(egui::RichText::new(text).color(colors::TEXT_DARK));
                    }
                    if let Some(url) = &message.attachment {
                        ui.hyperlink_to("📎", url);
                    }
                    ui.horizontal(|ui| {
                        let time = format_timestamp(message.timestamp(), now, locale);
                        ui.colored_label(colors::TEXT_MUTED, egui::RichText::new(time).small());
                        if outgoing {
                            let (icon, color) = if message.seen {
                                ("✓✓", colors::ACCENT)
                            } else {
                                ("✓", colors::TEXT_MUTED)
                            };
                            ui.colored_label(color, icon);
                        }
                    });
                });
            },
        );
    });
    ui.add_space(4.0);
}
