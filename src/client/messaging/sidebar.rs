//! Sidebar Component
//!
//! Header with the messages badge, search bar and the conversation list.

use chrono::{DateTime, Local};
use eframe::egui;

use super::components::{conversation_item, search_bar, unread_badge};
use super::list_view::{rows, ListState};
use super::state::ConversationCache;
use super::view::{ChatAction, ChatViewState};
use crate::client::theme::{colors, styles};
use crate::shared::config::Locale;

/// Render the sidebar
pub fn render_sidebar(
    ui: &mut egui::Ui,
    cache: &ConversationCache,
    view: &mut ChatViewState,
    now: &DateTime<Local>,
    locale: Locale,
) -> Vec<ChatAction> {
    let mut actions = Vec::new();
    ui.set_min_width(320.0);

    styles::sidebar_frame().show(ui, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let title = match locale {
                Locale::Arabic => "الرسائل",
                Locale::English => "Messages",
            };
            ui.heading(egui::RichText::new(title).color(colors::TEXT_LIGHT));
            unread_badge::render(ui, cache.unread_summary().badge());
        });
        ui.add_space(8.0);
        search_bar::render(ui, &mut view.search_query, locale);
        ui.add_space(8.0);

        if let Some(error) = &cache.error {
            ui.horizontal(|ui| {
                ui.add_space(8.0);
                ui.colored_label(colors::ERROR, error);
                let retry = match locale {
                    Locale::Arabic => "إعادة المحاولة",
                    Locale::English => "Retry",
                };
                if ui.small_button(retry).clicked() {
                    actions.push(ChatAction::Retry);
                }
            });
            ui.add_space(8.0);
        }
    });

    match ListState::of(cache) {
        ListState::Loading => {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.spinner();
            });
        }
        ListState::Empty => {
            let text = match locale {
                Locale::Arabic => "لا توجد محادثات بعد",
                Locale::English => "No conversations yet",
            };
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.colored_label(colors::TEXT_MUTED, text);
            });
        }
        ListState::Populated => {
            let visible = rows(cache.conversations(), &view.search_query, now, locale);
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if visible.is_empty() {
                        let text = match locale {
                            Locale::Arabic => "لا نتائج",
                            Locale::English => "No matches",
                        };
                        ui.colored_label(colors::TEXT_MUTED, text);
                    }
                    for row in &visible {
                        let selected = view.selected == Some(row.chat_id);
                        if conversation_item::render(ui, row, selected) && view.select(row.chat_id) {
                            actions.push(ChatAction::Open(row.chat_id));
                        }
                    }
                    if cache.next_page.is_some() && view.search_query.trim().is_empty() {
                        let label = match locale {
                            Locale::Arabic => "تحميل المزيد",
                            Locale::English => "Load more",
                        };
                        if ui.button(label).clicked() {
                            actions.push(ChatAction::LoadMore);
                        }
                    }
                });
        }
    }

    actions
}
