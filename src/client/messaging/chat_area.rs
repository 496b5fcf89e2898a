//! Chat Area Component
//!
//! The open conversation: header, message thread and input bar.

use chrono::{DateTime, Local};
use eframe::egui;

use super::components::message_bubble;
use super::state::ConversationCache;
use super::view::{ChatAction, ChatViewState};
use crate::client::theme::{colors, styles};
use crate::shared::config::Locale;
use crate::shared::messaging::ChatId;

/// Render the chat area
pub fn render_chat_area(
    ui: &mut egui::Ui,
    cache: &ConversationCache,
    view: &mut ChatViewState,
    now: &DateTime<Local>,
    locale: Locale,
) -> Vec<ChatAction> {
    let mut actions = Vec::new();
    match view.selected {
        Some(chat_id) => render_active_chat(ui, cache, view, chat_id, now, locale, &mut actions),
        None => render_empty_state(ui, locale),
    }
    actions
}

fn render_active_chat(
    ui: &mut egui::Ui,
    cache: &ConversationCache,
    view: &mut ChatViewState,
    chat_id: ChatId,
    now: &DateTime<Local>,
    locale: Locale,
    actions: &mut Vec<ChatAction>,
) {
    let Some(conversation) = cache.conversation(chat_id) else {
        render_empty_state(ui, locale);
        return;
    };

    styles::top_bar_frame().show(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ui.vertical(|ui| {
            ui.label(
                egui::RichText::new(conversation.display_name())
                    .color(colors::TEXT_LIGHT)
                    .strong(),
            );
            if let Some(listing) = &conversation.listing {
                ui.colored_label(colors::ACCENT, &listing.title);
            }
        });
    });

    let input_height = 56.0;
    let thread_height = (ui.available_height() - input_height).max(0.0);
    ui.allocate_ui_with_layout(
        egui::vec2(ui.available_width(), thread_height),
        egui::Layout::top_down(egui::Align::LEFT),
        |ui| {
            styles::thread_frame().show(ui, |ui| {
                ui.set_min_size(ui.available_size());
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| match cache.messages(chat_id) {
                        Some(thread) => {
                            for message in thread {
                                message_bubble::render(ui, message, now, locale);
                            }
                        }
                        None => {
                            ui.vertical_centered(|ui| ui.spinner());
                        }
                    });
            });
        },
    );

    styles::input_bar_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            let hint = match locale {
                Locale::Arabic => "اكتب رسالة...",
                Locale::English => "Write a message...",
            };
            let edit = ui.add(
                egui::TextEdit::singleline(&mut view.draft)
                    .hint_text(hint)
                    .desired_width(ui.available_width() - 60.0),
            );
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("➤").clicked() || submitted {
                if let Some(body) = view.take_draft() {
                    actions.push(ChatAction::Send { chat_id, body });
                }
            }
        });
    });
}

fn render_empty_state(ui: &mut egui::Ui, locale: Locale) {
    let text = match locale {
        Locale::Arabic => "اختر محادثة لبدء المراسلة",
        Locale::English => "Select a conversation to start chatting",
    };
    ui.centered_and_justified(|ui| {
        styles::bubble_frame(false).show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(colors::TEXT_DARK));
        });
    });
}
