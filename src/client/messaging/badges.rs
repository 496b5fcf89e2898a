//! Notification Badges
//!
//! The header icon and the mobile navigation bar show the same unread summary
//! as the sidebar. All of them read the mounted sync's cache, so they can
//! never disagree.

use eframe::egui;

use super::components::unread_badge;
use super::unread::UnreadSummary;
use crate::client::theme::{colors, styles};
use crate::shared::config::Locale;

/// Windows narrower than this get the bottom navigation bar
pub const MOBILE_BREAKPOINT: f32 = 720.0;

pub fn is_mobile_width(width: f32) -> bool {
    width < MOBILE_BREAKPOINT
}

/// Chat icon in the top bar. Returns true when clicked.
pub fn render_header_badge(ui: &mut egui::Ui, summary: &UnreadSummary) -> bool {
    let response = unread_badge::icon_button(ui, "💬", summary.badge());
    if summary.conversations_with_unread > 0 {
        ui.colored_label(
            colors::TEXT_MUTED,
            egui::RichText::new(format!("({})", summary.conversations_with_unread)).small(),
        );
    }
    response
}

/// Bottom navigation bar for narrow windows. Returns true when the messages
/// entry was clicked.
pub fn render_mobile_nav(ctx: &egui::Context, summary: &UnreadSummary, locale: Locale) -> bool {
    let mut clicked = false;
    egui::TopBottomPanel::bottom("mobile_nav")
        .frame(styles::top_bar_frame())
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                let (home, messages) = match locale {
                    Locale::Arabic => ("🏠 الرئيسية", "💬 الرسائل"),
                    Locale::English => ("🏠 Home", "💬 Messages"),
                };
                ui.colored_label(colors::TEXT_MUTED, home);
                ui.add_space(24.0);
                clicked = unread_badge::icon_button(ui, messages, summary.badge());
            });
        });
    clicked
}
