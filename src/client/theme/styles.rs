//! Theme Styling Functions
//!
//! Helpers that apply the palette consistently across the chat panel.

use eframe::egui::{self, Color32, CornerRadius, Stroke};

use super::colors;

/// Apply the global theme to the egui context
pub fn apply_global_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.window_fill = colors::THREAD_BG;
    style.visuals.window_stroke = Stroke::new(1.0, colors::BUBBLE_BORDER);
    style.visuals.panel_fill = colors::SIDEBAR_BG;

    style.visuals.widgets.inactive.bg_fill = colors::INPUT_BG;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors::TEXT_DARK);
    style.visuals.widgets.hovered.bg_fill = colors::ROW_HOVER;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);
    style.visuals.widgets.active.bg_fill = colors::ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    style.visuals.selection.bg_fill = colors::ROW_SELECTED;
    style.visuals.selection.stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    ctx.set_style(style);
}

pub fn sidebar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::SIDEBAR_BG)
        .inner_margin(egui::Margin::same(0))
}

pub fn thread_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::THREAD_BG)
        .inner_margin(egui::Margin::symmetric(12, 8))
}

pub fn top_bar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::TOP_BAR_BG)
        .inner_margin(egui::Margin::symmetric(12, 8))
}

pub fn input_bar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::INPUT_BG)
        .stroke(Stroke::new(1.0, colors::BUBBLE_BORDER))
        .inner_margin(egui::Margin::symmetric(12, 8))
}

/// Bubble frame; the tail corner sits on the sender's side
pub fn bubble_frame(outgoing: bool) -> egui::Frame {
    let (fill, radius) = if outgoing {
        (
            colors::BUBBLE_OUTGOING,
            CornerRadius { nw: 12, ne: 12, sw: 12, se: 4 },
        )
    } else {
        (
            colors::BUBBLE_INCOMING,
            CornerRadius { nw: 12, ne: 12, sw: 4, se: 12 },
        )
    };
    egui::Frame::new()
        .fill(fill)
        .stroke(Stroke::new(1.0, colors::BUBBLE_BORDER))
        .corner_radius(radius)
        .inner_margin(egui::Margin::symmetric(12, 8))
}

/// Frame for a conversation row
pub fn row_frame(is_selected: bool, is_hovered: bool) -> egui::Frame {
    let fill = if is_selected {
        colors::ROW_SELECTED
    } else if is_hovered {
        colors::ROW_HOVER
    } else {
        colors::SIDEBAR_BG
    };
    egui::Frame::new()
        .fill(fill)
        .inner_margin(egui::Margin::symmetric(12, 10))
}

/// Frame for toasts and the session-expired prompt
pub fn notice_frame(fill: Color32) -> egui::Frame {
    egui::Frame::new()
        .fill(fill)
        .corner_radius(CornerRadius::same(8))
        .inner_margin(egui::Margin::symmetric(12, 8))
        .shadow(egui::epaint::Shadow {
            offset: [0, 2],
            blur: 8,
            spread: 0,
            color: Color32::from_black_alpha(60),
        })
}
