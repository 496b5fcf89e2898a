//! Color constants for the chat panel
//!
//! The marketplace palette: deep teal panels, warm sand bubbles and an orange
//! accent for badges.

use eframe::egui::Color32;

/// Sidebar / conversation list background
pub const SIDEBAR_BG: Color32 = Color32::from_rgb(0x12, 0x3A, 0x3F);

/// Hovered conversation row
pub const ROW_HOVER: Color32 = Color32::from_rgb(0x1C, 0x4C, 0x52);

/// Selected conversation row
pub const ROW_SELECTED: Color32 = Color32::from_rgb(0x23, 0x5C, 0x63);

/// Thread background
pub const THREAD_BG: Color32 = Color32::from_rgb(0xF7, 0xF3, 0xEC);

/// Message sent by the viewer
pub const BUBBLE_OUTGOING: Color32 = Color32::from_rgb(0xD9, 0xEF, 0xE6);

/// Message from the other participant
pub const BUBBLE_INCOMING: Color32 = Color32::from_rgb(0xFF, 0xFF, 0xFF);

pub const BUBBLE_BORDER: Color32 = Color32::from_rgb(0xD6, 0xCF, 0xC2);

/// Top bar background
pub const TOP_BAR_BG: Color32 = Color32::from_rgb(0x0D, 0x2E, 0x32);

pub const INPUT_BG: Color32 = Color32::from_rgb(0xEE, 0xE8, 0xDD);

/// Text on dark backgrounds
pub const TEXT_LIGHT: Color32 = Color32::from_rgb(0xF2, 0xF2, 0xEE);

/// Text on light backgrounds
pub const TEXT_DARK: Color32 = Color32::from_rgb(0x1E, 0x26, 0x28);

/// Secondary text (previews, timestamps)
pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x9A, 0xB0, 0xB2);

pub const STATUS_ONLINE: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

pub const STATUS_OFFLINE: Color32 = Color32::from_rgb(0x9E, 0x9E, 0x9E);

/// Connecting / unavailable indicator
pub const WARNING: Color32 = Color32::from_rgb(0xFF, 0xA7, 0x26);

pub const ERROR: Color32 = Color32::from_rgb(0xE5, 0x73, 0x73);

/// Unread badge background
pub const UNREAD_BADGE: Color32 = Color32::from_rgb(0xF2, 0x6B, 0x1D);

pub const ACCENT: Color32 = Color32::from_rgb(0xF2, 0x6B, 0x1D);

pub const SEPARATOR: Color32 = Color32::from_rgb(0x2C, 0x55, 0x5A);
