//! Theme Module
//!
//! Colors and frame builders for the chat panel.
//!
//! ```rust,ignore
//! use souq_chat::client::theme::{colors, styles};
//!
//! styles::apply_global_theme(ctx);
//! styles::sidebar_frame().show(ui, |ui| {
//!     // conversation list
//! });
//! ```

pub mod colors;
pub mod styles;
