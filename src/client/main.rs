//! Souq Chat - desktop entry point
//!
//! Owns the tokio runtime and the [`ChatContext`], mounts the conversation sync
//! for the signed-in user and renders the chat panel with eframe.

use std::sync::Arc;

use chrono::Local;
use eframe::egui;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use souq_chat::client::messaging::{
    badges, chat_area, sidebar, ChatAction, ChatViewState, ConversationCache,
};
use souq_chat::client::realtime::ConnectionState;
use souq_chat::client::theme::{colors, styles};
use souq_chat::client::{ChatContext, Config, ConversationSync, SessionStore};
use souq_chat::shared::messaging::UserId;
use souq_chat::shared::Locale;

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

/// Development sign-in: `SOUQ_TOKEN` and `SOUQ_USER_ID` seed the session store
fn seed_session_from_env(session: &SessionStore) {
    let (Ok(token), Ok(user)) = (std::env::var("SOUQ_TOKEN"), std::env::var("SOUQ_USER_ID")) else {
        return;
    };
    match user.parse::<u64>() {
        Ok(id) => {
            if let Err(e) = session.set(token, Some(UserId(id))) {
                tracing::warn!("[SESSION] Could not persist session: {}", e);
            }
        }
        Err(_) => tracing::warn!("[SESSION] SOUQ_USER_ID is not a number: {}", user),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = Config::load()?;
    init_tracing(config.debug());
    tracing::info!(
        "[APP] Starting Souq chat against {} (analytics {})",
        config.server_url(),
        if config.analytics() { "on" } else { "off" }
    );

    let runtime = Runtime::new()?;
    let session = SessionStore::default_path()
        .map(SessionStore::persistent)
        .unwrap_or_else(SessionStore::in_memory);
    if !session.is_authenticated() {
        seed_session_from_env(&session);
    }
    let context = ChatContext::connect(config, session);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([360.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "سوق - الرسائل",
        options,
        Box::new(move |cc| {
            styles::apply_global_theme(&cc.egui_ctx);
            Ok(Box::new(SouqApp::new(runtime, context)))
        }),
    )?;
    Ok(())
}

struct SouqApp {
    runtime: Runtime,
    context: ChatContext,
    sync: Option<Arc<ConversationSync>>,
    repaint: Option<JoinHandle<()>>,
    view: ChatViewState,
    locale: Locale,
    /// Show the thread instead of the list on narrow windows
    mobile_thread: bool,
}

impl SouqApp {
    fn new(runtime: Runtime, context: ChatContext) -> Self {
        let locale = context.config.locale();
        Self {
            runtime,
            context,
            sync: None,
            repaint: None,
            view: ChatViewState::default(),
            locale,
            mobile_thread: false,
        }
    }

    fn ensure_mounted(&mut self, ctx: &egui::Context) {
        if self.sync.is_some() {
            return;
        }
        let Some(user_id) = self.context.session.user_id() else {
            return;
        };

        let _guard = self.runtime.enter();
        match ConversationSync::mount(&self.context, user_id) {
            Ok(sync) => {
                let sync = Arc::new(sync);
                let mut changes = sync.changes();
                let ctx = ctx.clone();
                self.repaint = Some(self.runtime.spawn(async move {
                    while changes.changed().await.is_ok() {
                        ctx.request_repaint();
                    }
                }));
                self.sync = Some(sync);
            }
            Err(e) => tracing::error!("[APP] Could not mount chat: {}", e),
        }
    }

    fn unmount(&mut self) {
        if let Some(task) = self.repaint.take() {
            task.abort();
        }
        if let Some(sync) = self.sync.take() {
            sync.unmount();
        }
        self.view = ChatViewState::default();
    }

    fn dispatch(&mut self, actions: Vec<ChatAction>) {
        let Some(sync) = self.sync.clone() else {
            return;
        };
        for action in actions {
            let sync = sync.clone();
            match action {
                ChatAction::Open(chat_id) => {
                    self.mobile_thread = true;
                    self.runtime.spawn(async move {
                        if sync.open_conversation(chat_id).await.is_ok() {
                            let _ = sync.mark_seen(chat_id).await;
                        }
                    });
                }
                ChatAction::Send { chat_id, body } => {
                    self.runtime.spawn(async move {
                        if let Err(e) = sync.send_message(chat_id, body, None).await {
                            tracing::warn!("[APP] Send failed: {}", e);
                        }
                    });
                }
                ChatAction::LoadMore => {
                    self.runtime.spawn(async move {
                        let _ = sync.load_more().await;
                    });
                }
                ChatAction::Retry => {
                    self.runtime.spawn(async move {
                        let _ = sync.refresh().await;
                    });
                }
                ChatAction::DismissToast(id) => sync.dismiss_toast(id),
            }
        }
    }

    fn render_top_bar(&self, ctx: &egui::Context, cache: &ConversationCache) -> bool {
        let mut open_messages = false;
        egui::TopBottomPanel::top("top_bar")
            .frame(styles::top_bar_frame())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(egui::RichText::new("سوق").color(colors::ACCENT).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let (color, label) = connection_label(cache.connection, self.locale);
                        ui.colored_label(color, label);
                        ui.add_space(12.0);
                        open_messages = badges::render_header_badge(ui, &cache.unread_summary());
                    });
                });
            });
        open_messages
    }

    fn render_toasts(&self, ctx: &egui::Context, cache: &ConversationCache) -> Vec<ChatAction> {
        let mut actions = Vec::new();
        if cache.toasts().is_empty() {
            return actions;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -64.0])
            .show(ctx, |ui| {
                for toast in cache.toasts() {
                    styles::notice_frame(colors::ERROR).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(colors::TEXT_LIGHT, &toast.message);
                            if ui.small_button("✕").clicked() {
                                actions.push(ChatAction::DismissToast(toast.id));
                            }
                        });
                    });
                    ui.add_space(6.0);
                }
            });
        actions
    }

    fn render_signed_out(&mut self, ctx: &egui::Context) {
        let (title, hint, retry) = match self.locale {
            Locale::Arabic => (
                "انتهت الجلسة",
                "سجّل الدخول من جديد ثم اضغط إعادة المحاولة",
                "إعادة المحاولة",
            ),
            Locale::English => (
                "Session expired",
                "Sign in again, then press Retry",
                "Retry",
            ),
        };
        let mut retry_clicked = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                styles::notice_frame(colors::THREAD_BG).show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading(egui::RichText::new(title).color(colors::TEXT_DARK));
                        ui.label(egui::RichText::new(hint).color(colors::TEXT_DARK));
                        retry_clicked = ui.button(retry).clicked();
                    });
                });
            });
        });
        if retry_clicked {
            self.unmount();
            seed_session_from_env(&self.context.session);
        }
    }
}

fn connection_label(state: ConnectionState, locale: Locale) -> (egui::Color32, &'static str) {
    let arabic = locale == Locale::Arabic;
    match state {
        ConnectionState::Connected => (colors::STATUS_ONLINE, if arabic { "متصل" } else { "Live" }),
        ConnectionState::Initialized | ConnectionState::Connecting => {
            (colors::WARNING, if arabic { "جارٍ الاتصال" } else { "Connecting" })
        }
        ConnectionState::Unavailable => {
            (colors::WARNING, if arabic { "غير متاح" } else { "Reconnecting" })
        }
        ConnectionState::Failed | ConnectionState::Disconnected => {
            (colors::ERROR, if arabic { "غير متصل" } else { "Offline" })
        }
    }
}

impl eframe::App for SouqApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_mounted(ctx);

        let Some(sync) = self.sync.clone() else {
            self.render_signed_out(ctx);
            return;
        };
        // Render from a copy so the sync task is never blocked on a frame
        let cache = sync.cache().clone();
        if cache.auth_required {
            self.render_signed_out(ctx);
            return;
        }

        let now = Local::now();
        let mut actions = Vec::new();
        let mobile = badges::is_mobile_width(ctx.screen_rect().width());

        if self.render_top_bar(ctx, &cache) {
            self.mobile_thread = false;
        }
        if mobile && badges::render_mobile_nav(ctx, &cache.unread_summary(), self.locale) {
            self.mobile_thread = false;
        }
        actions.extend(self.render_toasts(ctx, &cache));

        if !mobile {
            egui::SidePanel::left("conversations")
                .resizable(false)
                .frame(styles::sidebar_frame())
                .show(ctx, |ui| {
                    actions.extend(sidebar::render_sidebar(ui, &cache, &mut self.view, &now, self.locale));
                });
        }

        egui::CentralPanel::default()
            .frame(styles::thread_frame())
            .show(ctx, |ui| {
                if mobile && !self.mobile_thread {
                    actions.extend(sidebar::render_sidebar(ui, &cache, &mut self.view, &now, self.locale));
                } else {
                    actions.extend(chat_area::render_chat_area(ui, &cache, &mut self.view, &now, self.locale));
                }
            });

        self.dispatch(actions);
    }
}

impl Drop for SouqApp {
    fn drop(&mut self) {
        self.unmount();
        self.context.channels.disconnect();
    }
}
