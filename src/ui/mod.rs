//! Terminal dashboard for the incident-response console.
//!
//! All state shown here is server-owned: views issue API calls through
//! background tasks and render whatever the backend returns. Results come
//! back on an mpsc channel tagged with a generation counter; the counter is
//! bumped on every tab switch so responses from an abandoned view are
//! discarded instead of clobbering the current one. Breach state arrives
//! separately through the poller's watch channel.

pub mod format;
pub mod views;
pub mod widgets;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::*;
use crate::api::ApiClient;
use crate::config::Config;
use crate::poller::spawn_breach_poller;
use crate::session::SessionStore;

use views::attack_vector::AttackVectorView;
use views::command_center::CommandCenterView;
use views::customers::CustomersView;
use views::evidence::EvidenceView;
use views::login::LoginView;
use views::mailbox::MailboxView;
use views::reports::ReportsView;
use views::settings::SettingsView;
use views::war_room::WarRoomView;

const TOAST_TTL: Duration = Duration::from_secs(4);

// ============================================================================
// Tabs, actions, messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    CommandCenter,
    WarRoom,
    Mailbox,
    Customers,
    Reports,
    AttackVector,
    Evidence,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::CommandCenter,
        Tab::WarRoom,
        Tab::Mailbox,
        Tab::Customers,
        Tab::Reports,
        Tab::AttackVector,
        Tab::Evidence,
        Tab::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::CommandCenter => "Command Center",
            Tab::WarRoom => "War Room",
            Tab::Mailbox => "Mailbox",
            Tab::Customers => "Customers",
            Tab::Reports => "Reports",
            Tab::AttackVector => "Attack Vector",
            Tab::Evidence => "Evidence",
            Tab::Settings => "Settings",
        }
    }

    fn next(self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Tab::ALL[(idx + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Tab::ALL[(idx + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// What a view wants the shell to do in response to a key.
#[derive(Debug)]
pub enum Action {
    None,
    Login { email: String, password: String },
    TriggerBreach(BreachTriggerRequest),
    Contain,
    DpbNotice,
    NotifyUsers { channel: String },
    CloseBreach,
    RefreshTab,
    CreateCustomer(CustomerCreate),
    UpdateCustomer { id: String, update: CustomerUpdate },
    DeleteCustomer { id: String },
    ExportCustomers,
    ExportReports,
    DownloadReportPdf { filename: String },
    ProcessEmail(Email),
    VerifyOtp { request_id: String, otp: String },
    ApplyCorrection(CorrectionRequest),
    GenerateVectorPdf,
    GenerateAuditReport,
    UpdateSettings(AppSettings),
    SetGmailPassword(String),
}

/// Results delivered back from background API tasks.
enum Msg {
    LoginDone(ApiResult<()>),
    Breach(ApiResult<BreachState>),
    Stats(ApiResult<DashboardStats>),
    Customers(ApiResult<Vec<Customer>>),
    Inbox(ApiResult<InboxResponse>),
    Replies(ApiResult<Vec<MailReply>>),
    Reports(ApiResult<Vec<Report>>),
    Vector(ApiResult<VectorAnalysis>),
    Evidence(ApiResult<EvidenceTimeline>),
    Encryption(ApiResult<EncryptionDemo>),
    Settings(ApiResult<AppSettings>),
    MailStatus(ApiResult<ConnectionStatus>),
    /// Outcome of the breach trigger; success moves the operator to the
    /// war room.
    Triggered(ApiResult<String>),
    BreachAction(ApiResult<String>),
    CustomerMutation(ApiResult<String>),
    Processed {
        email_id: String,
        outcome: ApiResult<ProcessOutcome>,
    },
    OtpVerified(ApiResult<VerifyOutcome>),
    CorrectionApplied(ApiResult<CorrectionOutcome>),
    /// Toast-only outcome of settings writes and PDF generation.
    ActionDone(ApiResult<String>),
    Downloaded(ApiResult<PathBuf>),
}

struct Envelope {
    gen: u64,
    msg: Msg,
}

struct Toast {
    text: String,
    is_error: bool,
    at: Instant,
}

// ============================================================================
// App
// ============================================================================

struct App {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    config: Config,
    tx: mpsc::UnboundedSender<Envelope>,
    breach_tx: watch::Sender<BreachState>,
    poller_cancel: Option<CancellationToken>,
    generation: u64,
    authenticated: bool,
    tab: Tab,
    breach: BreachState,
    toast: Option<Toast>,
    should_quit: bool,
    last_stats_fetch: Instant,
    last_mailbox_fetch: Instant,
    last_reports_fetch: Instant,

    login: LoginView,
    command_center: CommandCenterView,
    war_room: WarRoomView,
    mailbox: MailboxView,
    customers: CustomersView,
    reports: ReportsView,
    attack_vector: AttackVectorView,
    evidence: EvidenceView,
    settings: SettingsView,
}

impl App {
    fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionStore>,
        config: Config,
        tx: mpsc::UnboundedSender<Envelope>,
        breach_tx: watch::Sender<BreachState>,
    ) -> Self {
        let authenticated = session.is_authenticated();
        Self {
            api,
            session,
            config,
            tx,
            breach_tx,
            poller_cancel: None,
            generation: 0,
            authenticated,
            tab: Tab::CommandCenter,
            breach: BreachState::default(),
            toast: None,
            should_quit: false,
            last_stats_fetch: Instant::now(),
            last_mailbox_fetch: Instant::now(),
            last_reports_fetch: Instant::now(),
            login: LoginView::new(),
            command_center: CommandCenterView::new(),
            war_room: WarRoomView::new(),
            mailbox: MailboxView::new(),
            customers: CustomersView::new(),
            reports: ReportsView::new(),
            attack_vector: AttackVectorView::new(),
            evidence: EvidenceView::new(),
            settings: SettingsView::new(),
        }
    }

    fn toast(&mut self, text: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error,
            at: Instant::now(),
        });
    }

    // ------------------------------------------------------------------------
    // Poller lifecycle
    // ------------------------------------------------------------------------

    /// The breach poller runs only while a session token is present.
    fn start_poller(&mut self) {
        if self.poller_cancel.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        spawn_breach_poller(
            Arc::clone(&self.api),
            &self.config.poll,
            self.breach_tx.clone(),
            cancel.clone(),
        );
        self.poller_cancel = Some(cancel);
    }

    fn stop_poller(&mut self) {
        if let Some(cancel) = self.poller_cancel.take() {
            cancel.cancel();
        }
        self.breach = BreachState::default();
    }

    // ------------------------------------------------------------------------
    // Background fetches
    // ------------------------------------------------------------------------

    fn spawn<T, F, Fut>(&self, call: F, wrap: fn(ApiResult<T>) -> Msg)
    where
        T: Send + 'static,
        F: FnOnce(Arc<ApiClient>) -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let gen = self.generation;
        tokio::spawn(async move {
            let msg = wrap(call(api).await);
            let _ = tx.send(Envelope { gen, msg });
        });
    }

    fn fetch_tab(&mut self) {
        match self.tab {
            Tab::CommandCenter => {
                self.fetch_stats();
            }
            Tab::WarRoom => {
                self.spawn(|api| async move { api.breach_status().await }, Msg::Breach);
            }
            Tab::Mailbox => {
                self.fetch_mailbox();
            }
            Tab::Customers => {
                self.spawn(|api| async move { api.customers().await }, Msg::Customers);
            }
            Tab::Reports => {
                self.fetch_reports();
            }
            Tab::AttackVector => {
                self.spawn(|api| async move { api.attack_vector().await }, Msg::Vector);
            }
            Tab::Evidence => {
                self.spawn(|api| async move { api.evidence_timeline().await }, Msg::Evidence);
                self.spawn(|api| async move { api.encryption_demo().await }, Msg::Encryption);
            }
            Tab::Settings => {
                self.spawn(|api| async move { api.settings().await }, Msg::Settings);
                self.spawn(
                    |api| async move { api.mail_connection_status().await },
                    Msg::MailStatus,
                );
            }
        }
    }

    fn fetch_stats(&mut self) {
        self.last_stats_fetch = Instant::now();
        self.spawn(|api| async move { api.dashboard_stats().await }, Msg::Stats);
    }

    /// Stats refresh cadence follows the breach poller: fast during an
    /// active incident, slow otherwise.
    fn stats_interval(&self) -> Duration {
        let poll = &self.config.poll;
        if self.breach.active {
            Duration::from_secs(poll.active_secs)
        } else {
            Duration::from_secs(poll.idle_secs)
        }
    }

    fn fetch_mailbox(&mut self) {
        self.last_mailbox_fetch = Instant::now();
        self.spawn(|api| async move { api.inbox().await }, Msg::Inbox);
        self.spawn(|api| async move { api.mail_replies().await }, Msg::Replies);
    }

    fn fetch_reports(&mut self) {
        self.last_reports_fetch = Instant::now();
        self.spawn(|api| async move { api.reports().await }, Msg::Reports);
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        self.tab = tab;
        // Invalidate any fetch still in flight for the previous tab.
        self.generation += 1;
        self.clear_in_flight();
        self.fetch_tab();
    }

    fn clear_in_flight(&mut self) {
        self.command_center.in_flight = false;
        self.war_room.in_flight = false;
        self.mailbox.processing = false;
        self.customers.in_flight = false;
        self.attack_vector.in_flight = false;
        self.evidence.in_flight = false;
        self.settings.in_flight = false;
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// True while a dialog or search box owns the keyboard.
    fn input_active(&self) -> bool {
        match self.tab {
            Tab::CommandCenter => self.command_center.trigger_dialog.is_some(),
            Tab::Mailbox => {
                self.mailbox.otp_dialog.is_some() || self.mailbox.correction_dialog.is_some()
            }
            Tab::Customers => {
                self.customers.searching
                    || self.customers.dialog.is_some()
                    || self.customers.confirm_delete.is_some()
            }
            Tab::Reports => self.reports.searching,
            Tab::Settings => self.settings.gmail_dialog.is_some(),
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if !self.authenticated {
            if key.code == KeyCode::Esc {
                self.should_quit = true;
                return;
            }
            let action = self.login.handle_key(key);
            self.execute(action);
            return;
        }

        if !self.input_active() {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('L') => {
                    self.logout();
                    return;
                }
                KeyCode::Char('T') => {
                    let next = if self.session.theme() == "dark" { "light" } else { "dark" };
                    self.session.set_theme(next);
                    return;
                }
                KeyCode::Char(c @ '1'..='8') => {
                    let idx = (c as usize) - ('1' as usize);
                    self.switch_tab(Tab::ALL[idx]);
                    return;
                }
                KeyCode::Tab => {
                    self.switch_tab(self.tab.next());
                    return;
                }
                KeyCode::BackTab => {
                    self.switch_tab(self.tab.prev());
                    return;
                }
                _ => {}
            }
        }

        let breach = self.breach.clone();
        let action = match self.tab {
            Tab::CommandCenter => self.command_center.handle_key(key, &breach),
            Tab::WarRoom => self.war_room.handle_key(key, &breach),
            Tab::Mailbox => self.mailbox.handle_key(key),
            Tab::Customers => self.customers.handle_key(key),
            Tab::Reports => self.reports.handle_key(key),
            Tab::AttackVector => self.attack_vector.handle_key(key),
            Tab::Evidence => self.evidence.handle_key(key),
            Tab::Settings => self.settings.handle_key(key),
        };
        self.execute(action);
    }

    fn logout(&mut self) {
        let session = Arc::clone(&self.session);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            session.logout(&api).await;
        });
        self.stop_poller();
        self.authenticated = false;
        self.generation += 1;
        self.clear_in_flight();
        self.login = LoginView::new();
        self.toast("Logged out", false);
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Login { email, password } => {
                let session = Arc::clone(&self.session);
                self.spawn(
                    move |api| async move { session.login(&api, &email, &password).await },
                    Msg::LoginDone,
                );
            }
            Action::RefreshTab => self.fetch_tab(),
            Action::TriggerBreach(req) => {
                self.spawn(
                    move |api| async move {
                        let resp = api.trigger_breach(&req).await?;
                        Ok(format!("Breach protocol triggered: {}", resp.incident_id))
                    },
                    Msg::Triggered,
                );
            }
            Action::Contain => {
                self.spawn(
                    |api| async move {
                        api.confirm_containment().await?;
                        Ok("Containment confirmed".to_string())
                    },
                    Msg::BreachAction,
                );
            }
            Action::DpbNotice => {
                self.spawn(
                    |api| async move {
                        let ack = api.generate_dpb_notice().await?;
                        Ok(format!("DPB notice sent (report {})", ack.report_id))
                    },
                    Msg::BreachAction,
                );
            }
            Action::NotifyUsers { channel } => {
                self.spawn(
                    move |api| async move {
                        let resp = api.notify_users(&channel).await?;
                        Ok(format!("Notified {} users via {}", resp.count, channel))
                    },
                    Msg::BreachAction,
                );
            }
            Action::CloseBreach => {
                self.spawn(
                    |api| async move {
                        let ack = api.close_breach().await?;
                        Ok(format!("Incident closed (report {})", ack.report_id))
                    },
                    Msg::BreachAction,
                );
            }
            Action::CreateCustomer(req) => {
                self.spawn(
                    move |api| async move {
                        let customer = api.create_customer(&req).await?;
                        Ok(format!("Created {}", customer.customer_id))
                    },
                    Msg::CustomerMutation,
                );
            }
            Action::UpdateCustomer { id, update } => {
                self.spawn(
                    move |api| async move {
                        let customer = api.update_customer(&id, &update).await?;
                        Ok(format!("Updated {}", customer.customer_id))
                    },
                    Msg::CustomerMutation,
                );
            }
            Action::DeleteCustomer { id } => {
                self.spawn(
                    move |api| async move {
                        let ack = api.delete_customer(&id).await?;
                        Ok(format!("Deleted {}", ack.customer_id))
                    },
                    Msg::CustomerMutation,
                );
            }
            Action::ExportCustomers => {
                let dir = self.config.server.data_dir.clone();
                self.spawn(
                    move |api| async move { api.download_csv("customers.csv", &dir).await },
                    Msg::Downloaded,
                );
            }
            Action::ExportReports => {
                let dir = self.config.server.data_dir.clone();
                self.spawn(
                    move |api| async move { api.download_csv("reports_sent.csv", &dir).await },
                    Msg::Downloaded,
                );
            }
            Action::DownloadReportPdf { filename } => {
                let dir = self.config.server.data_dir.clone();
                self.spawn(
                    move |api| async move { api.download_pdf(&filename, &dir).await },
                    Msg::Downloaded,
                );
            }
            Action::ProcessEmail(email) => {
                let email_id = email.id.clone();
                let api = Arc::clone(&self.api);
                let tx = self.tx.clone();
                let gen = self.generation;
                tokio::spawn(async move {
                    let outcome = api.process_email(&email).await;
                    let _ = tx.send(Envelope {
                        gen,
                        msg: Msg::Processed { email_id, outcome },
                    });
                });
            }
            Action::VerifyOtp { request_id, otp } => {
                self.spawn(
                    move |api| async move { api.verify_otp(&request_id, &otp).await },
                    Msg::OtpVerified,
                );
            }
            Action::ApplyCorrection(req) => {
                self.spawn(
                    move |api| async move { api.apply_correction(&req).await },
                    Msg::CorrectionApplied,
                );
            }
            Action::GenerateVectorPdf => {
                let dir = self.config.server.data_dir.clone();
                self.spawn(
                    move |api| async move {
                        let ack = api.attack_vector_pdf().await?;
                        match ack.filename.as_deref() {
                            Some(filename) => {
                                let dest = api.download_pdf(filename, &dir).await?;
                                Ok(format!("Vector analysis PDF saved to {}", dest.display()))
                            }
                            None => Ok("Vector analysis PDF generated".to_string()),
                        }
                    },
                    Msg::ActionDone,
                );
            }
            Action::GenerateAuditReport => {
                let dir = self.config.server.data_dir.clone();
                self.spawn(
                    move |api| async move {
                        let ack = api.generate_audit_report().await?;
                        match ack.filename.as_deref() {
                            Some(filename) => {
                                let dest = api.download_pdf(filename, &dir).await?;
                                Ok(format!("Audit report saved to {}", dest.display()))
                            }
                            None => Ok("Audit report generated".to_string()),
                        }
                    },
                    Msg::ActionDone,
                );
            }
            Action::UpdateSettings(settings) => {
                self.spawn(
                    move |api| async move {
                        api.update_settings(&settings).await?;
                        Ok("Settings saved".to_string())
                    },
                    Msg::ActionDone,
                );
            }
            Action::SetGmailPassword(password) => {
                self.spawn(
                    move |api| async move {
                        let ack = api.set_gmail_password(&password).await?;
                        if ack.ok {
                            Ok("Gmail app password stored".to_string())
                        } else {
                            Err(ApiError::Server {
                                status: 400,
                                message: ack.error.unwrap_or_else(|| "rejected".to_string()),
                            })
                        }
                    },
                    Msg::ActionDone,
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Message handling
    // ------------------------------------------------------------------------

    fn handle_envelope(&mut self, envelope: Envelope) {
        if envelope.gen != self.generation {
            tracing::debug!("Discarding stale response from an earlier view generation");
            return;
        }
        self.handle_msg(envelope.msg);
    }

    /// Drop the local session when the server says the token is no longer
    /// valid. The next screen is the login gate.
    fn force_reauth(&mut self) {
        self.session.clear_credentials();
        self.stop_poller();
        self.authenticated = false;
        self.generation += 1;
        self.clear_in_flight();
        self.login = LoginView::new();
        self.toast("Session expired, log in again", true);
    }

    fn handle_msg(&mut self, msg: Msg) {
        // 401 on any authenticated call sends the user back to the gate.
        if !matches!(msg, Msg::LoginDone(_)) {
            let unauthorized = match &msg {
                Msg::Breach(Err(e))
                | Msg::Stats(Err(e))
                | Msg::Customers(Err(e))
                | Msg::Inbox(Err(e))
                | Msg::Replies(Err(e))
                | Msg::Reports(Err(e))
                | Msg::Vector(Err(e))
                | Msg::Evidence(Err(e))
                | Msg::Encryption(Err(e))
                | Msg::Settings(Err(e))
                | Msg::MailStatus(Err(e))
                | Msg::Triggered(Err(e))
                | Msg::BreachAction(Err(e))
                | Msg::CustomerMutation(Err(e))
                | Msg::OtpVerified(Err(e))
                | Msg::CorrectionApplied(Err(e))
                | Msg::ActionDone(Err(e))
                | Msg::Downloaded(Err(e)) => e.is_unauthorized(),
                Msg::Processed { outcome: Err(e), .. } => e.is_unauthorized(),
                _ => false,
            };
            if unauthorized {
                self.force_reauth();
                return;
            }
        }

        match msg {
            Msg::LoginDone(Ok(())) => {
                self.login.on_result(None);
                self.authenticated = true;
                self.toast(format!("Signed in as {}", self.session.admin_email()), false);
                self.start_poller();
                self.fetch_tab();
            }
            Msg::LoginDone(Err(e)) => self.login.on_result(Some(e.to_string())),
            Msg::Breach(Ok(state)) => self.breach = state,
            Msg::Breach(Err(e)) => tracing::debug!(error = %e, "Breach refresh failed"),
            Msg::Stats(Ok(stats)) => {
                self.command_center.stats = stats;
                self.command_center.error = None;
            }
            Msg::Stats(Err(e)) => self.command_center.error = Some(e.to_string()),
            Msg::Customers(Ok(customers)) => {
                self.customers.customers = customers;
                self.customers.error = None;
            }
            Msg::Customers(Err(e)) => self.customers.error = Some(e.to_string()),
            Msg::Inbox(Ok(inbox)) => {
                self.mailbox.inbox = inbox;
                self.mailbox.error = None;
            }
            Msg::Inbox(Err(e)) => self.mailbox.error = Some(e.to_string()),
            Msg::Replies(Ok(replies)) => self.mailbox.replies = replies,
            Msg::Replies(Err(e)) => tracing::debug!(error = %e, "Replies refresh failed"),
            Msg::Reports(Ok(reports)) => {
                self.reports.reports = reports;
                self.reports.error = None;
            }
            Msg::Reports(Err(e)) => self.reports.error = Some(e.to_string()),
            Msg::Vector(Ok(analysis)) => {
                self.attack_vector.analysis = Some(analysis);
                self.attack_vector.error = None;
            }
            Msg::Vector(Err(e)) => self.attack_vector.error = Some(e.to_string()),
            Msg::Evidence(Ok(timeline)) => {
                self.evidence.timeline = Some(timeline);
                self.evidence.error = None;
            }
            Msg::Evidence(Err(e)) => self.evidence.error = Some(e.to_string()),
            Msg::Encryption(Ok(demo)) => self.evidence.demo = Some(demo),
            Msg::Encryption(Err(e)) => tracing::debug!(error = %e, "Encryption demo fetch failed"),
            Msg::Settings(Ok(settings)) => {
                self.settings.settings = Some(settings);
                self.settings.error = None;
                self.settings.in_flight = false;
            }
            Msg::Settings(Err(e)) => self.settings.error = Some(e.to_string()),
            Msg::MailStatus(Ok(status)) => self.settings.mail_status = Some(status),
            Msg::MailStatus(Err(e)) => tracing::debug!(error = %e, "Connection status fetch failed"),
            Msg::Triggered(result) => {
                self.command_center.in_flight = false;
                match result {
                    Ok(text) => {
                        self.toast(text, false);
                        self.switch_tab(Tab::WarRoom);
                    }
                    Err(e) => self.toast(e.to_string(), true),
                }
            }
            Msg::BreachAction(result) => {
                self.war_room.in_flight = false;
                self.command_center.in_flight = false;
                match result {
                    Ok(text) => {
                        self.toast(text, false);
                        self.spawn(|api| async move { api.breach_status().await }, Msg::Breach);
                    }
                    Err(e) => self.toast(e.to_string(), true),
                }
            }
            Msg::CustomerMutation(result) => {
                self.customers.in_flight = false;
                match result {
                    Ok(text) => {
                        self.toast(text, false);
                        self.spawn(|api| async move { api.customers().await }, Msg::Customers);
                    }
                    Err(e) => self.customers.error = Some(e.to_string()),
                }
            }
            Msg::Processed { email_id, outcome } => match outcome {
                Ok(outcome) => {
                    self.mailbox.on_processed(&email_id, &outcome);
                    self.toast(outcome.message.clone(), false);
                    self.fetch_mailbox();
                }
                Err(e) => {
                    self.mailbox.processing = false;
                    self.mailbox.error = Some(e.to_string());
                }
            },
            Msg::OtpVerified(result) => match result {
                Ok(outcome) => {
                    self.mailbox.on_verified(&outcome);
                    if outcome.verified {
                        let summary = outcome
                            .action
                            .clone()
                            .unwrap_or_else(|| format!("{} request verified", outcome.intent));
                        self.toast(summary, false);
                    }
                    self.fetch_mailbox();
                }
                Err(e) => self.mailbox.on_verify_failed(e.to_string()),
            },
            Msg::CorrectionApplied(result) => match result {
                Ok(outcome) => {
                    self.mailbox.on_correction_done();
                    self.toast(format!("Correction applied (report {})", outcome.report_id), false);
                    self.fetch_mailbox();
                }
                Err(e) => {
                    if let Some(dialog) = &mut self.mailbox.correction_dialog {
                        dialog.in_flight = false;
                    }
                    self.toast(e.to_string(), true);
                }
            },
            Msg::ActionDone(result) => {
                self.settings.in_flight = false;
                self.attack_vector.in_flight = false;
                self.evidence.in_flight = false;
                match result {
                    Ok(text) => {
                        self.toast(text, false);
                        if self.tab == Tab::Settings {
                            self.spawn(|api| async move { api.settings().await }, Msg::Settings);
                        }
                    }
                    Err(e) => self.toast(e.to_string(), true),
                }
            }
            Msg::Downloaded(result) => match result {
                Ok(path) => self.toast(format!("Saved {}", path.display()), false),
                Err(e) => self.toast(e.to_string(), true),
            },
        }
    }

    fn on_tick(&mut self) {
        if let Some(toast) = &self.toast {
            if toast.at.elapsed() > TOAST_TTL {
                self.toast = None;
            }
        }
        if !self.authenticated {
            return;
        }
        if self.tab == Tab::CommandCenter
            && self.last_stats_fetch.elapsed() >= self.stats_interval()
        {
            self.fetch_stats();
        }
        let mailbox_secs = self.config.poll.mailbox_secs;
        let reports_secs = self.config.poll.reports_secs;
        if self.tab == Tab::Mailbox
            && self.last_mailbox_fetch.elapsed() >= Duration::from_secs(mailbox_secs)
        {
            self.fetch_mailbox();
        }
        if self.tab == Tab::Reports
            && self.last_reports_fetch.elapsed() >= Duration::from_secs(reports_secs)
        {
            self.fetch_reports();
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        if !self.authenticated {
            self.login.render(frame, area);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, rows[0]);

        let breach = self.breach.clone();
        match self.tab {
            Tab::CommandCenter => self.command_center.render(frame, rows[1], &breach),
            Tab::WarRoom => self.war_room.render(frame, rows[1], &breach),
            Tab::Mailbox => self.mailbox.render(frame, rows[1]),
            Tab::Customers => self.customers.render(frame, rows[1]),
            Tab::Reports => self.reports.render(frame, rows[1]),
            Tab::AttackVector => self.attack_vector.render(frame, rows[1]),
            Tab::Evidence => self.evidence.render(frame, rows[1]),
            Tab::Settings => {
                let theme = self.session.theme();
                self.settings.render(frame, rows[1], &theme)
            }
        }

        self.render_footer(frame, rows[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let accent = if self.session.theme() == "dark" { Color::Cyan } else { Color::Blue };
        let mut spans = vec![Span::styled(
            " DPDP Shield ",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )];
        for (i, tab) in Tab::ALL.iter().enumerate() {
            let style = if *tab == self.tab {
                Style::default().fg(accent).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!(" {}:{} ", i + 1, tab.title()), style));
        }
        let status_style = if self.breach.active && !self.breach.closed {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(
            format!(" {} ", breach_status_label(&self.breach)),
            status_style,
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.toast {
            Some(toast) => Line::styled(
                format!(" {}", toast.text),
                Style::default().fg(if toast.is_error { Color::Red } else { Color::Green }),
            ),
            None => Line::styled(
                format!(
                    " {}  |  1-8/Tab switch  T theme  L logout  q quit",
                    self.session.admin_email()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Header status pill text. The incident id shows only for an open breach.
fn breach_status_label(breach: &BreachState) -> String {
    if breach.active && !breach.closed {
        format!("ACTIVE BREACH - {}", breach.incident_id.as_deref().unwrap_or("-"))
    } else {
        "SYSTEM SECURE".to_string()
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Open the dashboard and block until the user quits.
pub async fn run(config: Config) -> Result<()> {
    let session = SessionStore::load(&config.server.data_dir);
    let api = Arc::new(ApiClient::new(
        &config.server.base_url,
        config.server.request_timeout_secs,
        Arc::clone(&session),
    )?);

    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout)).context("Failed to build terminal")?;

    let result = run_loop(&mut terminal, api, session, config).await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    config: Config,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (breach_tx, mut breach_rx) = watch::channel(BreachState::default());
    let mut app = App::new(api, session, config, tx, breach_tx);
    if app.authenticated {
        app.start_poller();
        app.fetch_tab();
    }

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    loop {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => app.handle_key(key),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e).context("Terminal event stream failed"),
                    None => break,
                }
            }
            Some(envelope) = rx.recv() => app.handle_envelope(envelope),
            changed = breach_rx.changed() => {
                if changed.is_ok() {
                    app.breach = breach_rx.borrow_and_update().clone();
                }
            }
            _ = tick.tick() => app.on_tick(),
        }

        if app.should_quit {
            break;
        }
    }

    app.stop_poller();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_app(base_url: &str, data_dir: &Path) -> (App, mpsc::UnboundedReceiver<Envelope>) {
        let session = SessionStore::load(data_dir);
        let api = Arc::new(ApiClient::new(base_url, 5, Arc::clone(&session)).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let (breach_tx, _breach_rx) = watch::channel(BreachState::default());
        let mut config = Config::default();
        config.server.base_url = base_url.to_string();
        config.server.data_dir = data_dir.to_path_buf();
        (App::new(api, session, config, tx, breach_tx), rx)
    }

    #[test]
    fn test_tab_cycle_is_closed() {
        let mut tab = Tab::CommandCenter;
        for _ in 0..Tab::ALL.len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::CommandCenter);
        assert_eq!(Tab::CommandCenter.prev(), Tab::Settings);
        assert_eq!(Tab::Settings.next(), Tab::CommandCenter);
    }

    #[tokio::test]
    async fn test_poller_follows_session_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = test_app("http://localhost:8000", dir.path());
        assert!(app.poller_cancel.is_none());

        app.handle_msg(Msg::LoginDone(Ok(())));
        let token = app
            .poller_cancel
            .clone()
            .unwrap_or_else(|| panic!("poller not started on login"));
        assert!(!token.is_cancelled());

        app.logout();
        assert!(app.poller_cancel.is_none());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_breach_trigger_success_routes_to_war_room() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = test_app("http://localhost:8000", dir.path());
        app.authenticated = true;
        assert_eq!(app.tab, Tab::CommandCenter);

        app.handle_msg(Msg::Triggered(Ok("Breach protocol triggered: INC-1".to_string())));
        assert_eq!(app.tab, Tab::WarRoom);
        assert!(!app.command_center.in_flight);
    }

    #[tokio::test]
    async fn test_stats_poll_interval_tracks_breach_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = test_app("http://localhost:8000", dir.path());
        assert_eq!(app.stats_interval(), Duration::from_secs(10));

        app.breach.active = true;
        assert_eq!(app.stats_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_header_status_label() {
        let mut breach = BreachState::default();
        assert_eq!(breach_status_label(&breach), "SYSTEM SECURE");

        breach.active = true;
        breach.incident_id = Some("INC-482".to_string());
        assert_eq!(breach_status_label(&breach), "ACTIVE BREACH - INC-482");

        breach.closed = true;
        assert_eq!(breach_status_label(&breach), "SYSTEM SECURE");
    }

    #[tokio::test]
    async fn test_audit_report_action_downloads_pdf() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let (content_type, body) = if request.starts_with("POST /api/pdf/audit-report") {
                    (
                        "application/json",
                        br#"{"ok": true, "report_id": "RPT-9", "filename": "audit_report.pdf"}"#
                            .to_vec(),
                    )
                } else {
                    ("application/pdf", b"%PDF-1.4 audit".to_vec())
                };
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    content_type,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = test_app(&format!("http://{}", addr), dir.path());
        app.authenticated = true;
        app.execute(Action::GenerateAuditReport);

        let envelope = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match envelope.msg {
            Msg::ActionDone(Ok(text)) => assert!(text.contains("audit_report.pdf")),
            Msg::ActionDone(Err(e)) => panic!("action failed: {}", e),
            _ => panic!("unexpected message"),
        }
        assert!(dir.path().join("audit_report.pdf").exists());
    }
}
