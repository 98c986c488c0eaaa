//! CLI module for the DPDP Shield command-line interface.
//!
//! Provides subcommands for driving the incident-response backend without
//! the dashboard:
//! - `login` / `logout` - Manage the admin session
//! - `status` - Show backend stats and breach summary
//! - `breach ...` - Walk the breach lifecycle (trigger through close)
//! - `customers ...` - Manage the customer registry
//! - `mailbox ...` - Process DPDP request emails, verify OTPs, corrections
//! - `reports` - List the dispatch log with filters
//! - `vector ...` / `evidence ...` - Forensics views and PDF generation
//! - `settings ...` - Inspect and adjust backend settings

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::models::*;
use crate::api::ApiClient;
use crate::config::Config;
use crate::session::SessionStore;
use crate::ui::format::{dpb_countdown, short_time, truncate};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "dpdp-shield")]
#[command(author, version, about = "Incident-response console for DPDP breach handling", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dpdp-shield.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL to connect to (overrides the config file)
    #[arg(long, env = "DPDP_SHIELD_API_URL")]
    pub api_url: Option<String>,

    /// Subcommand to run (if none, opens the dashboard)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate against the backend and store the session
    Login {
        /// Admin email
        email: String,
        /// Admin password
        password: String,
    },

    /// Invalidate the server session and clear stored credentials
    Logout,

    /// Show backend stats and the current breach summary
    Status,

    /// Breach lifecycle commands
    #[command(subcommand)]
    Breach(BreachCommands),

    /// Customer registry commands
    #[command(subcommand)]
    Customers(CustomerCommands),

    /// DPDP request mailbox commands
    #[command(subcommand)]
    Mailbox(MailboxCommands),

    /// List sent reports
    Reports {
        /// Filter by report type (e.g. DPB_NOTICE, DATA_EXPORT, AUDIT_REPORT)
        #[arg(long = "type")]
        report_type: Option<String>,
        /// Filter by delivery status (e.g. SENT, FAILED)
        #[arg(long)]
        status: Option<String>,
        /// Free-text search over id, recipient, customer, incident, filename
        #[arg(long)]
        query: Option<String>,
        /// Download the dispatch log CSV into the data directory
        #[arg(long)]
        export: bool,
    },

    /// Attack vector analysis commands
    #[command(subcommand)]
    Vector(VectorCommands),

    /// Evidence locker commands
    #[command(subcommand)]
    Evidence(EvidenceCommands),

    /// Backend settings commands
    #[command(subcommand)]
    Settings(SettingsCommands),
}

/// Breach subcommands
#[derive(Subcommand, Debug)]
pub enum BreachCommands {
    /// Show the current breach state and timeline
    Status,
    /// Trigger the breach protocol
    Trigger {
        /// Nature of the breach
        #[arg(long)]
        nature: Option<String>,
        /// Affected systems
        #[arg(long)]
        systems: Option<String>,
        /// Data categories involved
        #[arg(long)]
        categories: Option<String>,
        /// Number of affected users
        #[arg(long)]
        affected_count: Option<i64>,
        /// Incident description
        #[arg(long)]
        description: Option<String>,
    },
    /// Confirm containment (step 2)
    Contain,
    /// Generate and send the DPB notice (step 3)
    DpbNotice {
        /// Download the generated PDF into the data directory
        #[arg(long)]
        download: bool,
    },
    /// Broadcast breach notices to all affected users (step 4)
    NotifyUsers {
        /// Delivery channel: EMAIL, SMS, or WHATSAPP
        #[arg(long, default_value = "EMAIL")]
        channel: String,
    },
    /// Close the incident and generate the closure report (step 5)
    Close {
        /// Download the closure report PDF into the data directory
        #[arg(long)]
        download: bool,
    },
    /// Reset the breach simulation to the idle state
    Reset,
}

/// Customer subcommands
#[derive(Subcommand, Debug)]
pub enum CustomerCommands {
    /// List customers
    List {
        /// Substring filter over id, name, email, phone
        #[arg(long)]
        query: Option<String>,
    },
    /// Add a customer
    Add {
        name: String,
        email: String,
        phone: String,
    },
    /// Update a customer (only the given fields change)
    Update {
        /// Customer ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// ACTIVE or INACTIVE
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a customer
    Delete {
        /// Customer ID
        id: String,
    },
    /// Download the customer registry CSV into the data directory
    Export,
}

/// Mailbox subcommands
#[derive(Subcommand, Debug)]
pub enum MailboxCommands {
    /// List inbox emails
    List,
    /// List processed request records
    Replies,
    /// Run an inbox email through intent detection
    Process {
        /// Email ID from `mailbox list`
        email_id: String,
    },
    /// Verify the OTP for a pending request
    VerifyOtp {
        /// Request ID returned by `mailbox process`
        request_id: String,
        /// Six-digit OTP
        otp: String,
    },
    /// Apply a correction for a verified CORRECTION request
    ApplyCorrection {
        /// Request ID
        request_id: String,
        /// Customer ID
        customer_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

/// Vector subcommands
#[derive(Subcommand, Debug)]
pub enum VectorCommands {
    /// Show the attack vector analysis
    Show,
    /// Generate the vector analysis PDF
    Pdf {
        /// Download the generated PDF into the data directory
        #[arg(long)]
        download: bool,
    },
}

/// Evidence subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Show the consolidated evidence timeline
    Timeline,
    /// Show the encryption-at-rest proof (raw vs decrypted rows)
    EncryptionDemo,
    /// Generate the full audit report PDF
    AuditReport {
        /// Download the generated PDF into the data directory
        #[arg(long)]
        download: bool,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show backend settings
    Show,
    /// Toggle an attack simulation flag or integration by key
    Toggle {
        /// One of sim_leaked_api_key, sim_mailbox_forwarding,
        /// sim_mass_download, or an integration name
        key: String,
    },
    /// Store the Gmail app password used for real email dispatch
    GmailPassword {
        password: String,
    },
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(commands: &Commands, config: &Config) -> Result<()> {
    let session = SessionStore::load(&config.server.data_dir);
    let api = ApiClient::new(
        &config.server.base_url,
        config.server.request_timeout_secs,
        Arc::clone(&session),
    )?;

    match commands {
        Commands::Login { email, password } => cmd_login(&api, &session, email, password).await,
        Commands::Logout => cmd_logout(&api, &session).await,
        Commands::Status => cmd_status(&api).await,
        Commands::Breach(cmd) => run_breach_command(&api, config, cmd).await,
        Commands::Customers(cmd) => run_customer_command(&api, config, cmd).await,
        Commands::Mailbox(cmd) => run_mailbox_command(&api, cmd).await,
        Commands::Reports {
            report_type,
            status,
            query,
            export,
        } => {
            cmd_reports(
                &api,
                config,
                report_type.as_deref().unwrap_or(""),
                status.as_deref().unwrap_or(""),
                query.as_deref().unwrap_or(""),
                *export,
            )
            .await
        }
        Commands::Vector(cmd) => run_vector_command(&api, config, cmd).await,
        Commands::Evidence(cmd) => run_evidence_command(&api, config, cmd).await,
        Commands::Settings(cmd) => run_settings_command(&api, cmd).await,
    }
}

async fn cmd_login(
    api: &ApiClient,
    session: &Arc<SessionStore>,
    email: &str,
    password: &str,
) -> Result<()> {
    session.login(api, email, password).await?;
    println!("[OK] Logged in as {}", session.admin_email());
    Ok(())
}

async fn cmd_logout(api: &ApiClient, session: &Arc<SessionStore>) -> Result<()> {
    if !session.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    session.logout(api).await;
    println!("[OK] Logged out.");
    Ok(())
}

/// Display backend stats and breach summary
async fn cmd_status(api: &ApiClient) -> Result<()> {
    println!("Connecting to {}...", api.base_url());

    let stats = api.dashboard_stats().await?;
    let breach = api.breach_status().await?;

    println!();
    println!("=== DPDP Shield Status ===");
    println!();
    println!("Customers:  {}/{} active", stats.active_customers, stats.total_customers);
    println!("Reports:    {}", stats.total_reports);
    println!("Requests:   {}", stats.total_requests);
    println!();

    if breach.active {
        let icon = if breach.closed { "[OK]" } else { "[!!]" };
        println!(
            "Breach:     {} {} (step {}/5)",
            icon,
            breach.incident_id.as_deref().unwrap_or("-"),
            breach.step
        );
        if !breach.closed {
            println!("DPB window: {} remaining", dpb_countdown(breach.discovery_time.as_deref()));
        }
    } else {
        println!("Breach:     [OK] No active incident");
    }

    println!();
    Ok(())
}

// ============================================================================
// Breach lifecycle
// ============================================================================

async fn run_breach_command(api: &ApiClient, config: &Config, cmd: &BreachCommands) -> Result<()> {
    match cmd {
        BreachCommands::Status => cmd_breach_status(api).await,
        BreachCommands::Trigger {
            nature,
            systems,
            categories,
            affected_count,
            description,
        } => {
            let defaults = BreachTriggerRequest::default();
            let req = BreachTriggerRequest {
                nature: nature.clone().unwrap_or(defaults.nature),
                systems: systems.clone().unwrap_or(defaults.systems),
                categories: categories.clone().unwrap_or(defaults.categories),
                affected_count: affected_count.unwrap_or(defaults.affected_count),
                description: description.clone().unwrap_or(defaults.description),
            };
            let resp = api.trigger_breach(&req).await?;
            println!("[!!] Breach protocol triggered.");
            println!();
            println!("Incident ID:    {}", resp.incident_id);
            println!("Discovery time: {}", resp.discovery_time);
            println!("DPB window:     {} remaining", dpb_countdown(Some(&resp.discovery_time)));
            Ok(())
        }
        BreachCommands::Contain => {
            api.confirm_containment().await?;
            println!("[OK] Containment confirmed.");
            Ok(())
        }
        BreachCommands::DpbNotice { download } => {
            let ack = api.generate_dpb_notice().await?;
            println!("[OK] DPB notice sent (report {}).", ack.report_id);
            maybe_download_pdf(api, config, ack.filename.as_deref(), *download).await
        }
        BreachCommands::NotifyUsers { channel } => {
            let resp = api.notify_users(channel).await?;
            println!("[OK] Notified {} users via {}.", resp.count, channel);
            if resp.real_email_sent {
                println!("     A real notification email was dispatched.");
            }
            Ok(())
        }
        BreachCommands::Close { download } => {
            let ack = api.close_breach().await?;
            println!("[OK] Incident closed (report {}).", ack.report_id);
            maybe_download_pdf(api, config, ack.filename.as_deref(), *download).await
        }
        BreachCommands::Reset => {
            api.reset_breach().await?;
            println!("[OK] Breach simulation reset.");
            Ok(())
        }
    }
}

async fn cmd_breach_status(api: &ApiClient) -> Result<()> {
    let breach = api.breach_status().await?;

    if !breach.active {
        println!("No active breach incident.");
        return Ok(());
    }

    println!();
    println!("=== Breach Incident: {} ===", breach.incident_id.as_deref().unwrap_or("-"));
    println!();
    println!("Nature:      {}", breach.nature);
    println!("Systems:     {}", breach.systems);
    println!("Categories:  {}", breach.categories);
    println!("Affected:    {} users", breach.affected_count);
    println!("Discovered:  {}", breach.discovery_time.as_deref().unwrap_or("-"));
    println!("Step:        {}/5", breach.step);
    println!("Contained:   {}", yes_no(breach.containment_confirmed));
    println!("DPB sent:    {}", yes_no(breach.dpb_sent));
    println!("Users told:  {}", yes_no(breach.users_notified));

    if breach.closed {
        println!("Closed:      {}", breach.closed_at.as_deref().unwrap_or("-"));
    } else {
        println!("DPB window:  {} remaining", dpb_countdown(breach.discovery_time.as_deref()));
    }

    if !breach.timeline.is_empty() {
        println!();
        println!("Timeline:");
        for event in &breach.timeline {
            println!("  {}  [{}] {}", short_time(&event.time), event.kind, event.event);
        }
    }

    println!();
    Ok(())
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

// ============================================================================
// Customers
// ============================================================================

async fn run_customer_command(
    api: &ApiClient,
    config: &Config,
    cmd: &CustomerCommands,
) -> Result<()> {
    match cmd {
        CustomerCommands::List { query } => {
            let customers = api.customers().await?;
            let query = query.as_deref().unwrap_or("");
            let filtered: Vec<_> = customers.iter().filter(|c| c.matches(query)).collect();

            if filtered.is_empty() {
                println!("No customers found.");
                return Ok(());
            }

            println!();
            println!(
                "{:<12}  {:<24}  {:<32}  {:<16}  {:<8}",
                "ID", "NAME", "EMAIL", "PHONE", "STATUS"
            );
            println!("{}", "-".repeat(100));
            for c in filtered {
                println!(
                    "{:<12}  {:<24}  {:<32}  {:<16}  {:<8}",
                    c.customer_id,
                    truncate(&c.name, 24),
                    truncate(&c.email, 32),
                    truncate(&c.phone, 16),
                    c.status
                );
            }
            println!();
            Ok(())
        }
        CustomerCommands::Add { name, email, phone } => {
            let customer = api
                .create_customer(&CustomerCreate {
                    name: name.clone(),
                    email: email.clone(),
                    phone: phone.clone(),
                })
                .await?;
            println!("[OK] Created customer {} ({}).", customer.customer_id, customer.name);
            Ok(())
        }
        CustomerCommands::Update {
            id,
            name,
            email,
            phone,
            status,
        } => {
            let customer = api
                .update_customer(
                    id,
                    &CustomerUpdate {
                        name: name.clone(),
                        email: email.clone(),
                        phone: phone.clone(),
                        status: status.clone(),
                    },
                )
                .await?;
            println!("[OK] Updated customer {}.", customer.customer_id);
            Ok(())
        }
        CustomerCommands::Delete { id } => {
            let ack = api.delete_customer(id).await?;
            println!("[OK] Deleted customer {}.", ack.customer_id);
            Ok(())
        }
        CustomerCommands::Export => {
            let dest = api.download_csv("customers.csv", &config.server.data_dir).await?;
            println!("[OK] Exported customer registry to {}", dest.display());
            Ok(())
        }
    }
}

// ============================================================================
// Mailbox
// ============================================================================

async fn run_mailbox_command(api: &ApiClient, cmd: &MailboxCommands) -> Result<()> {
    match cmd {
        MailboxCommands::List => {
            let inbox = api.inbox().await?;
            if !inbox.connected {
                println!(
                    "[!!] Mailbox not connected: {}",
                    inbox.error.as_deref().unwrap_or("unknown error")
                );
            }
            if inbox.emails.is_empty() {
                println!("Inbox is empty.");
                return Ok(());
            }

            println!();
            println!("{:<12}  {:<30}  {:<40}  {:<20}", "ID", "FROM", "SUBJECT", "RECEIVED");
            println!("{}", "-".repeat(110));
            for email in &inbox.emails {
                println!(
                    "{:<12}  {:<30}  {:<40}  {:<20}",
                    email.id,
                    truncate(&email.from_email, 30),
                    truncate(&email.subject, 40),
                    email.received_at
                );
            }
            println!();
            Ok(())
        }
        MailboxCommands::Replies => {
            let replies = api.mail_replies().await?;
            if replies.is_empty() {
                println!("No processed requests.");
                return Ok(());
            }

            println!();
            println!(
                "{:<14}  {:<12}  {:<12}  {:<10}  {:<12}",
                "REQUEST", "CUSTOMER", "INTENT", "OTP", "ACTION"
            );
            println!("{}", "-".repeat(70));
            for r in &replies {
                println!(
                    "{:<14}  {:<12}  {:<12}  {:<10}  {:<12}",
                    r.request_id, r.customer_id, r.intent, r.otp_status, r.action_status
                );
            }
            println!();
            Ok(())
        }
        MailboxCommands::Process { email_id } => {
            let inbox = api.inbox().await?;
            let email = inbox
                .emails
                .iter()
                .find(|e| e.id == *email_id)
                .ok_or_else(|| anyhow::anyhow!("No inbox email with id '{}'", email_id))?;

            let outcome = api.process_email(email).await?;
            println!("Status:  {}", outcome.status);
            println!("Message: {}", outcome.message);
            if outcome.status == "OTP_SENT" {
                println!();
                println!(
                    "OTP sent to {}. Verify with:",
                    outcome.otp_sent_to.as_deref().unwrap_or("the customer")
                );
                println!("  dpdp-shield mailbox verify-otp {} <otp>", outcome.request_id);
            }
            Ok(())
        }
        MailboxCommands::VerifyOtp { request_id, otp } => {
            let outcome = api.verify_otp(request_id, otp).await?;
            if !outcome.verified {
                anyhow::bail!("OTP verification failed for request {}", request_id);
            }
            println!("[OK] Identity verified ({} request).", outcome.intent);
            if let Some(action) = &outcome.action {
                println!("Action: {}", action);
            }
            if let Some(filename) = &outcome.filename {
                println!("Generated: {}", filename);
            }
            if outcome.needs_correction_data {
                println!();
                println!("Correction data required. Apply with:");
                println!(
                    "  dpdp-shield mailbox apply-correction {} {} --name ... --email ... --phone ...",
                    request_id, outcome.customer_id
                );
            }
            Ok(())
        }
        MailboxCommands::ApplyCorrection {
            request_id,
            customer_id,
            name,
            email,
            phone,
        } => {
            if name.is_none() && email.is_none() && phone.is_none() {
                anyhow::bail!("Provide at least one of --name, --email, --phone");
            }
            let outcome = api
                .apply_correction(&CorrectionRequest {
                    request_id: request_id.clone(),
                    customer_id: customer_id.clone(),
                    new_name: name.clone(),
                    new_email: email.clone(),
                    new_phone: phone.clone(),
                })
                .await?;
            println!("[OK] Correction applied (report {}).", outcome.report_id);
            Ok(())
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

async fn cmd_reports(
    api: &ApiClient,
    config: &Config,
    type_filter: &str,
    status_filter: &str,
    query: &str,
    export: bool,
) -> Result<()> {
    if export {
        let dest = api.download_csv("reports_sent.csv", &config.server.data_dir).await?;
        println!("[OK] Exported dispatch log to {}", dest.display());
        return Ok(());
    }

    let reports = api.reports().await?;
    let filtered: Vec<_> = reports
        .iter()
        .filter(|r| r.matches(type_filter, status_filter, query))
        .collect();

    if filtered.is_empty() {
        println!("No reports match.");
        return Ok(());
    }

    println!();
    println!(
        "{:<12}  {:<16}  {:<28}  {:<10}  {:<20}",
        "ID", "TYPE", "RECIPIENT", "STATUS", "GENERATED"
    );
    println!("{}", "-".repeat(95));
    for r in filtered {
        println!(
            "{:<12}  {:<16}  {:<28}  {:<10}  {:<20}",
            r.report_id,
            truncate(&r.report_type, 16),
            truncate(&r.recipient, 28),
            r.delivery_status,
            truncate(&r.generated_at, 20)
        );
    }
    println!();
    Ok(())
}

// ============================================================================
// Forensics
// ============================================================================

async fn run_vector_command(api: &ApiClient, config: &Config, cmd: &VectorCommands) -> Result<()> {
    match cmd {
        VectorCommands::Show => {
            let analysis = api.attack_vector().await?;

            println!();
            println!("=== Attack Vector Analysis ===");
            println!();
            println!("Likely source: {} ({} confidence)", analysis.likely_source, analysis.confidence);
            println!();
            println!("API surface ({}):", analysis.api_status);
            for signal in &analysis.api_signals {
                print_signal(signal);
            }
            println!();
            println!("Email surface ({}):", analysis.email_status);
            for signal in &analysis.email_signals {
                print_signal(signal);
            }
            if !analysis.findings.is_empty() {
                println!();
                println!("Findings:");
                for finding in &analysis.findings {
                    println!("  - {}", finding);
                }
            }
            println!();
            Ok(())
        }
        VectorCommands::Pdf { download } => {
            let ack = api.attack_vector_pdf().await?;
            println!("[OK] Vector analysis PDF generated (report {}).", ack.report_id);
            maybe_download_pdf(api, config, ack.filename.as_deref(), *download).await
        }
    }
}

fn print_signal(signal: &Signal) {
    let icon = if signal.ok { "[OK]" } else { "[!!]" };
    println!("  {} {:<40} {}", icon, signal.label, signal.severity);
}

async fn run_evidence_command(
    api: &ApiClient,
    config: &Config,
    cmd: &EvidenceCommands,
) -> Result<()> {
    match cmd {
        EvidenceCommands::Timeline => {
            let evidence = api.evidence_timeline().await?;
            if evidence.timeline.is_empty() {
                println!("No evidence recorded.");
                return Ok(());
            }
            println!();
            println!("=== Evidence Timeline ({} reports) ===", evidence.reports_count);
            println!();
            for event in &evidence.timeline {
                println!("  {}  [{}] {}", short_time(&event.time), event.kind, event.event);
            }
            println!();
            Ok(())
        }
        EvidenceCommands::EncryptionDemo => {
            let demo = api.encryption_demo().await?;
            println!();
            println!("Encrypted at rest ({} rows):", demo.raw.len());
            for c in demo.raw.iter().take(5) {
                println!("  {:<12}  {}", c.customer_id, truncate(&c.email, 60));
            }
            println!();
            println!("Decrypted view:");
            for c in demo.decrypted.iter().take(5) {
                println!("  {:<12}  {:<24}  {}", c.customer_id, truncate(&c.name, 24), c.email);
            }
            println!();
            Ok(())
        }
        EvidenceCommands::AuditReport { download } => {
            let ack = api.generate_audit_report().await?;
            println!("[OK] Audit report generated (report {}).", ack.report_id);
            maybe_download_pdf(api, config, ack.filename.as_deref(), *download).await
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

async fn run_settings_command(api: &ApiClient, cmd: &SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = api.settings().await?;
            println!();
            println!("Theme:                {}", settings.theme);
            println!("Sim leaked API key:   {}", yes_no(settings.sim_leaked_api_key));
            println!("Sim mail forwarding:  {}", yes_no(settings.sim_mailbox_forwarding));
            println!("Sim mass download:    {}", yes_no(settings.sim_mass_download));
            if !settings.integrations.is_empty() {
                println!();
                println!("Integrations:");
                for (name, enabled) in &settings.integrations {
                    println!("  {:<20} {}", name, if *enabled { "connected" } else { "off" });
                }
            }
            println!();
            Ok(())
        }
        SettingsCommands::Toggle { key } => {
            let mut settings = api.settings().await?;
            let new_value = match key.as_str() {
                "sim_leaked_api_key" => {
                    settings.sim_leaked_api_key = !settings.sim_leaked_api_key;
                    settings.sim_leaked_api_key
                }
                "sim_mailbox_forwarding" => {
                    settings.sim_mailbox_forwarding = !settings.sim_mailbox_forwarding;
                    settings.sim_mailbox_forwarding
                }
                "sim_mass_download" => {
                    settings.sim_mass_download = !settings.sim_mass_download;
                    settings.sim_mass_download
                }
                other => {
                    let current = settings.integrations.get(other).copied().unwrap_or(false);
                    settings.integrations.insert(other.to_string(), !current);
                    !current
                }
            };
            api.update_settings(&settings).await?;
            println!("[OK] {} is now {}.", key, if new_value { "on" } else { "off" });
            Ok(())
        }
        SettingsCommands::GmailPassword { password } => {
            let ack = api.set_gmail_password(password).await?;
            if ack.ok {
                println!("[OK] Gmail app password stored.");
            } else {
                anyhow::bail!(
                    "Failed to store password: {}",
                    ack.error.as_deref().unwrap_or("unknown error")
                );
            }
            Ok(())
        }
    }
}

async fn maybe_download_pdf(
    api: &ApiClient,
    config: &Config,
    filename: Option<&str>,
    download: bool,
) -> Result<()> {
    if let Some(filename) = filename {
        println!("PDF: {}", filename);
        if download {
            let dest = api.download_pdf(filename, &config.server.data_dir).await?;
            println!("[OK] Downloaded to {}", dest.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_breach_trigger_flags() {
        let cli = Cli::parse_from([
            "dpdp-shield",
            "breach",
            "trigger",
            "--affected-count",
            "120",
            "--nature",
            "Credential stuffing",
        ]);
        match cli.command {
            Some(Commands::Breach(BreachCommands::Trigger {
                affected_count,
                nature,
                ..
            })) => {
                assert_eq!(affected_count, Some(120));
                assert_eq!(nature.as_deref(), Some("Credential stuffing"));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_opens_dashboard() {
        let cli = Cli::parse_from(["dpdp-shield"]);
        assert!(cli.command.is_none());
    }
}
