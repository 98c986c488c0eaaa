//! Typed client for the DPDP Shield backend REST API.
//!
//! All endpoints live under `<base_url>/api` and are authenticated with a
//! bearer token read from the session store on every request, so a login or
//! logout is picked up without rebuilding the client. The client performs no
//! retries; failure handling is the caller's concern.

pub mod error;
pub mod models;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::session::SessionStore;
use error::{ApiError, ApiResult};
use models::*;

pub struct ApiClient {
    http: Client,
    base: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_secs: u64, session: Arc<SessionStore>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base: format!("{}/api", base_url.trim_end_matches('/')),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut rb = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(token) = self.session.token() {
            rb = rb.bearer_auth(token);
        }
        rb
    }

    async fn send<T: DeserializeOwned>(&self, rb: RequestBuilder) -> ApiResult<T> {
        let response = rb.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        response.json().await.map_err(ApiError::decode)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.post(
            "/auth/login",
            &LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    pub async fn logout(&self, session_id: &str) -> ApiResult<Ack> {
        self.post("/auth/logout", &serde_json::json!({ "session_id": session_id }))
            .await
    }

    // ------------------------------------------------------------------------
    // Breach lifecycle
    // ------------------------------------------------------------------------

    pub async fn breach_status(&self) -> ApiResult<BreachState> {
        self.get("/breach/status").await
    }

    pub async fn trigger_breach(&self, req: &BreachTriggerRequest) -> ApiResult<TriggerResponse> {
        self.post("/breach/trigger", req).await
    }

    pub async fn confirm_containment(&self) -> ApiResult<Ack> {
        self.post("/breach/contain", &serde_json::json!({})).await
    }

    pub async fn generate_dpb_notice(&self) -> ApiResult<ReportAck> {
        self.post("/breach/dpb-notice", &serde_json::json!({})).await
    }

    pub async fn notify_users(&self, channel: &str) -> ApiResult<NotifyResponse> {
        self.post(
            "/breach/notify-users",
            &BroadcastRequest {
                channel: channel.to_string(),
                message: String::new(),
            },
        )
        .await
    }

    pub async fn close_breach(&self) -> ApiResult<ReportAck> {
        self.post("/breach/close", &serde_json::json!({})).await
    }

    pub async fn reset_breach(&self) -> ApiResult<Ack> {
        self.post("/breach/reset", &serde_json::json!({})).await
    }

    // ------------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------------

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get("/dashboard/stats").await
    }

    // ------------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------------

    pub async fn customers(&self) -> ApiResult<Vec<Customer>> {
        self.get("/customers").await
    }

    pub async fn create_customer(&self, req: &CustomerCreate) -> ApiResult<Customer> {
        self.post("/customers", req).await
    }

    pub async fn update_customer(&self, id: &str, req: &CustomerUpdate) -> ApiResult<Customer> {
        self.put(&format!("/customers/{}", id), req).await
    }

    pub async fn delete_customer(&self, id: &str) -> ApiResult<DeleteAck> {
        self.send(self.request(Method::DELETE, &format!("/customers/{}", id)))
            .await
    }

    // ------------------------------------------------------------------------
    // Mailbox
    // ------------------------------------------------------------------------

    pub async fn inbox(&self) -> ApiResult<InboxResponse> {
        self.get("/emails").await
    }

    pub async fn mail_replies(&self) -> ApiResult<Vec<MailReply>> {
        self.get("/mail-replies").await
    }

    pub async fn mail_connection_status(&self) -> ApiResult<ConnectionStatus> {
        self.get("/emails/connection-status").await
    }

    pub async fn process_email(&self, email: &Email) -> ApiResult<ProcessOutcome> {
        self.post(
            "/emails/process",
            &EmailProcessRequest {
                email_id: email.id.clone(),
                from_email: email.from_email.clone(),
                subject: email.subject.clone(),
                body: email.body.clone(),
                received_at: email.received_at.clone(),
            },
        )
        .await
    }

    pub async fn verify_otp(&self, request_id: &str, otp: &str) -> ApiResult<VerifyOutcome> {
        self.post(
            "/emails/verify-otp",
            &OtpVerifyRequest {
                request_id: request_id.to_string(),
                otp: otp.to_string(),
            },
        )
        .await
    }

    pub async fn apply_correction(&self, req: &CorrectionRequest) -> ApiResult<CorrectionOutcome> {
        self.post("/emails/apply-correction", req).await
    }

    // ------------------------------------------------------------------------
    // Reports, attack vector, evidence
    // ------------------------------------------------------------------------

    pub async fn reports(&self) -> ApiResult<Vec<Report>> {
        self.get("/reports").await
    }

    pub async fn attack_vector(&self) -> ApiResult<VectorAnalysis> {
        self.get("/attack-vector").await
    }

    pub async fn attack_vector_pdf(&self) -> ApiResult<ReportAck> {
        self.post("/attack-vector/pdf", &serde_json::json!({})).await
    }

    pub async fn evidence_timeline(&self) -> ApiResult<EvidenceTimeline> {
        self.get("/evidence/timeline").await
    }

    pub async fn encryption_demo(&self) -> ApiResult<EncryptionDemo> {
        self.get("/evidence/encryption-demo").await
    }

    pub async fn generate_audit_report(&self) -> ApiResult<ReportAck> {
        self.post("/pdf/audit-report", &serde_json::json!({})).await
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub async fn settings(&self) -> ApiResult<AppSettings> {
        self.get("/settings").await
    }

    pub async fn update_settings(&self, settings: &AppSettings) -> ApiResult<Ack> {
        self.put("/settings", settings).await
    }

    pub async fn set_gmail_password(&self, password: &str) -> ApiResult<GmailPasswordAck> {
        self.post(
            "/settings/gmail-password",
            &GmailPasswordRequest {
                password: password.to_string(),
            },
        )
        .await
    }

    // ------------------------------------------------------------------------
    // File downloads
    // ------------------------------------------------------------------------

    /// Download a generated PDF into `dest_dir`, returning the local path.
    pub async fn download_pdf(&self, filename: &str, dest_dir: &Path) -> ApiResult<std::path::PathBuf> {
        self.download(&format!("/pdf/{}", filename), filename, dest_dir)
            .await
    }

    /// Download one of the backend's CSV exports into `dest_dir`.
    pub async fn download_csv(&self, filename: &str, dest_dir: &Path) -> ApiResult<std::path::PathBuf> {
        self.download(&format!("/csv/{}", filename), filename, dest_dir)
            .await
    }

    async fn download(
        &self,
        path: &str,
        filename: &str,
        dest_dir: &Path,
    ) -> ApiResult<std::path::PathBuf> {
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        let bytes = response.bytes().await?;
        let dest = dest_dir.join(filename);
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| ApiError::decode(format!("failed to write {}: {}", dest.display(), e)))?;
        Ok(dest)
    }
}
