//! Serde mirrors of the server-owned entities.
//!
//! All state here is computed by the backend; the client holds transient,
//! unvalidated copies and never enforces invariants on them. Unknown fields
//! are ignored and absent fields default, so a newer backend does not break
//! an older console.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub session_id: String,
    pub email: String,
}

// ============================================================================
// Breach lifecycle
// ============================================================================

/// Current breach incident state from `/breach/status`. Entirely
/// server-computed; the `step` integer drives the War Room stepper and the
/// boolean flags gate the action buttons.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BreachState {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub incident_id: Option<String>,
    /// ISO-8601 discovery timestamp; start of the 72-hour DPB window.
    #[serde(default)]
    pub discovery_time: Option<String>,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub systems: String,
    #[serde(default)]
    pub categories: String,
    #[serde(default)]
    pub affected_count: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub step: i64,
    #[serde(default)]
    pub containment_confirmed: bool,
    #[serde(default)]
    pub dpb_sent: bool,
    #[serde(default)]
    pub users_notified: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub event: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreachTriggerRequest {
    pub nature: String,
    pub systems: String,
    pub categories: String,
    pub affected_count: i64,
    pub description: String,
}

impl Default for BreachTriggerRequest {
    fn default() -> Self {
        Self {
            nature: "Unauthorized access to personal data".to_string(),
            systems: "Customer Database, Email Server".to_string(),
            categories: "Name, Email, Phone Number".to_string(),
            affected_count: 30,
            description: "A potential data breach has been detected involving unauthorized \
                          access to the customer database."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerResponse {
    pub ok: bool,
    pub incident_id: String,
    pub discovery_time: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastRequest {
    pub channel: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyResponse {
    pub ok: bool,
    pub count: i64,
    pub report_id: String,
    #[serde(default)]
    pub real_email_sent: bool,
}

/// Acknowledgement for actions that also produce a PDF (DPB notice, close,
/// audit report, vector analysis).
#[derive(Debug, Clone, Deserialize)]
pub struct ReportAck {
    pub ok: bool,
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_customers: i64,
    #[serde(default)]
    pub active_customers: i64,
    #[serde(default)]
    pub total_reports: i64,
    #[serde(default)]
    pub total_requests: i64,
    #[serde(default)]
    pub breach_active: bool,
    #[serde(default)]
    pub incident_id: Option<String>,
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }

    /// Case-insensitive substring match over id, name, email, and phone.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        self.customer_id.to_lowercase().contains(&q)
            || self.name.to_lowercase().contains(&q)
            || self.email.to_lowercase().contains(&q)
            || self.phone.to_lowercase().contains(&q)
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerCreate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Sparse update: only populated fields are sent.
#[derive(Debug, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAck {
    pub ok: bool,
    pub customer_id: String,
}

// ============================================================================
// Mailbox
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Email {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub received_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxResponse {
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request-processing record derived from an inbound email. Joined to inbox
/// entries by `request_id` (recorded client-side when a process call
/// returns), never by subject matching.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailReply {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub received_at: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub otp_status: String,
    #[serde(default)]
    pub action_taken: String,
    #[serde(default)]
    pub action_status: String,
    #[serde(default)]
    pub pdf_files: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailProcessRequest {
    pub email_id: String,
    pub from_email: String,
    pub subject: String,
    pub body: String,
    pub received_at: String,
}

/// Outcome of `/emails/process`. `OTP_SENT` means an OTP dialog should open
/// for the returned `request_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessOutcome {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub otp_sent_to: Option<String>,
    #[serde(default)]
    pub otp_for_demo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OtpVerifyRequest {
    pub request_id: String,
    pub otp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyOutcome {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub needs_correction_data: bool,
}

/// Sparse correction patch: only populated fields are sent.
#[derive(Debug, Serialize)]
pub struct CorrectionRequest {
    pub request_id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionOutcome {
    pub ok: bool,
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub incident_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub delivery_channel: String,
    #[serde(default)]
    pub delivery_status: String,
    #[serde(default)]
    pub pdf_filename: String,
    #[serde(default)]
    pub pdf_sha256: String,
    #[serde(default)]
    pub notes: String,
}

impl Report {
    /// Compose the type filter, status filter, and free-text query with AND
    /// semantics. Empty filters pass everything.
    pub fn matches(&self, type_filter: &str, status_filter: &str, query: &str) -> bool {
        if !type_filter.is_empty() && self.report_type != type_filter {
            return false;
        }
        if !status_filter.is_empty() && self.delivery_status != status_filter {
            return false;
        }
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        self.report_id.to_lowercase().contains(&q)
            || self.recipient.to_lowercase().contains(&q)
            || self.customer_id.to_lowercase().contains(&q)
            || self.incident_id.to_lowercase().contains(&q)
            || self.pdf_filename.to_lowercase().contains(&q)
    }
}

// ============================================================================
// Attack vector
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Signal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VectorAnalysis {
    #[serde(default)]
    pub api_signals: Vec<Signal>,
    #[serde(default)]
    pub email_signals: Vec<Signal>,
    #[serde(default)]
    pub api_status: String,
    #[serde(default)]
    pub email_status: String,
    #[serde(default)]
    pub likely_source: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub api_score: i64,
    #[serde(default)]
    pub email_score: i64,
}

// ============================================================================
// Evidence
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvidenceTimeline {
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub reports_count: i64,
}

/// Side-by-side encrypted/decrypted sample rows for the encryption proof
/// panel. Both views share the customer row shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncryptionDemo {
    #[serde(default)]
    pub raw: Vec<Customer>,
    #[serde(default)]
    pub decrypted: Vec<Customer>,
}

// ============================================================================
// Settings
// ============================================================================

/// Free-form configuration object round-tripped whole on every change
/// (last-write-wins). `extra` preserves fields this console does not model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub sim_leaked_api_key: bool,
    #[serde(default)]
    pub sim_mailbox_forwarding: bool,
    #[serde(default)]
    pub sim_mass_download: bool,
    #[serde(default)]
    pub integrations: BTreeMap<String, bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct GmailPasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GmailPasswordAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_state_tolerates_sparse_payload() {
        let state: BreachState = serde_json::from_str(r#"{"active": false}"#).unwrap();
        assert!(!state.active);
        assert_eq!(state.step, 0);
        assert!(state.incident_id.is_none());
        assert!(state.timeline.is_empty());
    }

    #[test]
    fn test_breach_state_full_payload() {
        let state: BreachState = serde_json::from_str(
            r#"{
                "active": true,
                "incident_id": "INC-482",
                "discovery_time": "2026-08-30T10:00:00+00:00",
                "nature": "Unauthorized access",
                "affected_count": 30,
                "step": 2,
                "containment_confirmed": true,
                "timeline": [{"time": "2026-08-30T10:00:00+00:00", "event": "Breach protocol triggered", "type": "trigger"}]
            }"#,
        )
        .unwrap();
        assert!(state.active);
        assert_eq!(state.incident_id.as_deref(), Some("INC-482"));
        assert_eq!(state.step, 2);
        assert!(state.containment_confirmed);
        assert_eq!(state.timeline[0].kind, "trigger");
    }

    #[test]
    fn test_customer_update_sparse_serialization() {
        let update = CustomerUpdate {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"email": "new@example.com"}));
    }

    #[test]
    fn test_correction_request_skips_empty_fields() {
        let req = CorrectionRequest {
            request_id: "REQ-1A2B3C4D".to_string(),
            customer_id: "CUST-0007".to_string(),
            new_name: None,
            new_email: None,
            new_phone: Some("+91-9999999999".to_string()),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("new_name"));
        assert!(!json.contains("new_email"));
        assert!(json.contains("new_phone"));
    }

    #[test]
    fn test_settings_round_trip_preserves_unknown_fields() {
        let raw = r#"{"theme": "dark", "sim_mass_download": true, "integrations": {"zoho": true}, "audit_retention_days": 90}"#;
        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        assert!(settings.sim_mass_download);
        assert_eq!(settings.integrations.get("zoho"), Some(&true));

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["audit_retention_days"], 90);
    }

    #[test]
    fn test_customer_query_matches_substring_case_insensitive() {
        let customer = Customer {
            customer_id: "CUST-0001".to_string(),
            name: "Alice Sharma".to_string(),
            email: "alice.sharma@example.com".to_string(),
            phone: "+91-9876543210".to_string(),
            ..Default::default()
        };
        assert!(customer.matches("ali"));
        assert!(customer.matches("SHARMA"));
        assert!(customer.matches("cust-0001"));
        assert!(customer.matches("98765"));
        assert!(customer.matches(""));
        assert!(!customer.matches("bob"));
    }

    #[test]
    fn test_report_filters_compose_with_and_semantics() {
        let report = Report {
            report_id: "RPT-0042".to_string(),
            report_type: "DPB_NOTICE".to_string(),
            delivery_status: "SENT".to_string(),
            recipient: "dpb@gov.in".to_string(),
            ..Default::default()
        };
        assert!(report.matches("", "", ""));
        assert!(report.matches("DPB_NOTICE", "", ""));
        assert!(report.matches("DPB_NOTICE", "SENT", "dpb"));
        assert!(!report.matches("DATA_EXPORT", "SENT", "dpb"));
        assert!(!report.matches("DPB_NOTICE", "FAILED", ""));
        assert!(!report.matches("DPB_NOTICE", "SENT", "nomatch"));
    }

    #[test]
    fn test_trigger_request_defaults_match_backend() {
        let req = BreachTriggerRequest::default();
        assert_eq!(req.affected_count, 30);
        assert_eq!(req.nature, "Unauthorized access to personal data");
    }
}
