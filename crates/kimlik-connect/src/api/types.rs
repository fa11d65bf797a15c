//! Backend request/response shapes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authorize::AuthorizeParams;
use crate::i18n::Locale;

/// Public identity of an OAuth client application, as rendered on the
/// consent and charge pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSummary {
    /// Client identifier
    pub client_id: String,
    /// Display name
    pub name: String,
    /// Logo to render next to the consent prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Homepage of the application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

/// The authenticated user shown in the consent header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    /// User identifier
    pub id: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email, when the profile carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A scope definition with localized display strings. Static reference
/// data served by the backend; the client only renders it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScopeInfo {
    /// Canonical scope name (e.g. `wallet:charge`)
    pub name: String,
    /// Localized display names keyed by locale code
    #[serde(default)]
    pub display_name: HashMap<String, String>,
    /// Localized descriptions keyed by locale code
    #[serde(default)]
    pub description: HashMap<String, String>,
    /// Grouping category for the consent list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ScopeInfo {
    /// Display name for a locale, falling back to English, then to the
    /// canonical scope name.
    pub fn display_name_for(&self, locale: Locale) -> &str {
        self.display_name
            .get(locale.as_str())
            .or_else(|| self.display_name.get(Locale::En.as_str()))
            .map_or(self.name.as_str(), String::as_str)
    }

    /// Description for a locale with the same fallback chain; empty
    /// string when the backend provided none.
    pub fn description_for(&self, locale: Locale) -> &str {
        self.description
            .get(locale.as_str())
            .or_else(|| self.description.get(Locale::En.as_str()))
            .map_or("", String::as_str)
    }
}

/// Context for the authorize/consent page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsentContext {
    /// The requesting application
    pub client: ClientSummary,
    /// Requested scopes with display strings
    pub scopes: Vec<ScopeInfo>,
    /// The authenticated user
    pub user: UserSummary,
}

/// Charge lifecycle states. Transitions happen server-side; the client
/// only renders the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// Awaiting the user's decision
    Pending,
    /// Approved by the user (or auto-approved)
    Approved,
    /// Rejected by the user
    Rejected,
    /// Funds captured
    Completed,
    /// Deadline passed before a decision
    Expired,
}

/// A one-time payment authorization request against the user's wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Charge {
    /// Charge identifier
    pub id: String,
    /// Amount requested
    pub amount: f64,
    /// Currency code
    pub currency: String,
    /// Partner-provided description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current lifecycle state
    pub status: ChargeStatus,
    /// Decision deadline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Server-computed expiry flag; never re-derived client-side
    #[serde(default)]
    pub is_expired: bool,
    /// Server-computed approvability flag; never re-derived client-side
    #[serde(default)]
    pub can_approve: bool,
}

/// Wallet snapshot rendered on the charge and topup pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    /// Current balance
    pub balance: f64,
    /// Currency code
    pub currency: String,
    /// Server-computed "balance covers this charge" flag
    pub sufficient: bool,
}

/// Auto-approve preference for a client application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoApprovePreference {
    /// Whether future charges bypass interactive consent
    pub enabled: bool,
    /// Per-charge ceiling for auto-approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
}

/// Context for the charge-approval page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeContext {
    /// The charge awaiting a decision
    pub charge: Charge,
    /// The requesting application
    pub client: ClientSummary,
    /// The user's wallet
    pub wallet: Wallet,
    /// Existing auto-approve preference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<AutoApprovePreference>,
}

/// Context for the topup page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopupContext {
    /// The application requesting the topup
    pub client: ClientSummary,
    /// The user's wallet
    pub wallet: Wallet,
}

/// User profile returned by `/oauth/user`, scoped to granted scopes.
/// Fields outside the fixed set stay available in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// User identifier
    pub id: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email (requires the email scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Scope-dependent profile fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The user's consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Grant the requested access
    Allow,
    /// Refuse the requested access
    Deny,
}

/// The user's charge decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeDecision {
    /// Approve the charge
    Approve,
    /// Reject the charge
    Reject,
}

/// Body of a consent decision submission: the exact authorization
/// parameters plus the decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsentDecisionRequest {
    /// The parameters the context was fetched with
    #[serde(flatten)]
    pub params: AuthorizeParams,
    /// The user's decision
    pub decision: Decision,
}

/// Body of a charge decision submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeDecisionRequest {
    /// The user's decision
    pub decision: ChargeDecision,
    /// Advisory auto-approve ceiling, attached only to approvals; the
    /// backend is the sole authority on whether it takes effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_approve_limit: Option<f64>,
}

/// Redirect issued by the backend after a consent decision. On allow it
/// carries `code` and `state`; on deny an error indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRedirect {
    /// Where the consent window should send the user (or the opener)
    pub redirect_uri: String,
}

/// Result of creating a topup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopupReceipt {
    /// The charge created to settle the topup
    pub charge_id: String,
}
