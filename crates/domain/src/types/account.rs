//! Provider account projections

use serde::{Deserialize, Serialize};

/// Read-only projection of the linked account.
///
/// Replaced wholesale on every status query; never patched field by field.
/// The calendar provider has no projection of its own: its detail is the
/// active [`Selection`](crate::types::Selection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ProviderAccount {
    Payment(PaymentAccount),
}

/// Linked payment account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub account_id: String,
    pub account_name: Option<String>,
    pub account_email: Option<String>,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
}

impl PaymentAccount {
    /// Label shown for the account, falling back to a generic name.
    pub fn display_name(&self) -> &str {
        self.account_name.as_deref().unwrap_or("Account")
    }

    /// True until both charges and payouts are enabled upstream.
    pub fn setup_incomplete(&self) -> bool {
        !self.charges_enabled || !self.payouts_enabled
    }
}
