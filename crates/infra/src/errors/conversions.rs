//! Conversions from external infrastructure errors into domain errors.

use bizlink_domain::LinkError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LinkError);

impl From<InfraError> for LinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LinkError> for InfraError {
    fn from(value: LinkError) -> Self {
        InfraError(value)
    }
}

trait IntoLinkError {
    fn into_link(self) -> LinkError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → LinkError */
/* -------------------------------------------------------------------------- */

impl IntoLinkError for KeyringError {
    fn into_link(self) -> LinkError {
        use KeyringError::{
            Ambiguous, BadEncoding, Invalid, NoEntry, NoStorageAccess, PlatformFailure, TooLong,
        };

        let description = self.to_string();

        match self {
            NoEntry => LinkError::Unauthorized("no dashboard token in keychain".into()),
            BadEncoding(_) => {
                LinkError::Unauthorized("keychain token is not valid UTF-8".into())
            }
            TooLong(name, limit) => LinkError::Config(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                LinkError::Config(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => LinkError::Config(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => LinkError::Internal(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                LinkError::Internal(format!("unable to access secure storage: {err}"))
            }
            _ => LinkError::Internal(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_link())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LinkError */
/* -------------------------------------------------------------------------- */

impl IntoLinkError for HttpError {
    fn into_link(self) -> LinkError {
        if self.is_timeout() {
            return LinkError::GatewayUnavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LinkError::GatewayUnavailable("HTTP connection failure".into());
        }

        if self.is_builder() {
            return LinkError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => LinkError::Unauthorized(message),
                _ => LinkError::GatewayUnavailable(message),
            };
        }

        LinkError::GatewayUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_link())
    }
}
