//! Resource clients and the uniform result they return

pub mod cart;
pub mod categories;
pub mod client;
pub mod context;
pub mod orders;
pub mod products;
pub mod users;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{HarnessError, HarnessResult};

pub use cart::CartClient;
pub use categories::CategoriesClient;
pub use client::RestClient;
pub use context::ApiContext;
pub use orders::OrdersClient;
pub use products::ProductsClient;
pub use users::UsersClient;

/// Status reported when no HTTP response was obtained at all
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Outcome of one call against the backend.
///
/// HTTP error statuses and transport failures are both `Failure`; nothing a
/// client does ever panics or returns `Err` past this type.
///
/// `body` is the normalized payload exactly as the backend sent it. It is
/// `None` for 204 / empty bodies, transport failures and results built
/// locally.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success {
        status: u16,
        data: T,
        body: Option<Value>,
    },
    Failure {
        status: u16,
        message: String,
        body: Option<Value>,
    },
}

/// Coarse classification of a failure, by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No response obtained (DNS, refused connection, timeout)
    Transport,
    /// 400 or 422
    Validation,
    /// 404
    NotFound,
    /// Any other status >= 400
    Http,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            TRANSPORT_FAILURE_STATUS => FailureKind::Transport,
            400 | 422 => FailureKind::Validation,
            404 => FailureKind::NotFound,
            _ => FailureKind::Http,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Transport => "transport",
            FailureKind::Validation => "validation",
            FailureKind::NotFound => "not_found",
            FailureKind::Http => "http",
        };
        f.write_str(s)
    }
}

impl<T> ApiResult<T> {
    /// Success without a wire body
    pub fn ok(status: u16, data: T) -> Self {
        ApiResult::Success { status, data, body: None }
    }

    /// Failure without a wire body
    pub fn err(status: u16, message: impl Into<String>) -> Self {
        ApiResult::Failure {
            status,
            message: message.into(),
            body: None,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::err(TRANSPORT_FAILURE_STATUS, message)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResult::Success { status, .. } | ApiResult::Failure { status, .. } => *status,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { message, .. } => Some(message),
        }
    }

    /// Normalized body as received, before any decoding
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiResult::Success { body, .. } | ApiResult::Failure { body, .. } => body.as_ref(),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { status, .. } => Some(FailureKind::from_status(*status)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Success { status, data, body } => ApiResult::Success {
                status,
                data: f(data),
                body,
            },
            ApiResult::Failure { status, message, body } => ApiResult::Failure { status, message, body },
        }
    }

    pub fn as_ref(&self) -> ApiResult<&T> {
        match self {
            ApiResult::Success { status, data, body } => ApiResult::Success {
                status: *status,
                data,
                body: body.clone(),
            },
            ApiResult::Failure { status, message, body } => ApiResult::Failure {
                status: *status,
                message: message.clone(),
                body: body.clone(),
            },
        }
    }

    /// Convert to a harness error on failure, for setup steps that cannot
    /// continue without the payload.
    pub fn into_result(self) -> HarnessResult<T> {
        match self {
            ApiResult::Success { data, .. } => Ok(data),
            ApiResult::Failure { status, message, .. } => Err(HarnessError::Api { status, message }),
        }
    }

    /// Like [`ApiResult::into_result`] but also pins the success status.
    pub fn expect_status(self, expected: u16) -> HarnessResult<T> {
        let actual = self.status();
        match self {
            ApiResult::Success { data, .. } if actual == expected => Ok(data),
            ApiResult::Success { .. } => Err(HarnessError::UnexpectedStatus { expected, actual }),
            ApiResult::Failure { status, message, .. } => Err(HarnessError::Api { status, message }),
        }
    }
}

impl<T: Serialize> ApiResult<T> {
    /// Payload re-encoded as JSON, `None` for failures and empty payloads.
    pub fn json_payload(&self) -> Option<Value> {
        self.data()
            .and_then(|data| serde_json::to_value(data).ok())
            .filter(|value| !value.is_null())
    }

    /// What the backend sent when there is a wire body, otherwise the
    /// re-encoded payload.
    pub fn payload(&self) -> Option<Value> {
        self.body().cloned().or_else(|| self.json_payload())
    }
}

impl ApiResult<Option<Value>> {
    /// Decode a normalized payload into `T`.
    ///
    /// An absent payload (204 or empty body) is offered to `T` as JSON
    /// `null`, which `()` accepts and entity types reject.
    pub(crate) fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        match self {
            ApiResult::Success { status, data: None, body } => match serde_json::from_value(Value::Null) {
                Ok(data) => ApiResult::Success { status, data, body },
                Err(_) => ApiResult::Failure {
                    status,
                    message: "empty response body".to_string(),
                    body,
                },
            },
            ApiResult::Success {
                status,
                data: Some(payload),
                body,
            } => match serde_json::from_value(payload) {
                Ok(data) => ApiResult::Success { status, data, body },
                Err(e) => ApiResult::Failure {
                    status,
                    message: format!("unexpected response body: {}", e),
                    body,
                },
            },
            ApiResult::Failure { status, message, body } => ApiResult::Failure { status, message, body },
        }
    }
}
