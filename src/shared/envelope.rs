//! Response Envelope
//!
//! Every REST response is wrapped as `{ "success": bool, "message": string, "data": T }`.
//! `success: false` is an application error whatever the HTTP status said.

use serde::{Deserialize, Serialize};

/// The `{success, message, data}` wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Why an envelope did not yield data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeFailure {
    /// The server reported `success: false`
    Rejected(String),
    /// `success: true` but no `data` field
    MissingData,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, EnvelopeFailure> {
        if !self.success {
            return Err(EnvelopeFailure::Rejected(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "request was rejected".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeFailure::MissingData)
    }
}

/// A page of a paginated collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn single(data: Vec<T>) -> Self {
        Self {
            data,
            current_page: 1,
            last_page: 1,
        }
    }

    /// Page number to request next, if any
    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.last_page).then(|| self.current_page + 1)
    }
}
