/// Response envelope
///
/// Every RPC reply carries a `base` block. Expected business failures
/// (unknown email, duplicate registration, missing product) are returned with
/// HTTP 200 and `is_error: true`; only faults and auth rejections use HTTP
/// error statuses.

use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct BaseResponse {
    pub status_code: u16,
    pub message: String,
    pub is_error: bool,
}

impl BaseResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            is_error: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            message: message.into(),
            is_error: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status_code: 404,
            message: message.into(),
            is_error: true,
        }
    }
}

/// Reply carrying only the envelope
#[derive(Debug, Serialize)]
pub struct BaseOnly {
    pub base: BaseResponse,
}

impl From<BaseResponse> for BaseOnly {
    fn from(base: BaseResponse) -> Self {
        Self { base }
    }
}
