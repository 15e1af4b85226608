use river_proto::ErrCode;
use std::time::Duration;
use thiserror::Error;
use tonic::Code;

/// Error text a node returns when a device delegate has lapsed.
pub const DELEGATE_EXPIRED_TEXT: &str = "event delegate has expired";

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("{method} failed: {}: {}", .status.code(), .status.message())]
    Status { method: &'static str, status: tonic::Status },

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("{method} attempt timed out after {}ms", .after.as_millis())]
    Timeout { method: &'static str, after: Duration },

    #[error("{0} canceled")]
    Canceled(&'static str),

    #[error("Node url {0} no longer operational")]
    NodeNotOperational(String),

    #[error("no node urls configured")]
    NoNodeUrls,

    #[error("invalid node url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RpcError {
    pub fn status(method: &'static str, status: tonic::Status) -> Self {
        RpcError::Status { method, status }
    }

    /// gRPC status code, when the node answered with one.
    pub fn code(&self) -> Option<Code> {
        match self {
            RpcError::Status { status, .. } => Some(status.code()),
            _ => None,
        }
    }

    /// True when the error text carries the `<num>:<NAME>` tag of `code`.
    pub fn contains(&self, code: ErrCode) -> bool {
        self.message().contains(&code.tag())
    }

    pub fn is_delegate_expired(&self) -> bool {
        self.message().contains(DELEGATE_EXPIRED_TEXT)
    }

    fn message(&self) -> String {
        match self {
            RpcError::Status { status, .. } => status.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Transient failures worth another attempt. Cancellation, url loss and
    /// protocol rejections such as `DUPLICATE_EVENT` are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Canceled(_)
            | RpcError::NodeNotOperational(_)
            | RpcError::NoNodeUrls
            | RpcError::InvalidUrl { .. } => return false,
            RpcError::Transport(_) | RpcError::Timeout { .. } => return true,
            RpcError::Status { .. } => {}
        }

        let text = self.message().to_lowercase();
        if text.contains("fetch failed")
            || text.contains("failed to fetch")
            || text.contains("transport error")
        {
            return true;
        }

        if [ErrCode::ResourceExhausted, ErrCode::DebugError, ErrCode::DbOperationFailure]
            .iter()
            .any(|c| self.contains(*c))
        {
            return true;
        }

        matches!(
            self.code(),
            Some(Code::DeadlineExceeded | Code::Unavailable | Code::ResourceExhausted)
        )
    }
}
