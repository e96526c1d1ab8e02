//! Session-level failure modes and their client-facing shape.

use focus_core::AuthError;

use super::protocol::ServerFrame;

/// Errors surfaced to a connected client. Only authentication failure
/// is terminal; everything else produces an `error` frame and leaves
/// the session open.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("authentication failed")]
    AuthenticationFailed(#[from] AuthError),
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("message too large: {size} bytes (limit {limit})")]
    MessageTooLarge { size: usize, limit: usize },
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl WsError {
    /// Client-facing representation of this error.
    pub fn to_frame(&self) -> ServerFrame {
        ServerFrame::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_as_error_frames() {
        let frame = WsError::UnknownAction("dance".to_string()).to_frame();
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "unknown action: dance");
    }

    #[test]
    fn auth_failure_does_not_leak_detail() {
        let err = WsError::AuthenticationFailed(AuthError::InvalidSubject("alice".into()));
        let value = serde_json::to_value(err.to_frame()).unwrap();
        assert_eq!(value["message"], "authentication failed");
    }
}
