use engine::EngineError;
use reqwest::StatusCode;

/// Failures of a single HTTP exchange with the backend.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid gateway configuration: {0}")]
    Config(String),
    #[error("session file error: {0}")]
    SessionFile(String),
}

impl GatewayError {
    fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// Fold into the engine taxonomy for a read.
    pub fn into_read(self) -> EngineError {
        if self.is_unauthorized() {
            return EngineError::NotAuthenticated;
        }
        EngineError::GatewayRead(self.to_string())
    }

    /// Fold into the engine taxonomy for a write.
    pub fn into_write(self) -> EngineError {
        if self.is_unauthorized() {
            return EngineError::NotAuthenticated;
        }
        EngineError::GatewayWrite(self.to_string())
    }

    /// Fold into the engine taxonomy for an auth call. The backend message
    /// ("Invalid login credentials", ...) is what the user gets to see.
    pub fn into_auth(self) -> EngineError {
        match self {
            Self::Server { message, .. } => EngineError::Auth(message),
            other => EngineError::Auth(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_means_signed_out() {
        let err = GatewayError::Server {
            status: StatusCode::UNAUTHORIZED,
            message: "JWT expired".to_string(),
        };
        assert_eq!(err.into_read(), EngineError::NotAuthenticated);
    }

    #[test]
    fn server_errors_keep_their_message() {
        let err = GatewayError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".to_string(),
        };
        assert_eq!(
            err.into_write(),
            EngineError::GatewayWrite("500 Internal Server Error: boom".to_string())
        );

        let auth = GatewayError::Server {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(
            auth.into_auth(),
            EngineError::Auth("Invalid login credentials".to_string())
        );
    }
}
