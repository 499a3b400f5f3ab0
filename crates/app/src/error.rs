use engine::EngineError;
use gateway::GatewayError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    /// What the user sees on stderr before the process exits.
    pub fn alert(&self) -> String {
        match self {
            Self::Engine(err) => err.alert(),
            other => other.to_string(),
        }
    }
}
