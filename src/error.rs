use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Fatal render failures returned to the caller. Recoverable degradations
/// (missing background, missing code image) never surface here; they are
/// absorbed by the asset fetcher and recorded as warnings on the outcome.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("another render is already in progress (current task: {current_task})")]
    ConcurrentRenderRejected { current_task: String },

    #[error("invalid render request: {0}")]
    InvalidRequest(String),

    #[error("synthesis stage failed: {0}")]
    Synthesis(String),

    #[error("graph stage failed: {0}")]
    GraphInvariant(String),

    #[error("encode stage failed: {0}")]
    Encode(String),

    #[error("{stage} stage failed: {source:#}")]
    Stage {
        stage: &'static str,
        source: anyhow::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn graph(msg: impl Into<String>) -> Self {
        Self::GraphInvariant(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn stage(stage: &'static str, source: anyhow::Error) -> Self {
        Self::Stage { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_originating_stage() {
        assert!(
            RenderError::synthesis("timed out")
                .to_string()
                .contains("synthesis stage")
        );
        assert!(
            RenderError::graph("empty graph")
                .to_string()
                .contains("graph stage")
        );
        assert!(
            RenderError::encode("exit 1")
                .to_string()
                .contains("encode stage")
        );
        assert!(
            RenderError::stage("setup", anyhow::anyhow!("no scratch dir"))
                .to_string()
                .contains("setup stage")
        );
    }

    #[test]
    fn rejection_carries_current_task() {
        let err = RenderError::ConcurrentRenderRejected {
            current_task: "Encoding video".to_string(),
        };
        assert!(err.to_string().contains("Encoding video"));
    }
}
