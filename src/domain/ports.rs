use crate::domain::model::{Answer, MultimodalRequest, Transcript};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// External generative-language service.
///
/// One attempt per call: implementations must not retry, and must map every
/// failure onto the tutor's error taxonomy instead of panicking.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, request: &MultimodalRequest) -> Result<Answer>;
}

pub trait ConfigProvider: Send + Sync {
    fn service_endpoint(&self) -> &str;
    fn model(&self) -> &str;
    /// `None` when no credential was found at startup.
    fn api_key(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
}

/// External speech-to-text capability.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Listens for one utterance, waiting at most `timeout` for speech to start.
    async fn capture_utterance(&self, timeout: Duration) -> Result<Transcript>;
}
