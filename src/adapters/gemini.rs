use crate::domain::model::{Answer, MultimodalRequest};
use crate::domain::ports::{AnswerService, ConfigProvider};
use crate::utils::error::{Result, TutorError};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// finishReason 值中代表內容被攔截的種類
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [&'a MultimodalRequest; 1],
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ApiError {
    fn is_invalid_key(&self) -> bool {
        let reason_matches = self.details.iter().any(|detail| {
            detail.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID")
        });
        reason_matches || self.message.contains("API key not valid")
    }
}

impl GenerateContentResponse {
    /// Collapses the response to the tutor's answer: the first candidate's
    /// text, a block reason, or `EmptyResponse`.
    pub fn into_answer(self) -> Result<Answer> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Ok(Answer::Blocked { reason });
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(TutorError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if !text.trim().is_empty() {
            return Ok(Answer::Text(text));
        }

        match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                Ok(Answer::Blocked { reason })
            }
            _ => Err(TutorError::EmptyResponse),
        }
    }
}

/// Accepts both `gemini-x` and the `models/gemini-x` resource form.
pub fn normalize_model_name(model: &str) -> &str {
    model.trim().trim_start_matches("models/")
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    // 金鑰在建構時就轉成 header 值；不合法的金鑰在 ask 時回報為驗證錯誤
    api_key: std::result::Result<HeaderValue, &'static str>,
}

impl GeminiClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            endpoint: config.service_endpoint().trim_end_matches('/').to_string(),
            model: normalize_model_name(config.model()).to_string(),
            api_key: Self::api_key_header(config.api_key()),
        })
    }

    fn api_key_header(key: Option<&str>) -> std::result::Result<HeaderValue, &'static str> {
        let key = key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or("no API key configured")?;
        let mut value =
            HeaderValue::from_str(key).map_err(|_| "API key contains invalid characters")?;
        value.set_sensitive(true);
        Ok(value)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn error_for_status(status: StatusCode, body: &str) -> TutorError {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
        let message = parsed
            .as_ref()
            .filter(|e| !e.message.is_empty())
            .map(|e| e.message.clone())
            .unwrap_or_else(|| status.to_string());

        let invalid_key = parsed.as_ref().is_some_and(ApiError::is_invalid_key);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TutorError::authentication(message),
            StatusCode::BAD_REQUEST if invalid_key => TutorError::authentication(message),
            _ => {
                if let Some(api_status) = parsed.as_ref().map(|e| e.status.as_str()) {
                    tracing::debug!("Service status: {}", api_status);
                }
                TutorError::service(status.as_u16(), message)
            }
        }
    }
}

#[async_trait]
impl AnswerService for GeminiClient {
    async fn ask(&self, request: &MultimodalRequest) -> Result<Answer> {
        let api_key = self.api_key.clone().map_err(TutorError::authentication)?;

        let url = self.generate_url();
        tracing::debug!(
            "Making generateContent request (model: {}, parts: {}, image: {})",
            self.model,
            request.parts().len(),
            request.has_image()
        );

        let body = GenerateContentRequest { contents: [request] };
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Answer service response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::error_for_status(status, &body);
            tracing::warn!("Answer service rejected request: {}", error);
            return Err(error);
        }

        let bytes = response.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes).map_err(|e| {
            TutorError::service(status.as_u16(), format!("malformed response: {}", e))
        })?;

        parsed.into_answer()
    }
}
