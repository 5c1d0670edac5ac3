use crate::utils::error::{Result, TutorError};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub service: ServiceConfig,
    pub speech: SpeechConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// 通常寫成 "${GEMINI_API_KEY}"
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
    pub phrase_time_limit_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub grade: Option<GradeValue>,
    pub subject: Option<String>,
    pub language: Option<String>,
    pub answer_in_language: Option<bool>,
}

/// `grade = 7` and `grade = "7"` are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    Number(u8),
    Text(String),
}

impl GradeValue {
    pub fn as_string(&self) -> String {
        match self {
            GradeValue::Number(n) => n.to_string(),
            GradeValue::Text(s) => s.clone(),
        }
    }
}

pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const MAX_LISTEN_TIMEOUT_SECS: u64 = 60;
pub const MAX_PHRASE_TIME_LIMIT_SECS: u64 = 120;

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TutorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TutorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；未設定的變數換成空字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            TutorError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::debug!("Environment variable {} is not set", var_name);
                String::new()
            })
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.service.endpoint {
            validate_url("service.endpoint", endpoint)?;
        }
        if let Some(model) = &self.service.model {
            validate_non_empty_string("service.model", model)?;
        }
        if let Some(timeout) = self.service.timeout_seconds {
            validate_range("service.timeout_seconds", timeout, 1, MAX_REQUEST_TIMEOUT_SECS)?;
        }

        if let Some(command) = &self.speech.command {
            validate_non_empty_string("speech.command", command)?;
        }
        if let Some(timeout) = self.speech.timeout_seconds {
            validate_range("speech.timeout_seconds", timeout, 1, MAX_LISTEN_TIMEOUT_SECS)?;
        }
        if let Some(limit) = self.speech.phrase_time_limit_seconds {
            validate_range(
                "speech.phrase_time_limit_seconds",
                limit,
                1,
                MAX_PHRASE_TIME_LIMIT_SECS,
            )?;
        }

        if let Some(grade) = &self.defaults.grade {
            grade.as_string().parse::<crate::domain::model::Grade>()?;
        }
        if let Some(subject) = &self.defaults.subject {
            subject.parse::<crate::domain::model::Subject>()?;
        }
        if let Some(language) = &self.defaults.language {
            language.parse::<crate::domain::model::Language>()?;
        }

        Ok(())
    }
}
