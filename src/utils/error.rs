use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    #[error("No speech detected: {message}")]
    NoSpeechDetected { message: String },

    #[error("Speech service unavailable: {message}")]
    SpeechServiceUnavailable { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Answer service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Answer service returned no usable text")]
    EmptyResponse,

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Image,
    Speech,
    Authentication,
    Network,
    Service,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但程式正常結束
            ErrorSeverity::Medium => 2,   // 沒有答案，可重試
            ErrorSeverity::High => 1,     // 設定或服務錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl TutorError {
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::ServiceError {
            status,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyQuestion | Self::Cancelled => ErrorCategory::Input,
            Self::InvalidImage { .. } => ErrorCategory::Image,
            Self::NoSpeechDetected { .. } | Self::SpeechServiceUnavailable { .. } => {
                ErrorCategory::Speech
            }
            Self::AuthenticationError { .. } => ErrorCategory::Authentication,
            Self::NetworkError(_) => ErrorCategory::Network,
            Self::ServiceError { .. } | Self::EmptyResponse => ErrorCategory::Service,
            Self::InvalidConfigValueError { .. } | Self::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 圖片失敗時問題照樣送出
            Self::InvalidImage { .. } => ErrorSeverity::Low,
            // 沒有得到答案，但使用者可以直接重試
            Self::EmptyQuestion
            | Self::Cancelled
            | Self::NoSpeechDetected { .. }
            | Self::SpeechServiceUnavailable { .. }
            | Self::NetworkError(_)
            | Self::EmptyResponse => ErrorSeverity::Medium,
            Self::ServiceError { .. }
            | Self::AuthenticationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::EmptyQuestion => "Type a question or use --speak to ask by voice",
            Self::InvalidImage { .. } => "Use a readable .jpg, .jpeg or .png file",
            Self::NoSpeechDetected { .. } => "Speak clearly after the listening prompt and try again",
            Self::SpeechServiceUnavailable { .. } => {
                "Check your internet connection and the [speech] command in the config"
            }
            Self::AuthenticationError { .. } => {
                "Set GEMINI_API_KEY (or service.api_key in the config) to a valid key"
            }
            Self::NetworkError(_) => "Check your internet connection and try again",
            Self::ServiceError { status: 429, .. } => "Quota exhausted, wait a moment and try again",
            Self::ServiceError { .. } => "Try rephrasing the question or check the model name",
            Self::EmptyResponse => "Try asking the question differently",
            Self::Cancelled => "Run the command again when ready",
            Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Fix the configuration value and run again",
            Self::IoError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::EmptyQuestion => "Please enter a question!".to_string(),
            Self::NoSpeechDetected { .. } => {
                "Sorry, I couldn't understand what you said.".to_string()
            }
            Self::SpeechServiceUnavailable { .. } => {
                "Could not request speech results. Check your internet.".to_string()
            }
            Self::AuthenticationError { .. } => {
                "The AI Tutor could not sign in to the answer service.".to_string()
            }
            Self::NetworkError(_) => "Could not reach the answer service.".to_string(),
            Self::EmptyResponse => "The AI Tutor did not return an answer.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
