pub mod toml_config;

use crate::adapters::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::adapters::speech::{DEFAULT_LISTEN_TIMEOUT_SECS, DEFAULT_PHRASE_TIME_LIMIT_SECS};
use crate::core::ConfigProvider;
use crate::domain::model::{Context, Grade, Language, Subject};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use std::time::Duration;
use toml_config::{TomlConfig, MAX_REQUEST_TIMEOUT_SECS};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "tutor.toml";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SPEECH_COMMAND: &str = "ai-tutor-listen";
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ai-tutor")]
#[command(about = "Ask the AI Tutor anything in Mathematics, Physics or Chemistry for your grade")]
pub struct CliConfig {
    /// Question to ask (leave out when using --speak)
    pub question: Option<String>,

    /// Ask by voice instead of typing
    #[arg(long)]
    pub speak: bool,

    /// Grade/level, 1 to 12
    #[arg(short, long)]
    pub grade: Option<Grade>,

    /// Mathematics, Physics or Chemistry
    #[arg(short, long)]
    pub subject: Option<Subject>,

    /// English, Hindi or Telugu
    #[arg(short, long)]
    pub language: Option<Language>,

    /// Ask the tutor to answer in the selected language
    #[arg(long)]
    pub answer_in_language: bool,

    /// Optional image (jpg, jpeg or png) sent with the question
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Path to TOML configuration file (default: tutor.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub endpoint: Option<String>,

    /// Answer service timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔 (若有) 並套用命令列覆蓋
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?
            }
            None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::info!("📁 Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                TomlConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => TomlConfig::default(),
        };
        file.validate()?;

        let mut resolved = ResolvedConfig::from_toml(&file, |name| std::env::var(name).ok())?;

        if let Some(grade) = self.grade {
            resolved.context.grade = grade;
        }
        if let Some(subject) = self.subject {
            resolved.context.subject = subject;
        }
        if let Some(language) = self.language {
            resolved.context.language = language;
        }
        if self.answer_in_language {
            resolved.context.answer_in_language = true;
        }
        if let Some(model) = &self.model {
            resolved.model = model.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            resolved.endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.timeout {
            resolved.request_timeout = Duration::from_secs(timeout);
        }

        resolved.validate()?;
        Ok(resolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSettings {
    pub command: String,
    pub args: Vec<String>,
    pub listen_timeout: Duration,
    pub phrase_time_limit: Duration,
}

/// Final settings after defaults, config file and CLI flags are merged.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub speech: SpeechSettings,
    pub context: Context,
}

// api_key 不可出現在日誌中
impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("speech", &self.speech)
            .field("context", &self.context)
            .finish()
    }
}

impl ResolvedConfig {
    /// `env` looks up environment variables; the credential is read exactly
    /// once here.
    pub fn from_toml<F>(file: &TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = &file.defaults;
        let context = Context {
            grade: match &defaults.grade {
                Some(grade) => grade.as_string().parse()?,
                None => Grade::default(),
            },
            subject: match &defaults.subject {
                Some(subject) => subject.parse()?,
                None => Subject::default(),
            },
            language: match &defaults.language {
                Some(language) => language.parse()?,
                None => Language::default(),
            },
            answer_in_language: defaults.answer_in_language.unwrap_or(false),
        };

        let speech = SpeechSettings {
            command: file
                .speech
                .command
                .clone()
                .unwrap_or_else(|| DEFAULT_SPEECH_COMMAND.to_string()),
            args: file.speech.args.clone().unwrap_or_else(|| {
                vec![
                    "--timeout".to_string(),
                    "{timeout}".to_string(),
                    "--phrase-limit".to_string(),
                    "{phrase_limit}".to_string(),
                ]
            }),
            listen_timeout: Duration::from_secs(
                file.speech
                    .timeout_seconds
                    .unwrap_or(DEFAULT_LISTEN_TIMEOUT_SECS),
            ),
            phrase_time_limit: Duration::from_secs(
                file.speech
                    .phrase_time_limit_seconds
                    .unwrap_or(DEFAULT_PHRASE_TIME_LIMIT_SECS),
            ),
        };

        Ok(Self {
            endpoint: file
                .service
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: file
                .service
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: resolve_api_key(file.service.api_key.as_deref(), env),
            request_timeout: Duration::from_secs(
                file.service
                    .timeout_seconds
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            speech,
            context,
        })
    }
}

/// Configured key first, then `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
/// Blank values count as unset.
pub fn resolve_api_key<F>(configured: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    configured.and_then(non_blank).or_else(|| {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|name| env(name).as_deref().and_then(non_blank))
    })
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        validate_url("service.endpoint", &self.endpoint)?;
        validate_non_empty_string("service.model", &self.model)?;
        validate_range(
            "service.timeout_seconds",
            self.request_timeout.as_secs(),
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        validate_non_empty_string("speech.command", &self.speech.command)?;
        Ok(())
    }
}

impl ConfigProvider for ResolvedConfig {
    fn service_endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_config_file() {
        let resolved = ResolvedConfig::from_toml(&TomlConfig::default(), no_env).unwrap();

        assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.api_key, None);
        assert_eq!(resolved.request_timeout, Duration::from_secs(30));
        assert_eq!(resolved.speech.listen_timeout, Duration::from_secs(5));
        assert_eq!(resolved.context, Context::default());
        assert!(resolved.validate().is_ok());
    }

    #[test]
    fn test_defaults_section_sets_context() {
        let file = TomlConfig::from_toml_str(
            r#"
[defaults]
grade = "10"
subject = "chemistry"
language = "Hindi"
"#,
        )
        .unwrap();

        let resolved = ResolvedConfig::from_toml(&file, no_env).unwrap();
        assert_eq!(resolved.context.grade.value(), 10);
        assert_eq!(resolved.context.subject, Subject::Chemistry);
        assert_eq!(resolved.context.language, Language::Hindi);
        assert!(!resolved.context.answer_in_language);
    }

    #[test]
    fn test_api_key_resolution_order() {
        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some("gemini-env".to_string()),
            "GOOGLE_API_KEY" => Some("google-env".to_string()),
            _ => None,
        };
        assert_eq!(
            resolve_api_key(Some("from-file"), env).as_deref(),
            Some("from-file")
        );
        assert_eq!(resolve_api_key(Some("  "), env).as_deref(), Some("gemini-env"));
        assert_eq!(resolve_api_key(None, env).as_deref(), Some("gemini-env"));

        let google_only = |name: &str| (name == "GOOGLE_API_KEY").then(|| "google-env".to_string());
        assert_eq!(
            resolve_api_key(None, google_only).as_deref(),
            Some("google-env")
        );
        assert_eq!(resolve_api_key(None, no_env), None);
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let mut resolved = ResolvedConfig::from_toml(&TomlConfig::default(), no_env).unwrap();
        resolved.api_key = Some("super-secret".to_string());

        let debug = format!("{:?}", resolved);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides() {
        let cli = CliConfig::parse_from([
            "ai-tutor",
            "What is velocity?",
            "--grade",
            "9",
            "--subject",
            "Physics",
            "--model",
            "gemini-2.0-flash",
            "--timeout",
            "12",
            "--config",
            "/nonexistent/ai-tutor-test.toml",
        ]);
        assert_eq!(cli.question.as_deref(), Some("What is velocity?"));
        assert_eq!(cli.grade.map(Grade::value), Some(9));
        assert_eq!(cli.subject, Some(Subject::Physics));

        // 指定的設定檔不存在時必須回報錯誤
        assert!(cli.resolve().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_rejects_invalid_grade() {
        let result = CliConfig::try_parse_from(["ai-tutor", "hi", "--grade", "13"]);
        assert!(result.is_err());
    }
}
