use crate::utils::error::{Result, TutorError};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 使用者的問題，建立時即保證非空白
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Rejects empty or whitespace-only input with `EmptyQuestion`.
    /// The text is otherwise kept verbatim.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TutorError::EmptyQuestion);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 12;

    pub fn new(value: u8) -> Result<Self> {
        validate_range("grade", value, Self::MIN, Self::MAX)?;
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl FromStr for Grade {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| TutorError::InvalidConfigValueError {
                field: "grade".to_string(),
                value: s.to_string(),
                reason: format!("Grade must be a number from {} to {}", Self::MIN, Self::MAX),
            })?;
        Self::new(value)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subject {
    #[default]
    Mathematics,
    Physics,
    Chemistry,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Mathematics, Subject::Physics, Subject::Chemistry];

    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
        }
    }
}

impl FromStr for Subject {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mathematics" | "math" | "maths" => Ok(Subject::Mathematics),
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            _ => Err(TutorError::InvalidConfigValueError {
                field: "subject".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Subject must be one of {}",
                    Subject::ALL.map(Subject::as_str).join(", ")
                ),
            }),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Telugu,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Telugu];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Telugu => "Telugu",
        }
    }
}

impl FromStr for Language {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            "telugu" | "te" => Ok(Language::Telugu),
            _ => Err(TutorError::InvalidConfigValueError {
                field: "language".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Language must be one of {}",
                    Language::ALL.map(Language::as_str).join(", ")
                ),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade/subject/language selection accompanying a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    pub grade: Grade,
    pub subject: Subject,
    pub language: Language,
    /// When set, the instruction asks for the answer in `language`.
    pub answer_in_language: bool,
}

/// A normalized image: JPEG bytes plus their base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    data: String,
    byte_len: usize,
}

impl EncodedImage {
    pub(crate) fn new(mime_type: impl Into<String>, data: String, byte_len: usize) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
            byte_len,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Size of the encoded JPEG before base64.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// A single content fragment: text or inline binary data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }

    pub fn is_inline_data(&self) -> bool {
        matches!(self, Part::InlineData { .. })
    }
}

/// One user turn: the instruction text, optionally followed by one image.
///
/// Fields are private so the ordering invariant (text first, at most one
/// image after it) can only be established through [`MultimodalRequest::new`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MultimodalRequest {
    role: &'static str,
    parts: Vec<Part>,
}

impl MultimodalRequest {
    pub const USER_ROLE: &'static str = "user";

    pub fn new(instruction: impl Into<String>, image: Option<&EncodedImage>) -> Self {
        let mut parts = vec![Part::text(instruction)];
        if let Some(image) = image {
            parts.push(Part::inline_data(image.mime_type(), image.data()));
        }
        Self {
            role: Self::USER_ROLE,
            parts,
        }
    }

    pub fn role(&self) -> &str {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn instruction(&self) -> &str {
        // parts[0] 一定是文字
        self.parts.first().and_then(Part::as_text).unwrap_or_default()
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(Part::is_inline_data)
    }
}

/// The answer service's response collapsed to what the tutor shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Blocked { reason: String },
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Blocked { .. } => None,
        }
    }
}

/// Transcribed speech; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_question(self) -> Result<Question> {
        Question::new(self.0)
    }
}
