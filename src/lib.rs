pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CommandSpeechCapture, GeminiClient};
pub use config::ResolvedConfig;
pub use crate::core::tutor::{Interaction, TutorEngine};
pub use domain::model::{Answer, Context, EncodedImage, MultimodalRequest, Question};
pub use utils::error::{Result, TutorError};
