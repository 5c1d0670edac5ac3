pub mod image;
pub mod prompt;
pub mod tutor;

pub use crate::domain::model::{Answer, Context, EncodedImage, MultimodalRequest, Question};
pub use crate::domain::ports::{AnswerService, ConfigProvider, SpeechCapture};
pub use crate::utils::error::Result;
