// Adapters layer: concrete implementations of the domain ports.

pub mod gemini;
pub mod speech;

pub use gemini::GeminiClient;
pub use speech::CommandSpeechCapture;
