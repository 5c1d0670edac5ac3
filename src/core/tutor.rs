use crate::core::prompt;
use crate::domain::model::{Answer, Context, EncodedImage, Question};
use crate::domain::ports::{AnswerService, SpeechCapture};
use crate::utils::error::{Result, TutorError};
use std::future::Future;
use std::time::Duration;

/// How the user supplied the question for one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// "Get Answer": use the typed text.
    Typed(String),
    /// "Speak & Get Answer": capture one utterance first.
    Spoken,
}

/// Runs one question-to-answer cycle at a time. Nothing is kept between
/// cycles, so a failed or cancelled cycle leaves the engine ready for the next.
pub struct TutorEngine<A: AnswerService, S: SpeechCapture> {
    service: A,
    speech: S,
    listen_timeout: Duration,
}

impl<A: AnswerService, S: SpeechCapture> TutorEngine<A, S> {
    pub fn new(service: A, speech: S, listen_timeout: Duration) -> Self {
        Self {
            service,
            speech,
            listen_timeout,
        }
    }

    pub async fn run(
        &self,
        interaction: Interaction,
        context: &Context,
        image: Option<&EncodedImage>,
    ) -> Result<Answer> {
        let question = match interaction {
            Interaction::Typed(text) => Question::new(text)?,
            Interaction::Spoken => {
                tracing::info!("🎙️ Listening... Speak now.");
                let transcript = self.speech.capture_utterance(self.listen_timeout).await?;
                tracing::info!("✅ You said: {}", transcript.as_str());
                transcript.into_question()?
            }
        };

        self.ask(&question, context, image).await
    }

    /// Same as [`run`](Self::run), abandoning the in-flight work as soon as
    /// `cancel` completes.
    pub async fn run_until_cancelled<F>(
        &self,
        interaction: Interaction,
        context: &Context,
        image: Option<&EncodedImage>,
        cancel: F,
    ) -> Result<Answer>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::warn!("⏹️ Request cancelled by user");
                Err(TutorError::Cancelled)
            }
            result = self.run(interaction, context, image) => result,
        }
    }

    pub async fn ask(
        &self,
        question: &Question,
        context: &Context,
        image: Option<&EncodedImage>,
    ) -> Result<Answer> {
        let request = prompt::assemble(question, context, image);
        tracing::debug!(
            "Assembled request for grade {} {} ({} parts)",
            context.grade,
            context.subject,
            request.parts().len()
        );

        tracing::info!("💡 Fetching answer from AI Tutor...");
        let answer = self.service.ask(&request).await?;

        if let Answer::Blocked { reason } = &answer {
            tracing::warn!("Answer blocked by the service: {}", reason);
        }
        Ok(answer)
    }
}
