use crate::domain::model::Transcript;
use crate::domain::ports::SpeechCapture;
use crate::utils::error::{Result, TutorError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PHRASE_TIME_LIMIT_SECS: u64 = 15;

/// Runs an external speech-to-text command and reads the transcript from its
/// stdout.
///
/// The command owns the microphone, ambient-noise calibration and the call to
/// the recognition backend. Contract with the command:
/// - exit 0 with text on stdout: the transcript
/// - exit 0 with empty stdout: nothing recognizable was said
/// - any other exit, or failure to start: the backend is unavailable
///
/// `{timeout}` and `{phrase_limit}` in the arguments are replaced with the
/// listen timeout and phrase limit in whole seconds.
#[derive(Debug, Clone)]
pub struct CommandSpeechCapture {
    program: String,
    args: Vec<String>,
    phrase_time_limit: Duration,
}

impl CommandSpeechCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>, phrase_time_limit: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            phrase_time_limit,
        }
    }

    fn expand_args(&self, timeout: Duration) -> Vec<String> {
        let timeout = timeout.as_secs().max(1).to_string();
        let phrase_limit = self.phrase_time_limit.as_secs().max(1).to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{timeout}", &timeout)
                    .replace("{phrase_limit}", &phrase_limit)
            })
            .collect()
    }
}

#[async_trait]
impl SpeechCapture for CommandSpeechCapture {
    async fn capture_utterance(&self, timeout: Duration) -> Result<Transcript> {
        let args = self.expand_args(timeout);
        tracing::debug!("Starting speech command: {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TutorError::SpeechServiceUnavailable {
                message: format!("cannot start '{}': {}", self.program, e),
            })?;

        // 等待開口 + 一句話的上限；逾時即放棄，child 會在 drop 時被終止
        let deadline = timeout + self.phrase_time_limit;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(TutorError::SpeechServiceUnavailable {
                    message: format!("speech command failed: {}", e),
                })
            }
            Err(_) => {
                return Err(TutorError::NoSpeechDetected {
                    message: format!("no speech within {:?}", deadline),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TutorError::SpeechServiceUnavailable {
                message: format!("speech command exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Transcript::new(stdout.into_owned()).ok_or_else(|| TutorError::NoSpeechDetected {
            message: "speech was not recognizable".to_string(),
        })
    }
}
