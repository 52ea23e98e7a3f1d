use tracing::{info, warn};

use crate::app_state::VoiceAssistant;
use crate::errors::ServerError;
use crate::models::VoiceLog;
use crate::ports::repo::{NewVoiceLog, Repo};

pub const FALLBACK_RESPONSE: &str = "I'm sorry, I'm having trouble connecting to my knowledge base right now. Please try again in a moment.";

const MAX_ERROR_CHARS: usize = 255;

const PREAMBLE: &str = "You are a helpful assistant for Smart Safety, a health monitoring app.
Provide concise, helpful responses to user queries about health, safety, and emergency situations.";

pub fn build_prompt(message: &str) -> String {
    format!("{PREAMBLE}\n\nUser query: {message}")
}

#[derive(Debug)]
pub enum VoiceOutcome {
    Answered(VoiceLog),
    /// The model failed; the stored log carries the fallback reply and the error.
    Fallback(VoiceLog),
}

pub async fn ask(
    voice: &VoiceAssistant,
    repo: &dyn Repo,
    user_id: i64,
    message: &str,
) -> Result<VoiceOutcome, ServerError> {
    if !voice.limiter.check(user_id) {
        info!(user_id, "voice request rate limited");
        return Err(ServerError::rate_limited(
            "Too many requests. Please try again later.",
        ));
    }

    let prompt = build_prompt(message);
    let reply = voice.retry.run(|| voice.model.generate(&prompt)).await;

    match reply {
        Ok(response) => {
            let log = repo
                .insert_voice_log(&NewVoiceLog {
                    user_id,
                    message: message.to_string(),
                    response,
                    error: None,
                })
                .await
                .map_err(ServerError::internal)?;
            Ok(VoiceOutcome::Answered(log))
        }
        Err(err) if err.is_rate_limited() => {
            warn!(user_id, error = %err, "assistant upstream rate limited");
            Err(ServerError::rate_limited(
                "Assistant rate limit exceeded. Please try again later.",
            ))
        }
        Err(err) => {
            warn!(user_id, error = %err, "assistant failed; storing fallback reply");
            let log = repo
                .insert_voice_log(&NewVoiceLog {
                    user_id,
                    message: message.to_string(),
                    response: FALLBACK_RESPONSE.to_string(),
                    error: Some(truncate_chars(&err.to_string(), MAX_ERROR_CHARS)),
                })
                .await
                .map_err(ServerError::internal)?;
            Ok(VoiceOutcome::Fallback(log))
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_ends_with_the_query() {
        let prompt = build_prompt("I feel dizzy");
        assert!(prompt.starts_with("You are a helpful assistant for Smart Safety"));
        assert!(prompt.ends_with("User query: I feel dizzy"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(300);
        let cut = truncate_chars(&text, MAX_ERROR_CHARS);
        assert_eq!(cut.chars().count(), 255);
        assert_eq!(truncate_chars("short", 255), "short");
    }
}
