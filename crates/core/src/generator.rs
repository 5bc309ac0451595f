//! Narrative generator client.
//!
//! Consumes an external OpenAI-compatible chat-completions endpoint to turn
//! structured story parameters into a generated title and body. The backend
//! is responsible only for composing the request parameters into a plain
//! instruction and splitting the returned text into a title (first line or
//! heading) and body (remainder); the model itself is an external
//! collaborator.
//!
//! Any transport, status, or response-shape failure surfaces as
//! [`TaleError::Generation`]. There is no retry logic.

use crate::config::GeneratorConfig;
use crate::error::{TaleError, TaleResult};
use crate::tale::{AgeRange, Topic};
use fable_types::TaleTitle;
use serde::{Deserialize, Serialize};

/// Parameters for a generation request.
#[derive(Debug, Clone)]
pub struct StoryPrompt {
    pub age_range: AgeRange,
    pub topic: Topic,
    pub main_character: Option<String>,
    pub setting: Option<String>,
    pub additional_details: Option<String>,
}

/// A generated title and body, ready to be offered to the user for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTale {
    pub title: String,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

const SYSTEM_INSTRUCTION: &str = "You are a children's storyteller. Write a complete story. \
     The first line must be the story title on its own, followed by the story text.";

/// Client for the external narrative generator.
#[derive(Clone, Debug)]
pub struct NarrativeClient {
    http: reqwest::Client,
    cfg: GeneratorConfig,
}

impl NarrativeClient {
    /// Creates a client for the configured endpoint.
    pub fn new(cfg: GeneratorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
        }
    }

    /// Requests a generated story for the given parameters.
    ///
    /// # Errors
    ///
    /// Returns `TaleError::Generation` if the request fails, the endpoint
    /// answers with a non-success status, or the response carries no usable
    /// text.
    pub async fn generate(&self, prompt: &StoryPrompt) -> TaleResult<GeneratedTale> {
        let instruction = compose_instruction(prompt);
        let body = ChatRequest {
            model: self.cfg.model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &instruction,
                },
            ],
        };

        let response = self
            .http
            .post(self.cfg.endpoint())
            .bearer_auth(self.cfg.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| TaleError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaleError::Generation(format!(
                "generator returned status {status}"
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TaleError::Generation(e.to_string()))?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TaleError::Generation("generator returned no choices".into()))?;

        split_reply(&text, prompt.topic)
    }
}

/// Composes the natural-language instruction for a prompt.
fn compose_instruction(prompt: &StoryPrompt) -> String {
    let mut instruction = format!(
        "Write a {topic} story for {audience}. Make it {length}.",
        topic = prompt.topic,
        audience = prompt.age_range.audience(),
        length = prompt.age_range.length_guidance(),
    );

    if let Some(main_character) = non_blank(&prompt.main_character) {
        instruction.push_str(&format!(" The main character is {main_character}."));
    }
    if let Some(setting) = non_blank(&prompt.setting) {
        instruction.push_str(&format!(" The story takes place in {setting}."));
    }
    if let Some(details) = non_blank(&prompt.additional_details) {
        instruction.push_str(&format!(" Additional details: {details}"));
    }

    instruction
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Splits the generated text into a title and body.
///
/// The first non-empty line becomes the title, with markdown heading markers
/// and surrounding quotes stripped and the result truncated to the title
/// limit. If nothing usable remains for a title (single block of text, blank
/// first line), a topic-derived default is used and the whole reply becomes
/// the body.
fn split_reply(text: &str, topic: Topic) -> TaleResult<GeneratedTale> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaleError::Generation("generator returned empty text".into()));
    }

    let mut lines = trimmed.lines();
    let first_line = lines.next().unwrap_or_default();
    let title_candidate = first_line
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches('"')
        .trim_matches('\u{201c}')
        .trim_matches('\u{201d}')
        .trim();

    let body: String = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    if title_candidate.is_empty() || body.is_empty() {
        // No separable title line: fall back and keep everything as body.
        return Ok(GeneratedTale {
            title: default_title(topic),
            content: trimmed.to_string(),
        });
    }

    let title: String = title_candidate
        .chars()
        .take(TaleTitle::MAX_LEN)
        .collect();

    Ok(GeneratedTale {
        title,
        content: body,
    })
}

fn default_title(topic: Topic) -> String {
    match topic {
        Topic::Adventure => "A Grand Adventure".into(),
        Topic::Animals => "An Animal Tale".into(),
        Topic::Fantasy => "A Fantasy Tale".into(),
        Topic::Friendship => "A Story of Friendship".into(),
        Topic::Space => "A Journey Through Space".into(),
        Topic::Nature => "A Walk in Nature".into(),
        Topic::Mystery => "A Curious Mystery".into(),
        Topic::Sports => "A Day of Games".into(),
        Topic::Bedtime => "A Bedtime Story".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> StoryPrompt {
        StoryPrompt {
            age_range: AgeRange::Preschool,
            topic: Topic::Animals,
            main_character: None,
            setting: None,
            additional_details: None,
        }
    }

    #[test]
    fn test_compose_instruction_minimal() {
        let instruction = compose_instruction(&prompt());
        assert!(instruction.contains("animals story"));
        assert!(instruction.contains("3 to 5 year olds"));
        assert!(!instruction.contains("main character"));
    }

    #[test]
    fn test_compose_instruction_with_optionals() {
        let mut p = prompt();
        p.main_character = Some("a shy hedgehog named Pip".into());
        p.setting = Some("a rainy forest".into());
        p.additional_details = Some("include a rainbow at the end".into());

        let instruction = compose_instruction(&p);
        assert!(instruction.contains("The main character is a shy hedgehog named Pip."));
        assert!(instruction.contains("The story takes place in a rainy forest."));
        assert!(instruction.contains("Additional details: include a rainbow at the end"));
    }

    #[test]
    fn test_compose_instruction_skips_blank_optionals() {
        let mut p = prompt();
        p.main_character = Some("   ".into());
        let instruction = compose_instruction(&p);
        assert!(!instruction.contains("main character"));
    }

    #[test]
    fn test_split_reply_takes_first_line_as_title() {
        let generated =
            split_reply("The Sleepy Badger\n\nOnce there was a badger...", Topic::Animals)
                .expect("split should succeed");
        assert_eq!(generated.title, "The Sleepy Badger");
        assert_eq!(generated.content, "Once there was a badger...");
    }

    #[test]
    fn test_split_reply_strips_heading_and_quotes() {
        let generated = split_reply(
            "## \"The Sleepy Badger\"\n\nOnce there was a badger...",
            Topic::Animals,
        )
        .expect("split should succeed");
        assert_eq!(generated.title, "The Sleepy Badger");
    }

    #[test]
    fn test_split_reply_falls_back_for_single_block() {
        let generated = split_reply("Once there was a badger who slept all day.", Topic::Animals)
            .expect("split should succeed");
        assert_eq!(generated.title, "An Animal Tale");
        assert_eq!(
            generated.content,
            "Once there was a badger who slept all day."
        );
    }

    #[test]
    fn test_split_reply_truncates_overlong_title() {
        let long_title = "T".repeat(250);
        let text = format!("{long_title}\n\nBody text.");
        let generated = split_reply(&text, Topic::Fantasy).expect("split should succeed");
        assert_eq!(generated.title.chars().count(), TaleTitle::MAX_LEN);
    }

    #[test]
    fn test_split_reply_rejects_empty_text() {
        let err = split_reply("   \n  ", Topic::Bedtime).expect_err("empty reply should fail");
        assert!(matches!(err, TaleError::Generation(_)));
    }
}
