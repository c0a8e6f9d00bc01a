//! Turning questionnaire answers into the character and world prose a
//! [`GenerationRequest`](crate::core::GenerationRequest) needs.

use crate::config::StageDeadlines;
use crate::errors::GenerationError;
use crate::executor;
use crate::providers::{Generators, TextGenerator};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

const GUIDING_QUESTION: &str = "What kind of hero do you want to become?";

/// Topic inferred from a free-form hero prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedTopic {
    /// Genre of the world, e.g. `fantasy`.
    pub topic: String,
    /// Short description of the setting.
    #[serde(default)]
    pub setting: String,
}

impl DetectedTopic {
    /// Keyword guess used when the model reply is not usable JSON.
    #[must_use]
    pub fn guess(hero_prompt: &str) -> Self {
        let topic = if hero_prompt.to_lowercase().contains("hero") {
            "fantasy"
        } else {
            "general"
        };
        Self {
            topic: topic.to_string(),
            setting: hero_prompt.trim().to_string(),
        }
    }

    fn parse(reply: &str) -> Option<Self> {
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        let parsed: Self = serde_json::from_str(reply.get(start..=end)?).ok()?;
        (!parsed.topic.trim().is_empty()).then_some(parsed)
    }
}

/// Asks the text generator to detect topics and compose prose.
#[derive(Clone)]
pub struct IntakeComposer {
    text: Arc<dyn TextGenerator>,
    deadline: Duration,
}

impl std::fmt::Debug for IntakeComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeComposer")
            .field("text", &self.text.provider_name())
            .field("deadline", &self.deadline)
            .finish()
    }
}

fn answer_lines(answers: &[(String, String)]) -> Result<String, GenerationError> {
    let mut lines = String::new();
    for (question, answer) in answers {
        if answer.trim().is_empty() {
            continue;
        }
        let _ = writeln!(lines, "{}: {}", question.trim(), answer.trim());
    }
    if lines.is_empty() {
        return Err(GenerationError::validation("answers", "must not be empty"));
    }
    Ok(lines)
}

impl IntakeComposer {
    /// Creates a composer bounding each call by `deadline`.
    #[must_use]
    pub fn new(text: Arc<dyn TextGenerator>, deadline: Duration) -> Self {
        Self { text, deadline }
    }

    /// Uses the text generator and the prompt deadline.
    #[must_use]
    pub fn from_generators(generators: &Generators, deadlines: &StageDeadlines) -> Self {
        Self::new(generators.text.clone(), deadlines.prompt())
    }

    async fn ask(&self, prompt: String) -> Result<String, GenerationError> {
        let text = self.text.clone();
        let provider = text.provider_name().to_string();
        let reply = executor::run_generation(
            move || async move { text.generate(&prompt).await },
            self.deadline,
        )
        .await?;
        if reply.trim().is_empty() {
            return Err(GenerationError::no_content(provider, "empty reply"));
        }
        Ok(reply.trim().to_string())
    }

    /// Infers the world topic from what the user wants to become.
    ///
    /// A reply that is not a JSON object with a `topic` falls back to
    /// [`DetectedTopic::guess`]. Provider failures are returned.
    pub async fn detect_topic(&self, hero_prompt: &str) -> Result<DetectedTopic, GenerationError> {
        if hero_prompt.trim().is_empty() {
            return Err(GenerationError::validation("hero_prompt", "must not be empty"));
        }
        let prompt = format!(
            "{GUIDING_QUESTION}\nUser: {}\n\
             Reply only with JSON of the form {{\"topic\": \"...\", \"setting\": \"...\"}}.",
            hero_prompt.trim()
        );

        let topic = match self.ask(prompt).await {
            Ok(reply) => DetectedTopic::parse(&reply),
            Err(GenerationError::NoContent { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(topic.unwrap_or_else(|| {
            tracing::debug!("Topic reply was not usable JSON; guessing from keywords");
            DetectedTopic::guess(hero_prompt)
        }))
    }

    /// Composes a character profile from question/answer pairs.
    pub async fn compose_character(&self, answers: &[(String, String)]) -> Result<String, GenerationError> {
        let lines = answer_lines(answers)?;
        self.ask(format!("Create a complete character profile using these traits:\n{lines}"))
            .await
    }

    /// Composes a world description for `topic` from question/answer pairs.
    pub async fn compose_world(
        &self,
        answers: &[(String, String)],
        topic: &str,
    ) -> Result<String, GenerationError> {
        let lines = answer_lines(answers)?;
        let topic = if topic.trim().is_empty() { "unknown" } else { topic.trim() };
        self.ask(format!("Based on the world type: {topic}\n{lines}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedGenerator};
    use pretty_assertions::assert_eq;

    fn composer(generator: &Arc<ScriptedGenerator>) -> IntakeComposer {
        IntakeComposer::new(generator.clone(), Duration::from_secs(5))
    }

    fn answers() -> Vec<(String, String)> {
        vec![
            ("Name".to_string(), "Ren".to_string()),
            ("Strength".to_string(), "patience".to_string()),
            ("Fear".to_string(), "  ".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_detect_topic_from_json() {
        let generator = Arc::new(ScriptedGenerator::new().on_text(
            GUIDING_QUESTION,
            Script::reply("```json\n{\"topic\": \"space\", \"setting\": \"a drifting station\"}\n```"),
        ));

        let topic = composer(&generator).detect_topic("a pilot").await.unwrap();
        assert_eq!(topic.topic, "space");
        assert_eq!(topic.setting, "a drifting station");
        assert!(generator.text_prompts()[0].contains("User: a pilot"));
    }

    #[tokio::test]
    async fn test_detect_topic_guesses_on_prose_reply() {
        let generator = Arc::new(ScriptedGenerator::new().on_any_text(Script::reply("A grand tale!")));

        let topic = composer(&generator).detect_topic("a brave hero").await.unwrap();
        assert_eq!(topic, DetectedTopic::guess("a brave hero"));
        assert_eq!(topic.topic, "fantasy");

        let topic = composer(&generator).detect_topic("a baker").await.unwrap();
        assert_eq!(topic.topic, "general");
    }

    #[tokio::test]
    async fn test_detect_topic_propagates_provider_failure() {
        let generator = Arc::new(
            ScriptedGenerator::new().on_any_text(Script::fail(GenerationError::provider("gemini", "quota"))),
        );
        let err = composer(&generator).detect_topic("a hero").await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_compose_character_lists_answered_traits() {
        let generator = Arc::new(ScriptedGenerator::new().on_any_text(Script::reply(" Ren is patient. ")));

        let character = composer(&generator).compose_character(&answers()).await.unwrap();
        assert_eq!(character, "Ren is patient.");

        let prompt = &generator.text_prompts()[0];
        assert!(prompt.starts_with("Create a complete character profile using these traits:\n"));
        assert!(prompt.contains("Name: Ren\nStrength: patience\n"));
        assert!(!prompt.contains("Fear"));
    }

    #[tokio::test]
    async fn test_compose_world_names_topic() {
        let generator = Arc::new(ScriptedGenerator::new());

        composer(&generator).compose_world(&answers(), "fantasy").await.unwrap();
        assert!(generator.text_prompts()[0].starts_with("Based on the world type: fantasy\n"));

        composer(&generator).compose_world(&answers(), " ").await.unwrap();
        assert!(generator.text_prompts()[1].starts_with("Based on the world type: unknown\n"));
    }

    #[tokio::test]
    async fn test_empty_answers_fail_without_calls() {
        let generator = Arc::new(ScriptedGenerator::new());
        let blank = vec![("Name".to_string(), String::new())];

        let err = composer(&generator).compose_character(&blank).await.unwrap_err();
        assert!(matches!(err, GenerationError::Validation { .. }));
        assert!(composer(&generator).compose_world(&[], "fantasy").await.is_err());
        assert!(composer(&generator).detect_topic("  ").await.is_err());
        assert_eq!(generator.text_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_bounded() {
        let generator = Arc::new(ScriptedGenerator::new().on_any_text(Script::delayed(
            Duration::from_secs(60),
            Script::reply("late"),
        )));

        let err = composer(&generator).compose_character(&answers()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { .. }));
    }
}
