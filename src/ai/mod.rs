//! AI advisory adapter: prompt building and tolerant parsing of model
//! output. The model itself sits behind [`CompletionProvider`].
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::AiConfig;
use crate::error::{BackendError, ServiceError, ServiceResult};
use crate::role::Role;

pub mod gemini;

/// Text completion backend.
#[rocket::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends `prompt` and returns the generated text. Transport failures are
    /// [`ServiceError::Upstream`].
    async fn complete(&self, prompt: &str) -> ServiceResult<String>;
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// `teacher` or `student` framing; anything else sends the bare message.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub assignment_title: Option<String>,
    #[serde(default)]
    pub assignment_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GradeSuggestion {
    pub grade: String,
    pub feedback: String,
}

impl GradeSuggestion {
    pub const PENDING: &'static str = "Pending";

    fn pending(feedback: impl Into<String>) -> GradeSuggestion {
        GradeSuggestion {
            grade: GradeSuggestion::PENDING.to_string(),
            feedback: feedback.into(),
        }
    }
}

const TEACHER_FRAMING: &str = "You are a helpful teaching assistant. Help with lesson planning, \
grading, and creating educational content.";

const STUDENT_FRAMING: &str = "You are a friendly learning buddy. Help explain concepts simply \
and encourage learning. Ask guiding questions and never give direct answers to homework.";

pub fn chat_prompt(role: Option<Role>, message: &str) -> String {
    match role {
        Some(Role::Teacher) => format!("{}\n\nUser: {}", TEACHER_FRAMING, message),
        Some(Role::Student) => format!("{}\n\nUser: {}", STUDENT_FRAMING, message),
        Some(Role::Admin) | None => format!("User: {}", message),
    }
}

pub fn grading_prompt(content: &str, title: &str, description: &str) -> String {
    format!(
        "You are an expert teacher. Please grade the following student submission.\n\
         \n\
         Assignment Title: {title}\n\
         Description: {description}\n\
         \n\
         Student Submission:\n\
         {content}\n\
         \n\
         Please provide:\n\
         1. A grade (e.g., A, B, C or 90/100)\n\
         2. Constructive feedback (2-3 sentences)\n\
         \n\
         Format the output as VALID JSON with keys 'grade' and 'feedback'. \
         Do not include markdown formatting like ```json."
    )
}

/// Removes triple backtick fences, with or without a `json` tag.
pub fn strip_fencing(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn member_text(object: &serde_json::Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Never fails: anything that isn't a JSON object after fence stripping
/// becomes a `Pending` grade carrying the cleaned text.
pub fn parse_grade_suggestion(raw: &str) -> GradeSuggestion {
    let cleaned = strip_fencing(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(object)) => GradeSuggestion {
            grade: member_text(&object, "grade"),
            feedback: member_text(&object, "feedback"),
        },
        Ok(_) | Err(_) => {
            tracing::debug!("model output isn't a JSON object, using fallback grade");
            GradeSuggestion::pending(cleaned)
        }
    }
}

/// Front of the adapter held in Rocket state. Without a provider every call
/// is [`ServiceError::ServiceUnavailable`].
#[derive(Clone, Default)]
pub struct Advisor {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Advisor:{}", if self.provider.is_some() { "enabled" } else { "disabled" })
    }
}

impl Advisor {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Advisor {
        Advisor {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Advisor {
        Advisor { provider: None }
    }

    /// Uses the hosted model when an API key is configured.
    pub fn from_config(c: &AiConfig) -> Result<Advisor, BackendError> {
        match c.api_key.as_deref().filter(|it| !it.is_empty()) {
            Some(key) => {
                tracing::info!("AI adapter enabled with model {}.", c.model);
                Ok(Advisor::new(Arc::new(gemini::GeminiClient::new(c, key)?)))
            }
            None => {
                tracing::warn!("No AI API key configured, AI endpoints will answer 503.");
                Ok(Advisor::disabled())
            }
        }
    }

    fn provider(&self) -> ServiceResult<&dyn CompletionProvider> {
        self.provider.as_deref().ok_or_else(|| {
            ServiceError::ServiceUnavailable(
                "AI service not configured. Set GEMINI_API_KEY.".to_string(),
            )
        })
    }

    pub async fn chat(&self, role: Option<&str>, message: &str) -> ServiceResult<String> {
        let provider = self.provider()?;
        let role = role.and_then(|it| it.parse::<Role>().ok());
        provider.complete(&chat_prompt(role, message)).await
    }

    pub async fn grade_suggestion(
        &self,
        content: &str,
        title: &str,
        description: &str,
    ) -> ServiceResult<GradeSuggestion> {
        let provider = self.provider()?;
        let raw = provider
            .complete(&grading_prompt(content, title, description))
            .await?;
        Ok(parse_grade_suggestion(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    #[test]
    fn fenced_json_is_parsed() {
        let parsed = parse_grade_suggestion("```json\n{\"grade\":\"B\",\"feedback\":\"Good work\"}\n```");
        assert_eq!(
            parsed,
            GradeSuggestion {
                grade: "B".to_string(),
                feedback: "Good work".to_string(),
            }
        );
    }

    #[test]
    fn plain_text_falls_back_to_pending() {
        assert_eq!(
            parse_grade_suggestion("Great effort!"),
            GradeSuggestion {
                grade: "Pending".to_string(),
                feedback: "Great effort!".to_string(),
            }
        );
    }

    #[test]
    fn non_object_json_and_odd_members() {
        assert_eq!(parse_grade_suggestion("[1, 2]").grade, "Pending");
        assert_eq!(parse_grade_suggestion("\"A\"").feedback, "\"A\"");

        let numeric = parse_grade_suggestion("```\n{\"grade\": 90}\n```");
        assert_eq!(numeric.grade, "90");
        assert_eq!(numeric.feedback, "");
    }

    #[test]
    fn chat_prompt_frames_by_role() {
        let teacher = chat_prompt(Some(Role::Teacher), "plan a lesson");
        assert!(teacher.starts_with(TEACHER_FRAMING));
        assert!(teacher.ends_with("\n\nUser: plan a lesson"));

        let student = chat_prompt(Some(Role::Student), "what is 2+2");
        assert!(student.contains("never give direct answers to homework"));

        assert_eq!(chat_prompt(None, "hi"), "User: hi");
        assert_eq!(chat_prompt(Some(Role::Admin), "hi"), "User: hi");
    }

    #[rocket::async_test]
    async fn disabled_advisor_is_unavailable() {
        let advisor = Advisor::disabled();
        assert!(matches!(
            advisor.chat(Some("teacher"), "hello").await,
            Err(ServiceError::ServiceUnavailable(_))
        ));
        assert!(matches!(
            advisor.grade_suggestion("x", "y", "z").await,
            Err(ServiceError::ServiceUnavailable(_))
        ));
    }

    #[rocket::async_test]
    async fn advisor_uses_provider_and_propagates_failures() {
        let provider = Arc::new(ScriptedProvider::new(["Sure!", "not json at all"]));
        let advisor = Advisor::new(provider.clone());

        assert_eq!(advisor.chat(Some("pirate"), "ahoy").await.unwrap(), "Sure!");
        let suggestion = advisor
            .grade_suggestion("my essay", "Essay", "Spring")
            .await
            .unwrap();
        assert_eq!(suggestion.grade, "Pending");
        assert_eq!(suggestion.feedback, "not json at all");

        let prompts = provider.prompts.lock().unwrap().clone();
        assert_eq!(prompts[0], "User: ahoy");
        assert!(prompts[1].contains("Assignment Title: Essay"));
        assert!(prompts[1].contains("my essay"));

        assert!(matches!(
            advisor.chat(None, "again").await,
            Err(ServiceError::Upstream(_))
        ));
    }
}
