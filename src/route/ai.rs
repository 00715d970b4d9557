use rocket::serde::json::Json;
use rocket::State;

use crate::ai::{Advisor, ChatReply, ChatRequest, GradeRequest, GradeSuggestion};
use crate::resp::problem::Problem;

#[utoipa::path(
    post,
    path = "/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Model reply", body = ChatReply),
        (status = 502, description = "Provider call failed", body = Problem),
        (status = 503, description = "No API key configured", body = Problem),
    )
)]
#[post("/chat", format = "application/json", data = "<chat>")]
#[tracing::instrument(skip(advisor, chat))]
pub async fn ai_chat(
    chat: Json<ChatRequest>,
    advisor: &State<Advisor>,
) -> Result<Json<ChatReply>, Problem> {
    let response = advisor.chat(chat.role.as_deref(), &chat.message).await?;
    Ok(Json(ChatReply { response }))
}

/// Suggested grade for a submission. Unparseable model output still
/// answers 200 with a `Pending` grade.
#[utoipa::path(
    post,
    path = "/ai/grade",
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Suggested grade and feedback", body = GradeSuggestion),
        (status = 502, description = "Provider call failed", body = Problem),
        (status = 503, description = "No API key configured", body = Problem),
    )
)]
#[post("/grade", format = "application/json", data = "<request>")]
#[tracing::instrument(skip(advisor, request))]
pub async fn ai_grade(
    request: Json<GradeRequest>,
    advisor: &State<Advisor>,
) -> Result<Json<GradeSuggestion>, Problem> {
    let GradeRequest {
        content,
        assignment_title,
        assignment_description,
    } = request.into_inner();

    let suggestion = advisor
        .grade_suggestion(
            content.as_deref().unwrap_or_default(),
            assignment_title.as_deref().unwrap_or_default(),
            assignment_description.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(suggestion))
}
