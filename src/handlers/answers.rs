// src/handlers/answers.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use super::helpers::load_open_exam;
use crate::{
    error::AppError,
    models::{
        question::OptionId,
        submission::{SubmitAnswerRequest, SubmittedAnswer},
    },
    store::SharedStore,
    utils::jwt::Claims,
};

/// Records one answer of the current student.
///
/// * Only while the exam is in progress and assigned to the student's batch.
/// * Correctness is decided here, against the question's current key, and
///   stored with the answer.
/// * Answering the same question again replaces the earlier answer.
pub async fn submit_answer(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let chosen_option = payload
        .answer
        .parse::<OptionId>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (student, _exam) = load_open_exam(store.as_ref(), &claims, exam_id).await?;

    let questions = store.fetch_questions(exam_id).await?;
    let question = questions
        .iter()
        .find(|q| q.id == payload.question_id)
        .ok_or(AppError::BadRequest(
            "Question does not belong to this exam".to_string(),
        ))?;

    let answer = SubmittedAnswer {
        question_id: question.id,
        chosen_option,
        is_correct: question.is_correct(chosen_option),
    };

    store.upsert_answer(student.id, exam_id, &answer).await?;

    tracing::info!(
        "Recorded answer: student={} exam={} question={}",
        student.id,
        exam_id,
        question.id
    );

    Ok(Json(serde_json::json!({
        "message": "Answer submitted successfully"
    })))
}
