// src/handlers/exams.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use super::helpers::{load_open_exam, load_student};
use crate::{
    error::AppError,
    models::{
        exam::AvailableExam,
        question::QuestionView,
        submission::SavedAnswer,
    },
    store::SharedStore,
    utils::jwt::Claims,
};

/// Exams of the current student's course and batch that have not ended yet,
/// soonest first.
pub async fn get_available_exams(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = load_student(store.as_ref(), claims.user_id()?).await?;
    let now = Utc::now();

    let mut exams: Vec<_> = store
        .fetch_exams_for_batch(student.batch_id)
        .await?
        .into_iter()
        .filter(|exam| exam.course_id == student.course_id && !exam.has_ended(now))
        .collect();
    exams.sort_by_key(|exam| (exam.start_time, exam.id));

    let exams: Vec<AvailableExam> = exams.into_iter().map(AvailableExam::from).collect();
    Ok(Json(exams))
}

/// Questions of a running exam, without the answer key.
pub async fn get_questions(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    load_open_exam(store.as_ref(), &claims, exam_id).await?;

    let questions: Vec<QuestionView> = store
        .fetch_questions(exam_id)
        .await?
        .into_iter()
        .map(QuestionView::from)
        .collect();

    Ok(Json(questions))
}

/// Answers recorded so far, for resuming a running exam.
/// Empty when nothing was answered yet.
pub async fn get_saved_answers(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (student, _exam) = load_open_exam(store.as_ref(), &claims, exam_id).await?;

    let answers: Vec<SavedAnswer> = store
        .fetch_submission(student.id, exam_id)
        .await?
        .map(|submission| submission.answers.iter().map(SavedAnswer::from).collect())
        .unwrap_or_default();

    Ok(Json(answers))
}
