// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use super::helpers::{exam_result, load_exam, load_student, student_entries};
use crate::{
    error::AppError,
    models::{exam::ExamConfig, submission::Submission},
    scoring::{answer_breakdown_across_exams, performance_history, student_dashboard},
    store::SharedStore,
    utils::jwt::Claims,
};

/// Current student's score and answer sheet for one exam.
/// Available once the exam has ended.
pub async fn get_my_result(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let exam = load_exam(store.as_ref(), exam_id).await?;

    if !exam.has_ended(Utc::now()) {
        return Err(AppError::Forbidden(
            "Results are available after the exam ends".to_string(),
        ));
    }

    let result = exam_result(store.as_ref(), &exam, student_id).await?;
    Ok(Json(result))
}

/// Percentage per finished exam, for the progress chart.
pub async fn get_my_history(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = load_student(store.as_ref(), claims.user_id()?).await?;
    let entries = student_entries(store.as_ref(), &student).await?;

    Ok(Json(performance_history(&entries, Utc::now())))
}

/// Exams taken, average score and upcoming exams of the current student.
pub async fn get_my_dashboard(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = load_student(store.as_ref(), claims.user_id()?).await?;

    let entries = student_entries(store.as_ref(), &student).await?;
    let batch_exams: Vec<ExamConfig> = store
        .fetch_exams_for_batch(student.batch_id)
        .await?
        .into_iter()
        .filter(|exam| exam.course_id == student.course_id)
        .collect();

    Ok(Json(student_dashboard(&entries, &batch_exams, Utc::now())))
}

/// Correct / wrong / unanswered split over all finished exams of the current student.
pub async fn get_my_breakdown(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = load_student(store.as_ref(), claims.user_id()?).await?;
    let now = Utc::now();

    let finished: Vec<(ExamConfig, Submission)> = student_entries(store.as_ref(), &student)
        .await?
        .into_iter()
        .filter(|(exam, _)| exam.has_ended(now))
        .collect();

    Ok(Json(answer_breakdown_across_exams(&finished)))
}
