// src/handlers/helpers.rs

use std::collections::HashSet;

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        exam::ExamConfig,
        report::ExamResultResponse,
        student::{Batch, Student},
        submission::Submission,
    },
    scoring::{UngradableSubmission, compute_score, review_answers},
    store::ExamStore,
    utils::jwt::Claims,
};

pub(crate) async fn load_exam(store: &dyn ExamStore, exam_id: i64) -> Result<ExamConfig, AppError> {
    store
        .fetch_exam_config(exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

pub(crate) async fn load_batch(store: &dyn ExamStore, batch_id: i64) -> Result<Batch, AppError> {
    store
        .fetch_batch(batch_id)
        .await?
        .ok_or(AppError::NotFound("Batch not found".to_string()))
}

pub(crate) async fn load_student(
    store: &dyn ExamStore,
    student_id: i64,
) -> Result<Student, AppError> {
    store
        .fetch_student(student_id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))
}

/// Submissions to `exam_id` from the given students only.
pub(crate) async fn submissions_from(
    store: &dyn ExamStore,
    exam_id: i64,
    student_ids: &HashSet<i64>,
) -> Result<Vec<Submission>, AppError> {
    Ok(store
        .fetch_submissions_for_exam(exam_id)
        .await?
        .into_iter()
        .filter(|s| student_ids.contains(&s.student_id))
        .collect())
}

/// The student's submissions paired with their exams, limited to exams of
/// the student's current course that are assigned to the current batch.
pub(crate) async fn student_entries(
    store: &dyn ExamStore,
    student: &Student,
) -> Result<Vec<(ExamConfig, Submission)>, AppError> {
    let submissions = store.fetch_submissions_for_student(student.id).await?;
    let mut entries = Vec::with_capacity(submissions.len());

    for submission in submissions {
        match store.fetch_exam_config(submission.exam_id).await? {
            Some(exam)
                if exam.course_id == student.course_id && exam.is_assigned_to(student.batch_id) =>
            {
                entries.push((exam, submission))
            }
            Some(_) => {}
            None => tracing::warn!(
                "Submission of student {} references missing exam {}",
                student.id,
                submission.exam_id
            ),
        }
    }

    Ok(entries)
}

/// Loads a batch and an exam, which must be assigned to that batch.
pub(crate) async fn load_batch_exam(
    store: &dyn ExamStore,
    batch_id: i64,
    exam_id: i64,
) -> Result<(Batch, ExamConfig), AppError> {
    let batch = load_batch(store, batch_id).await?;
    let exam = load_exam(store, exam_id).await?;

    if !exam.is_assigned_to(batch_id) {
        return Err(AppError::NotFound(
            "Exam is not assigned to this batch".to_string(),
        ));
    }

    Ok((batch, exam))
}

/// Loads the current student and an exam they may work on right now:
/// assigned to their batch (403 otherwise) and in progress (400 otherwise).
pub(crate) async fn load_open_exam(
    store: &dyn ExamStore,
    claims: &Claims,
    exam_id: i64,
) -> Result<(Student, ExamConfig), AppError> {
    let student = load_student(store, claims.user_id()?).await?;
    let exam = load_exam(store, exam_id).await?;

    if !exam.is_assigned_to(student.batch_id) {
        return Err(AppError::Forbidden(
            "Exam is not assigned to your batch".to_string(),
        ));
    }

    if !exam.is_in_progress(Utc::now()) {
        return Err(AppError::BadRequest("Exam is not in progress".to_string()));
    }

    Ok((student, exam))
}

/// Scores one student's submission and attaches the answer sheet.
pub(crate) async fn exam_result(
    store: &dyn ExamStore,
    exam: &ExamConfig,
    student_id: i64,
) -> Result<ExamResultResponse, AppError> {
    let submission = store
        .fetch_submission(student_id, exam.id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    let score = compute_score(exam, &submission.answers)?;
    let questions = store.fetch_questions(exam.id).await?;

    Ok(ExamResultResponse {
        exam_id: exam.id,
        exam_title: exam.title.clone(),
        student_id,
        score,
        answers: review_answers(&questions, &submission),
    })
}

pub(crate) fn log_ungradable(exam: &ExamConfig, ungradable: &[UngradableSubmission]) {
    for item in ungradable {
        tracing::warn!(
            "Exam {}: submission of student {} is ungradable: {}",
            exam.id,
            item.student_id,
            item.reason
        );
    }
}
