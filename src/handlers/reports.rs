// src/handlers/reports.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use super::helpers::{
    exam_result, load_batch_exam, load_exam, load_student, log_ungradable, submissions_from,
};
use crate::{
    error::AppError,
    models::{
        exam::ExamConfig,
        report::{
            AbsentStudent, AbsentStudentsResponse, BreakdownResponse, CourseAverageResponse,
            CoursePassFailResponse, PassFailResponse, RankRow, RankingResponse,
        },
        submission::Submission,
    },
    scoring::{
        absent_students, answer_breakdown, course_average_percentage, course_pass_fail,
        pass_fail_summary, rank_cohort,
    },
    store::{ExamStore, SharedStore},
};

/// Ranks the batch's submissions for an exam.
/// Admin only.
pub async fn get_rankings(
    State(store): State<SharedStore>,
    Path((batch_id, exam_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (batch, exam) = load_batch_exam(store.as_ref(), batch_id, exam_id).await?;

    let names: HashMap<i64, String> = store
        .fetch_students_in_batch(batch_id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let enrolled: HashSet<i64> = names.keys().copied().collect();

    let submissions = submissions_from(store.as_ref(), exam_id, &enrolled).await?;
    let ranking = rank_cohort(&exam, &submissions);
    log_ungradable(&exam, &ranking.ungradable);

    let rank_data = ranking
        .entries
        .into_iter()
        .map(|entry| {
            let name = names.get(&entry.student_id).cloned().unwrap_or_default();
            RankRow::new(entry, name)
        })
        .collect();

    Ok(Json(RankingResponse {
        exam_title: exam.title,
        batch_name: batch.name,
        top_score: ranking.top_score,
        avg_score: ranking.avg_score,
        rank_data,
        ungradable: ranking.ungradable,
    }))
}

/// Students of the batch who never submitted anything for the exam.
/// Admin only.
pub async fn get_absent_students(
    State(store): State<SharedStore>,
    Path((batch_id, exam_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (batch, exam) = load_batch_exam(store.as_ref(), batch_id, exam_id).await?;

    let names: HashMap<i64, String> = store
        .fetch_students_in_batch(batch_id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let enrolled: HashSet<i64> = names.keys().copied().collect();
    let submissions = store.fetch_submissions_for_exam(exam_id).await?;

    let absent = absent_students(&enrolled, &submissions)
        .into_iter()
        .map(|student_id| AbsentStudent {
            name: names.get(&student_id).cloned().unwrap_or_default(),
            student_id,
        })
        .collect();

    Ok(Json(AbsentStudentsResponse {
        exam_title: exam.title,
        batch_name: batch.name,
        absent,
    }))
}

/// Pass / fail counts for a batch. Students without a submission fail.
/// Admin only.
pub async fn get_pass_fail(
    State(store): State<SharedStore>,
    Path((batch_id, exam_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (batch, exam) = load_batch_exam(store.as_ref(), batch_id, exam_id).await?;

    let enrolled = store.fetch_enrolled_student_ids(batch_id).await?;
    let submissions = store.fetch_submissions_for_exam(exam_id).await?;

    Ok(Json(PassFailResponse {
        summary: pass_fail_summary(&exam, &submissions, &enrolled),
        exam_title: exam.title,
        batch_name: batch.name,
    }))
}

/// Correct / wrong / unanswered split of a batch on one exam.
/// Admin only.
pub async fn get_breakdown(
    State(store): State<SharedStore>,
    Path((batch_id, exam_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (batch, exam) = load_batch_exam(store.as_ref(), batch_id, exam_id).await?;

    let enrolled = store.fetch_enrolled_student_ids(batch_id).await?;
    let submissions = submissions_from(store.as_ref(), exam_id, &enrolled).await?;

    Ok(Json(BreakdownResponse {
        breakdown: answer_breakdown(&submissions, &exam),
        exam_title: exam.title,
        batch_name: batch.name,
    }))
}

/// Any student's result on an exam, regardless of the exam window.
/// Admin only.
pub async fn get_student_result(
    State(store): State<SharedStore>,
    Path((student_id, exam_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    load_student(store.as_ref(), student_id).await?;
    let exam = load_exam(store.as_ref(), exam_id).await?;

    let result = exam_result(store.as_ref(), &exam, student_id).await?;
    Ok(Json(result))
}

/// Average percentage over the course's finished exams.
/// Admin only.
pub async fn get_course_average(
    State(store): State<SharedStore>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let current_students = store.fetch_course_student_ids(course_id).await?;
    let finished = finished_course_exams(store.as_ref(), course_id).await?;

    Ok(Json(CourseAverageResponse {
        course_id,
        exam_count: finished.len(),
        course_avg_percentage: course_average_percentage(
            &finished,
            &current_students,
            Utc::now(),
        ),
    }))
}

/// Finished exams of a course with all their submissions.
async fn finished_course_exams(
    store: &dyn ExamStore,
    course_id: i64,
) -> Result<Vec<(ExamConfig, Vec<Submission>)>, AppError> {
    let now = Utc::now();
    let mut finished = Vec::new();

    for exam in store.fetch_exams_for_course(course_id).await? {
        if !exam.has_ended(now) {
            continue;
        }
        let submissions = store.fetch_submissions_for_exam(exam.id).await?;
        finished.push((exam, submissions));
    }

    Ok(finished)
}

/// Pass / fail over every finished exam of a course. Students of an assigned
/// batch without a submission fail.
/// Admin only.
pub async fn get_course_pass_fail(
    State(store): State<SharedStore>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let current_students = store.fetch_course_student_ids(course_id).await?;
    let finished = finished_course_exams(store.as_ref(), course_id).await?;

    let mut batch_students: HashMap<i64, HashSet<i64>> = HashMap::new();
    for (exam, _) in &finished {
        for &batch_id in &exam.batch_ids {
            if !batch_students.contains_key(&batch_id) {
                let ids = store.fetch_enrolled_student_ids(batch_id).await?;
                batch_students.insert(batch_id, ids);
            }
        }
    }

    Ok(Json(CoursePassFailResponse {
        course_id,
        exam_count: finished.len(),
        summary: course_pass_fail(&finished, &batch_students, &current_students, Utc::now()),
    }))
}
