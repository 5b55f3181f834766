// src/scoring/report.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::engine::{compute_score, mean, pass_fail_summary, percent_of, round_to};
use crate::models::{exam::ExamConfig, question::Question, submission::Submission};

/// One row of the answer sheet shown after an exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerReview {
    pub qno: u32,
    pub question_id: i64,
    pub question_text: String,
    pub correct_answer: Option<String>,

    /// `None` when the question was left unanswered.
    pub your_answer: Option<String>,

    /// The correctness recorded when the answer was submitted.
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamPerformance {
    pub exam_id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDashboard {
    pub exams_taken_count: u32,
    pub average_score: f64,
    pub available_exam_count: u32,
}

/// Pass / fail added up over a course's finished exams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePassFail {
    /// Distinct students classified on at least one exam.
    pub total_students: u32,
    pub total_pass: u32,
    pub total_fail: u32,

    /// Shares of all pass and fail classifications.
    pub pass_percentage: f64,
    pub fail_percentage: f64,
}

/// Pairs every question with the student's recorded answer, in question order.
pub fn review_answers(questions: &[Question], submission: &Submission) -> Vec<AnswerReview> {
    questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let recorded = submission.answer_for(question.id);
            AnswerReview {
                qno: idx as u32 + 1,
                question_id: question.id,
                question_text: question.question_text.clone(),
                correct_answer: question
                    .option_text(question.correct_option)
                    .map(str::to_owned),
                your_answer: recorded
                    .and_then(|a| question.option_text(a.chosen_option))
                    .map(str::to_owned),
                is_correct: recorded.map(|a| a.is_correct),
            }
        })
        .collect()
}

/// Percentage per finished exam, oldest first.
pub fn performance_history(
    entries: &[(ExamConfig, Submission)],
    now: DateTime<Utc>,
) -> Vec<ExamPerformance> {
    let mut finished: Vec<&(ExamConfig, Submission)> = entries
        .iter()
        .filter(|(exam, _)| exam.has_ended(now))
        .collect();
    finished.sort_by_key(|(exam, _)| exam.start_time);

    finished
        .into_iter()
        .filter_map(|(exam, submission)| {
            let score = compute_score(exam, &submission.answers).ok()?;
            Some(ExamPerformance {
                exam_id: exam.id,
                title: exam.title.clone(),
                date: exam.start_time.date_naive(),
                percentage: round_to(score.percentage, 2),
            })
        })
        .collect()
}

/// Headline numbers for a student's home page.
///
/// `batch_exams` are all exams assigned to the student's batch; those not yet
/// started count as available.
pub fn student_dashboard(
    entries: &[(ExamConfig, Submission)],
    batch_exams: &[ExamConfig],
    now: DateTime<Utc>,
) -> StudentDashboard {
    let scores: Vec<f64> = entries
        .iter()
        .filter(|(exam, _)| exam.has_ended(now))
        .filter_map(|(exam, submission)| compute_score(exam, &submission.answers).ok())
        .map(|score| score.raw_score)
        .collect();

    let available_exam_count = batch_exams
        .iter()
        .filter(|exam| !exam.has_started(now))
        .count() as u32;

    StudentDashboard {
        exams_taken_count: scores.len() as u32,
        average_score: round_to(mean(scores.iter().copied()), 2),
        available_exam_count,
    }
}

/// Mean of per-exam average percentages over a course's finished exams.
///
/// Only submissions from `current_student_ids` count. A finished exam nobody
/// submitted contributes 0.
pub fn course_average_percentage(
    exams: &[(ExamConfig, Vec<Submission>)],
    current_student_ids: &HashSet<i64>,
    now: DateTime<Utc>,
) -> f64 {
    let exam_averages = exams
        .iter()
        .filter(|(exam, _)| exam.has_ended(now))
        .map(|(exam, submissions)| {
            mean(
                submissions
                    .iter()
                    .filter(|s| current_student_ids.contains(&s.student_id))
                    .filter_map(|s| compute_score(exam, &s.answers).ok())
                    .map(|score| score.percentage),
            )
        });

    round_to(mean(exam_averages), 2)
}

/// Classifies, exam by exam, the current students of every assigned batch.
///
/// `batch_students` maps a batch id to its students. Absentees and
/// ungradable submissions fail, as in `pass_fail_summary`. Exams that have
/// not ended are skipped.
pub fn course_pass_fail(
    exams: &[(ExamConfig, Vec<Submission>)],
    batch_students: &HashMap<i64, HashSet<i64>>,
    current_student_ids: &HashSet<i64>,
    now: DateTime<Utc>,
) -> CoursePassFail {
    let mut total_pass = 0u32;
    let mut total_fail = 0u32;
    let mut classified = HashSet::new();

    for (exam, submissions) in exams.iter().filter(|(exam, _)| exam.has_ended(now)) {
        let enrolled: HashSet<i64> = exam
            .batch_ids
            .iter()
            .filter_map(|batch_id| batch_students.get(batch_id))
            .flatten()
            .filter(|id| current_student_ids.contains(id))
            .copied()
            .collect();

        let summary = pass_fail_summary(exam, submissions, &enrolled);
        total_pass += summary.pass;
        total_fail += summary.fail;
        classified.extend(enrolled);
    }

    let outcomes = u64::from(total_pass) + u64::from(total_fail);

    CoursePassFail {
        total_students: classified.len() as u32,
        total_pass,
        total_fail,
        pass_percentage: percent_of(u64::from(total_pass), outcomes, 2),
        fail_percentage: percent_of(u64::from(total_fail), outcomes, 2),
    }
}
