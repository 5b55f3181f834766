// src/scoring/engine.rs

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::error::ScoringError;
use crate::models::{
    exam::ExamConfig,
    submission::{Submission, SubmittedAnswer},
};

/// Derived score of one submission. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unanswered_count: u32,
    pub raw_score: f64,
    pub total_possible_marks: f64,
    pub percentage: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub student_id: i64,
    #[serde(flatten)]
    pub score: ScoreResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct UngradableSubmission {
    pub student_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortRanking {
    pub entries: Vec<RankedEntry>,
    pub top_score: f64,
    pub avg_score: f64,
    pub ungradable: Vec<UngradableSubmission>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassFailSummary {
    pub pass: u32,
    pub fail: u32,
    pub total_students: u32,
    pub pass_percentage: f64,
    pub fail_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerBreakdown {
    pub total_questions: u64,
    pub total_correct: u64,
    pub total_wrong: u64,
    pub total_unanswered: u64,
    pub correct_percent: f64,
    pub wrong_percent: f64,
    pub unanswered_percent: f64,
}

/// Scores one student's answers against the exam's marking scheme.
///
/// Trusts each answer's stored `is_correct` flag. Answers are expected to be
/// deduplicated already (see `Submission::record_answer`).
///
/// Negative marking applies to wrong and unanswered questions alike; the
/// score is floored at zero.
pub fn compute_score(
    exam: &ExamConfig,
    answers: &[SubmittedAnswer],
) -> Result<ScoreResult, ScoringError> {
    let total_questions = exam.total_questions.max(0) as usize;

    if answers.len() > total_questions {
        return Err(ScoringError::TooManyAnswers {
            exam_id: exam.id,
            total_questions: exam.total_questions,
            answered: answers.len(),
        });
    }

    if let Some(foreign) = answers
        .iter()
        .find(|a| !exam.question_ids.contains(&a.question_id))
    {
        return Err(ScoringError::ForeignQuestion {
            exam_id: exam.id,
            question_id: foreign.question_id,
        });
    }

    let correct = answers.iter().filter(|a| a.is_correct).count();
    let incorrect = answers.len() - correct;
    let unanswered = total_questions - answers.len();

    let total_possible_marks = exam.total_possible_marks();
    let earned = correct as f64 * exam.marks_per_question;
    let deducted = (incorrect + unanswered) as f64 * exam.negative_mark_per_wrong_answer;
    let raw_score = (earned - deducted).max(0.0);

    let percentage = if total_possible_marks > 0.0 {
        raw_score / total_possible_marks * 100.0
    } else {
        0.0
    };

    // Multiply first: 20 * 60 / 100 must stay exactly 12.
    let passed = raw_score >= total_possible_marks * exam.passing_percentage / 100.0;

    Ok(ScoreResult {
        correct_count: correct as u32,
        incorrect_count: incorrect as u32,
        unanswered_count: unanswered as u32,
        raw_score,
        total_possible_marks,
        percentage,
        passed,
    })
}

/// Ranks a cohort's submissions for one exam, best score first.
///
/// Equal scores are ordered by ascending student id. Submissions that fail
/// to score are listed in `ungradable` and left out of ranks and averages.
pub fn rank_cohort(exam: &ExamConfig, submissions: &[Submission]) -> CohortRanking {
    let mut scored = Vec::with_capacity(submissions.len());
    let mut ungradable = Vec::new();

    for submission in submissions {
        match compute_score(exam, &submission.answers) {
            Ok(score) => scored.push((submission.student_id, score)),
            Err(err) => ungradable.push(UngradableSubmission {
                student_id: submission.student_id,
                reason: err.to_string(),
            }),
        }
    }

    scored.sort_by(|(a_id, a), (b_id, b)| {
        b.raw_score
            .total_cmp(&a.raw_score)
            .then_with(|| a_id.cmp(b_id))
    });

    let top_score = scored.first().map(|(_, s)| s.raw_score).unwrap_or(0.0);
    let avg_score = mean(scored.iter().map(|(_, s)| s.raw_score));

    let entries = scored
        .into_iter()
        .enumerate()
        .map(|(idx, (student_id, score))| RankedEntry {
            rank: idx as u32 + 1,
            student_id,
            score,
        })
        .collect();

    CohortRanking {
        entries,
        top_score,
        avg_score,
        ungradable,
    }
}

/// Enrolled students with no submission to the exam, by ascending id.
///
/// A submission that cannot be graded still counts as present.
pub fn absent_students(
    enrolled_student_ids: &HashSet<i64>,
    submissions: &[Submission],
) -> Vec<i64> {
    let present: HashSet<i64> = submissions.iter().map(|s| s.student_id).collect();
    let mut absent: Vec<i64> = enrolled_student_ids.difference(&present).copied().collect();
    absent.sort_unstable();
    absent
}

/// Classifies every enrolled student as pass or fail.
///
/// A missing or ungradable submission counts as a fail. Submissions from
/// students outside `enrolled_student_ids` are ignored.
pub fn pass_fail_summary(
    exam: &ExamConfig,
    submissions: &[Submission],
    enrolled_student_ids: &HashSet<i64>,
) -> PassFailSummary {
    let by_student: HashMap<i64, &Submission> = submissions
        .iter()
        .filter(|s| enrolled_student_ids.contains(&s.student_id))
        .map(|s| (s.student_id, s))
        .collect();

    let mut pass = 0u32;
    let mut fail = 0u32;

    for student_id in enrolled_student_ids {
        let passed = by_student
            .get(student_id)
            .and_then(|s| compute_score(exam, &s.answers).ok())
            .is_some_and(|score| score.passed);

        if passed {
            pass += 1;
        } else {
            fail += 1;
        }
    }

    let total_students = pass + fail;

    PassFailSummary {
        pass,
        fail,
        total_students,
        pass_percentage: percent_of(u64::from(pass), u64::from(total_students), 2),
        fail_percentage: percent_of(u64::from(fail), u64::from(total_students), 2),
    }
}

/// Share of correct, wrong and unanswered questions across a set of
/// submissions to the same exam.
pub fn answer_breakdown(submissions: &[Submission], exam: &ExamConfig) -> AnswerBreakdown {
    breakdown(submissions.iter().map(|s| (exam, s)))
}

/// Like `answer_breakdown`, but each submission brings its own exam, so the
/// question total is summed per exam.
pub fn answer_breakdown_across_exams(entries: &[(ExamConfig, Submission)]) -> AnswerBreakdown {
    breakdown(entries.iter().map(|(exam, submission)| (exam, submission)))
}

fn breakdown<'a>(
    entries: impl IntoIterator<Item = (&'a ExamConfig, &'a Submission)>,
) -> AnswerBreakdown {
    let mut totals = AnswerBreakdown::default();

    for (exam, submission) in entries {
        // Ungradable submissions stay out of both numerator and denominator.
        let Ok(score) = compute_score(exam, &submission.answers) else {
            continue;
        };
        totals.total_questions += exam.total_questions.max(0) as u64;
        totals.total_correct += u64::from(score.correct_count);
        totals.total_wrong += u64::from(score.incorrect_count);
        totals.total_unanswered += u64::from(score.unanswered_count);
    }

    totals.correct_percent = percent_of(totals.total_correct, totals.total_questions, 1);
    totals.wrong_percent = percent_of(totals.total_wrong, totals.total_questions, 1);
    totals.unanswered_percent = percent_of(totals.total_unanswered, totals.total_questions, 1);
    totals
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub(crate) fn percent_of(part: u64, whole: u64, decimals: i32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, decimals)
}
