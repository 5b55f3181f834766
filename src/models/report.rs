// src/models/report.rs

use serde::Serialize;

use crate::scoring::{
    AnswerBreakdown, AnswerReview, CoursePassFail, PassFailSummary, RankedEntry, ScoreResult,
    UngradableSubmission,
};

/// DTO for a single student's result on one exam.
#[derive(Debug, Serialize)]
pub struct ExamResultResponse {
    pub exam_id: i64,
    pub exam_title: String,
    pub student_id: i64,
    #[serde(flatten)]
    pub score: ScoreResult,
    pub answers: Vec<AnswerReview>,
}

/// One row of the ranking table.
#[derive(Debug, Serialize)]
pub struct RankRow {
    #[serde(flatten)]
    pub entry: RankedEntry,
    pub student_name: String,
    /// "Passed" or "Failed".
    pub status: &'static str,
}

impl RankRow {
    pub fn new(entry: RankedEntry, student_name: String) -> Self {
        let status = if entry.score.passed { "Passed" } else { "Failed" };
        Self {
            entry,
            student_name,
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub exam_title: String,
    pub batch_name: String,
    pub top_score: f64,
    pub avg_score: f64,
    pub rank_data: Vec<RankRow>,
    pub ungradable: Vec<UngradableSubmission>,
}

#[derive(Debug, Serialize)]
pub struct AbsentStudent {
    pub student_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AbsentStudentsResponse {
    pub exam_title: String,
    pub batch_name: String,
    pub absent: Vec<AbsentStudent>,
}

#[derive(Debug, Serialize)]
pub struct PassFailResponse {
    pub exam_title: String,
    pub batch_name: String,
    #[serde(flatten)]
    pub summary: PassFailSummary,
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub exam_title: String,
    pub batch_name: String,
    #[serde(flatten)]
    pub breakdown: AnswerBreakdown,
}

#[derive(Debug, Serialize)]
pub struct CourseAverageResponse {
    pub course_id: i64,
    /// Finished exams that went into the average.
    pub exam_count: usize,
    pub course_avg_percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct CoursePassFailResponse {
    pub course_id: i64,
    /// Finished exams that were counted.
    pub exam_count: usize,
    #[serde(flatten)]
    pub summary: CoursePassFail,
}
