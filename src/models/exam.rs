// src/models/exam.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'exams' table, joined with the ids of its questions and
/// assigned batches.
/// Holds the marking scheme the scoring engine works from.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamConfig {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,

    /// Exam length in minutes.
    pub duration_minutes: i32,

    pub total_questions: i32,
    pub marks_per_question: f64,

    /// Deducted for every wrong *and* every unanswered question.
    pub negative_mark_per_wrong_answer: f64,

    /// 0 to 100.
    pub passing_percentage: f64,

    pub question_ids: Vec<i64>,
    pub batch_ids: Vec<i64>,
}

impl ExamConfig {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// True once the answering window has closed.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time() < now
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }

    /// Answers are only accepted between start and end time.
    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.has_started(now) && !self.has_ended(now)
    }

    pub fn is_assigned_to(&self, batch_id: i64) -> bool {
        self.batch_ids.contains(&batch_id)
    }

    pub fn total_possible_marks(&self) -> f64 {
        f64::from(self.total_questions.max(0)) * self.marks_per_question
    }
}

/// DTO for the list of exams a student can still take.
#[derive(Debug, Serialize)]
pub struct AvailableExam {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_questions: i32,
}

impl From<ExamConfig> for AvailableExam {
    fn from(exam: ExamConfig) -> Self {
        Self {
            end_time: exam.end_time(),
            id: exam.id,
            title: exam.title,
            start_time: exam.start_time,
            duration_minutes: exam.duration_minutes,
            total_questions: exam.total_questions,
        }
    }
}
