// src/store/mod.rs

pub mod postgres;

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    exam::ExamConfig,
    question::Question,
    student::{Batch, Student},
    submission::{Submission, SubmittedAnswer},
};

pub use postgres::PgExamStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row that cannot be mapped onto the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Read access to exams, questions, students and submissions, plus the one
/// write the service performs: recording an answer.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn fetch_exam_config(&self, exam_id: i64) -> Result<Option<ExamConfig>, StoreError>;

    /// Questions of an exam, in creation order.
    async fn fetch_questions(&self, exam_id: i64) -> Result<Vec<Question>, StoreError>;

    async fn fetch_submission(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<Submission>, StoreError>;

    async fn fetch_submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, StoreError>;

    async fn fetch_submissions_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError>;

    async fn fetch_batch(&self, batch_id: i64) -> Result<Option<Batch>, StoreError>;

    async fn fetch_student(&self, student_id: i64) -> Result<Option<Student>, StoreError>;

    async fn fetch_students_in_batch(&self, batch_id: i64) -> Result<Vec<Student>, StoreError>;

    /// Students currently enrolled anywhere in the course.
    async fn fetch_course_student_ids(&self, course_id: i64) -> Result<HashSet<i64>, StoreError>;

    async fn fetch_exams_for_course(&self, course_id: i64) -> Result<Vec<ExamConfig>, StoreError>;

    async fn fetch_exams_for_batch(&self, batch_id: i64) -> Result<Vec<ExamConfig>, StoreError>;

    /// Creates the submission if needed and replaces any earlier answer to
    /// the same question.
    async fn upsert_answer(
        &self,
        student_id: i64,
        exam_id: i64,
        answer: &SubmittedAnswer,
    ) -> Result<(), StoreError>;

    async fn fetch_enrolled_student_ids(&self, batch_id: i64) -> Result<HashSet<i64>, StoreError> {
        Ok(self
            .fetch_students_in_batch(batch_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect())
    }
}

pub type SharedStore = Arc<dyn ExamStore>;
