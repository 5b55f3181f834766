// src/scoring/error.rs

use thiserror::Error;

/// A submission whose stored answers contradict its exam.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("exam {exam_id} has {total_questions} questions but {answered} answers were recorded")]
    TooManyAnswers {
        exam_id: i64,
        total_questions: i32,
        answered: usize,
    },

    #[error("answer references question {question_id} which is not part of exam {exam_id}")]
    ForeignQuestion { exam_id: i64, question_id: i64 },
}
