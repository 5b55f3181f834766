// src/models/submission.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::OptionId;

/// A single recorded answer.
///
/// `is_correct` is captured when the answer is written and is what the
/// scoring engine trusts; later edits to the question do not change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub chosen_option: OptionId,
    pub is_correct: bool,
}

/// An answer as handed back to a student resuming an exam. Correctness
/// stays hidden until results are out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedAnswer {
    pub question_id: i64,
    pub chosen_option: OptionId,
}

impl From<&SubmittedAnswer> for SavedAnswer {
    fn from(answer: &SubmittedAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            chosen_option: answer.chosen_option,
        }
    }
}

/// A student's answers for one exam. One per (student, exam) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: i64,
    pub exam_id: i64,
    pub answers: Vec<SubmittedAnswer>,
}

impl Submission {
    pub fn new(student_id: i64, exam_id: i64) -> Self {
        Self {
            student_id,
            exam_id,
            answers: Vec::new(),
        }
    }

    /// Records an answer, replacing any earlier answer to the same question.
    pub fn record_answer(&mut self, answer: SubmittedAnswer) {
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => {
                existing.chosen_option = answer.chosen_option;
                existing.is_correct = answer.is_correct;
            }
            None => self.answers.push(answer),
        }
    }

    pub fn answer_for(&self, question_id: i64) -> Option<&SubmittedAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

/// DTO for recording one answer during an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(range(min = 1, message = "Question ID is required"))]
    pub question_id: i64,

    #[validate(custom(function = validate_answer))]
    pub answer: String,
}

fn validate_answer(answer: &str) -> Result<(), validator::ValidationError> {
    if answer.parse::<OptionId>().is_err() {
        let mut err = validator::ValidationError::new("invalid_answer");
        err.message = Some("Answer must be one of A, B, C, or D".into());
        return Err(err);
    }
    Ok(())
}
