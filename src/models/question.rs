// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four option tags every question carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionId {
    A,
    B,
    C,
    D,
}

impl OptionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionId::A => "A",
            OptionId::B => "B",
            OptionId::C => "C",
            OptionId::D => "D",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not one of A, B, C or D")]
pub struct InvalidOptionId(pub String);

impl FromStr for OptionId {
    type Err = InvalidOptionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionId::A),
            "B" => Ok(OptionId::B),
            "C" => Ok(OptionId::C),
            "D" => Ok(OptionId::D),
            other => Err(InvalidOptionId(other.to_string())),
        }
    }
}

/// A tagged option as stored in the `options` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub option_id: OptionId,
    pub text: String,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,
    pub question_text: String,

    /// Exactly four options, tagged A to D.
    pub options: Vec<AnswerOption>,

    pub correct_option: OptionId,
}

impl Question {
    /// Text of the option tagged `option`, if the question has one.
    pub fn option_text(&self, option: OptionId) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.option_id == option)
            .map(|o| o.text.as_str())
    }

    pub fn is_correct(&self, chosen: OptionId) -> bool {
        self.correct_option == chosen
    }
}

/// A question as shown while the exam runs. Carries no answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<AnswerOption>,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            options: question.options,
        }
    }
}
