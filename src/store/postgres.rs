// src/store/postgres.rs

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use super::{ExamStore, StoreError};
use crate::models::{
    exam::ExamConfig,
    question::{AnswerOption, OptionId, Question},
    student::{Batch, Student},
    submission::{Submission, SubmittedAnswer},
};

const EXAM_SELECT: &str = r#"
    SELECT
        e.id,
        e.course_id,
        e.title,
        e.start_time,
        e.duration_minutes,
        e.total_questions,
        e.marks_per_question,
        e.negative_mark_per_wrong_answer,
        e.passing_percentage,
        ARRAY(SELECT q.id FROM questions q WHERE q.exam_id = e.id ORDER BY q.id) AS question_ids,
        ARRAY(SELECT eb.batch_id FROM exam_batches eb WHERE eb.exam_id = e.id ORDER BY eb.batch_id) AS batch_ids
    FROM exams e
"#;

const SUBMISSION_SELECT: &str = r#"
    SELECT
        s.student_id,
        s.exam_id,
        a.question_id,
        a.chosen_option,
        a.is_correct
    FROM submissions s
    LEFT JOIN submission_answers a ON a.submission_id = s.id
"#;

/// Helper struct for reading questions before the option tag is parsed.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    exam_id: i64,
    question_text: String,
    options: Json<Vec<AnswerOption>>,
    correct_option: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let correct_option = row.correct_option.parse::<OptionId>().map_err(|e| {
            StoreError::Corrupt(format!("question {}: {}", row.id, e))
        })?;

        Ok(Question {
            id: row.id,
            exam_id: row.exam_id,
            question_text: row.question_text,
            options: row.options.0,
            correct_option,
        })
    }
}

/// One submission joined with one of its answers (or none, for an empty submission).
#[derive(Debug, FromRow)]
struct AnswerRow {
    student_id: i64,
    exam_id: i64,
    question_id: Option<i64>,
    chosen_option: Option<String>,
    is_correct: Option<bool>,
}

/// Folds joined rows, ordered by submission, back into submissions.
fn group_submissions(rows: Vec<AnswerRow>) -> Result<Vec<Submission>, StoreError> {
    let mut submissions: Vec<Submission> = Vec::new();

    for row in rows {
        let starts_new = submissions
            .last()
            .is_none_or(|s| s.student_id != row.student_id || s.exam_id != row.exam_id);
        if starts_new {
            submissions.push(Submission::new(row.student_id, row.exam_id));
        }

        let (Some(question_id), Some(chosen), Some(is_correct)) =
            (row.question_id, row.chosen_option, row.is_correct)
        else {
            continue;
        };

        let chosen_option = chosen.parse::<OptionId>().map_err(|e| {
            StoreError::Corrupt(format!(
                "answer to question {} by student {}: {}",
                question_id, row.student_id, e
            ))
        })?;

        if let Some(current) = submissions.last_mut() {
            current.answers.push(SubmittedAnswer {
                question_id,
                chosen_option,
                is_correct,
            });
        }
    }

    Ok(submissions)
}

/// `ExamStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_exams_where(
        &self,
        condition: &str,
        id: i64,
    ) -> Result<Vec<ExamConfig>, StoreError> {
        let sql = format!("{} WHERE {} ORDER BY e.start_time, e.id", EXAM_SELECT, condition);
        let exams = sqlx::query_as::<_, ExamConfig>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(exams)
    }

    async fn fetch_submissions_where(
        &self,
        condition: &str,
        id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "{} WHERE {} ORDER BY s.id, a.question_id",
            SUBMISSION_SELECT, condition
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        group_submissions(rows)
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn fetch_exam_config(&self, exam_id: i64) -> Result<Option<ExamConfig>, StoreError> {
        let sql = format!("{} WHERE e.id = $1", EXAM_SELECT);
        let exam = sqlx::query_as::<_, ExamConfig>(&sql)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(exam)
    }

    async fn fetch_questions(&self, exam_id: i64) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, exam_id, question_text, options, correct_option
            FROM questions
            WHERE exam_id = $1
            ORDER BY id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn fetch_submission(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let sql = format!(
            "{} WHERE s.student_id = $1 AND s.exam_id = $2 ORDER BY a.question_id",
            SUBMISSION_SELECT
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(student_id)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(group_submissions(rows)?.into_iter().next())
    }

    async fn fetch_submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, StoreError> {
        self.fetch_submissions_where("s.exam_id = $1", exam_id).await
    }

    async fn fetch_submissions_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        self.fetch_submissions_where("s.student_id = $1", student_id)
            .await
    }

    async fn fetch_batch(&self, batch_id: i64) -> Result<Option<Batch>, StoreError> {
        let batch = sqlx::query_as::<_, Batch>("SELECT id, course_id, name FROM batches WHERE id = $1")
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(batch)
    }

    async fn fetch_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT id, name, email, course_id, batch_id FROM students WHERE id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn fetch_students_in_batch(&self, batch_id: i64) -> Result<Vec<Student>, StoreError> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT id, name, email, course_id, batch_id FROM students WHERE batch_id = $1 ORDER BY id",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn fetch_enrolled_student_ids(&self, batch_id: i64) -> Result<HashSet<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM students WHERE batch_id = $1")
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn fetch_course_student_ids(&self, course_id: i64) -> Result<HashSet<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM students WHERE course_id = $1")
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn fetch_exams_for_course(&self, course_id: i64) -> Result<Vec<ExamConfig>, StoreError> {
        self.fetch_exams_where("e.course_id = $1", course_id).await
    }

    async fn fetch_exams_for_batch(&self, batch_id: i64) -> Result<Vec<ExamConfig>, StoreError> {
        self.fetch_exams_where(
            "EXISTS (SELECT 1 FROM exam_batches eb WHERE eb.exam_id = e.id AND eb.batch_id = $1)",
            batch_id,
        )
        .await
    }

    async fn upsert_answer(
        &self,
        student_id: i64,
        exam_id: i64,
        answer: &SubmittedAnswer,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let submission_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO submissions (student_id, exam_id)
            VALUES ($1, $2)
            ON CONFLICT (student_id, exam_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(exam_id)
        .fetch_one(&mut *tx)
        .await?;

        // Last write wins per question.
        sqlx::query(
            r#"
            INSERT INTO submission_answers (submission_id, question_id, chosen_option, is_correct)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (submission_id, question_id) DO UPDATE SET
                chosen_option = EXCLUDED.chosen_option,
                is_correct = EXCLUDED.is_correct,
                answered_at = NOW()
            "#,
        )
        .bind(submission_id)
        .bind(answer.question_id)
        .bind(answer.chosen_option.as_str())
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(student_id: i64, exam_id: i64, answer: Option<(i64, &str, bool)>) -> AnswerRow {
        AnswerRow {
            student_id,
            exam_id,
            question_id: answer.map(|a| a.0),
            chosen_option: answer.map(|a| a.1.to_string()),
            is_correct: answer.map(|a| a.2),
        }
    }

    #[test]
    fn test_group_rows_into_submissions() {
        let rows = vec![
            row(1, 5, Some((10, "A", true))),
            row(1, 5, Some((11, "C", false))),
            row(2, 5, None),
            row(3, 5, Some((10, "B", false))),
        ];

        let submissions = group_submissions(rows).unwrap();
        assert_eq!(submissions.len(), 3);
        assert_eq!(submissions[0].answers.len(), 2);
        assert_eq!(submissions[0].answers[1].chosen_option, OptionId::C);
        assert!(submissions[1].answers.is_empty());
        assert_eq!(submissions[2].student_id, 3);
    }

    #[test]
    fn test_group_rejects_unknown_option() {
        let rows = vec![row(1, 5, Some((10, "Z", true)))];
        assert!(matches!(
            group_submissions(rows),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_group_empty() {
        assert!(group_submissions(Vec::new()).unwrap().is_empty());
    }
}
