// tests/common/mod.rs

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_results::{
    config::Config,
    models::{
        exam::ExamConfig,
        question::{AnswerOption, OptionId, Question},
        student::{Batch, Student},
        submission::{Submission, SubmittedAnswer},
    },
    routes,
    state::AppState,
    store::{ExamStore, StoreError},
    utils::jwt::Claims,
};
use jsonwebtoken::{EncodingKey, Header, encode};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

#[derive(Default)]
struct Data {
    exams: Vec<ExamConfig>,
    questions: Vec<Question>,
    batches: Vec<Batch>,
    students: Vec<Student>,
    submissions: Vec<Submission>,
}

/// `ExamStore` kept in memory, so the router can be tested without Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<Data>,
}

impl InMemoryStore {
    pub fn add_batch(&self, id: i64, course_id: i64, name: &str) {
        self.data.write().unwrap().batches.push(Batch {
            id,
            course_id,
            name: name.to_string(),
        });
    }

    pub fn add_student(&self, id: i64, name: &str, course_id: i64, batch_id: i64) {
        self.data.write().unwrap().students.push(Student {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            course_id,
            batch_id,
        });
    }

    pub fn add_exam(&self, exam: ExamConfig) {
        self.data.write().unwrap().exams.push(exam);
    }

    /// Adds a question and lists it on its exam, like the exams query does.
    pub fn add_question(&self, id: i64, exam_id: i64, correct: OptionId) {
        let mut data = self.data.write().unwrap();
        if let Some(exam) = data.exams.iter_mut().find(|e| e.id == exam_id) {
            exam.question_ids.push(id);
        }
        data.questions.push(Question {
            id,
            exam_id,
            question_text: format!("Question {}", id),
            options: [OptionId::A, OptionId::B, OptionId::C, OptionId::D]
                .into_iter()
                .map(|option_id| AnswerOption {
                    option_id,
                    text: format!("Option {}", option_id),
                })
                .collect(),
            correct_option: correct,
        });
    }

    /// Stores answers as given, bypassing the upsert path.
    pub fn add_submission(&self, student_id: i64, exam_id: i64, answers: &[(i64, OptionId, bool)]) {
        self.data.write().unwrap().submissions.push(Submission {
            student_id,
            exam_id,
            answers: answers
                .iter()
                .map(|&(question_id, chosen_option, is_correct)| SubmittedAnswer {
                    question_id,
                    chosen_option,
                    is_correct,
                })
                .collect(),
        });
    }
}

#[async_trait]
impl ExamStore for InMemoryStore {
    async fn fetch_exam_config(&self, exam_id: i64) -> Result<Option<ExamConfig>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data.exams.iter().find(|e| e.id == exam_id).cloned())
    }

    async fn fetch_questions(&self, exam_id: i64) -> Result<Vec<Question>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn fetch_submission(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .submissions
            .iter()
            .find(|s| s.student_id == student_id && s.exam_id == exam_id)
            .cloned())
    }

    async fn fetch_submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .submissions
            .iter()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn fetch_submissions_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .submissions
            .iter()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn fetch_batch(&self, batch_id: i64) -> Result<Option<Batch>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data.batches.iter().find(|b| b.id == batch_id).cloned())
    }

    async fn fetch_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data.students.iter().find(|s| s.id == student_id).cloned())
    }

    async fn fetch_students_in_batch(&self, batch_id: i64) -> Result<Vec<Student>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .students
            .iter()
            .filter(|s| s.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn fetch_course_student_ids(&self, course_id: i64) -> Result<HashSet<i64>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .students
            .iter()
            .filter(|s| s.course_id == course_id)
            .map(|s| s.id)
            .collect())
    }

    async fn fetch_exams_for_course(&self, course_id: i64) -> Result<Vec<ExamConfig>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .exams
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn fetch_exams_for_batch(&self, batch_id: i64) -> Result<Vec<ExamConfig>, StoreError> {
        let data = self.data.read().unwrap();
        Ok(data
            .exams
            .iter()
            .filter(|e| e.is_assigned_to(batch_id))
            .cloned()
            .collect())
    }

    async fn upsert_answer(
        &self,
        student_id: i64,
        exam_id: i64,
        answer: &SubmittedAnswer,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap();
        let existing = data
            .submissions
            .iter()
            .position(|s| s.student_id == student_id && s.exam_id == exam_id);

        match existing {
            Some(idx) => data.submissions[idx].record_answer(answer.clone()),
            None => {
                let mut submission = Submission::new(student_id, exam_id);
                submission.record_answer(answer.clone());
                data.submissions.push(submission);
            }
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
pub fn exam(
    id: i64,
    course_id: i64,
    start_time: DateTime<Utc>,
    duration_minutes: i32,
    total_questions: i32,
    marks_per_question: f64,
    negative_mark_per_wrong_answer: f64,
    passing_percentage: f64,
    batch_ids: Vec<i64>,
) -> ExamConfig {
    ExamConfig {
        id,
        course_id,
        title: format!("Exam {}", id),
        start_time,
        duration_minutes,
        total_questions,
        marks_per_question,
        negative_mark_per_wrong_answer,
        passing_percentage,
        question_ids: Vec::new(),
        batch_ids,
    }
}

/// Signs a token the way the login service would.
pub fn token_for(user_id: i64, role: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
        + 600;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app(store: Arc<InMemoryStore>) -> String {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
    };

    let state = AppState { store, config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

pub const COURSE: i64 = 1;
pub const MORNING: i64 = 10;
pub const EVENING: i64 = 20;

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const CAROL: i64 = 3;
pub const DAN: i64 = 4;
pub const ADMIN: i64 = 500;

/// Finished two days ago: 4 questions, 5 marks each, -1 per wrong or
/// unanswered, 50% to pass.
pub const FINISHED_EXAM: i64 = 100;
/// Started ten minutes ago, one hour long, morning batch only.
pub const RUNNING_EXAM: i64 = 200;
/// Starts tomorrow.
pub const UPCOMING_EXAM: i64 = 300;
/// Finished; Carol's submission references a question that is not on it.
pub const CORRUPT_EXAM: i64 = 400;

/// A course with two batches and four students.
///
/// FINISHED_EXAM results:
/// * Alice 4 correct (20, passed)
/// * Bob 2 correct, 1 wrong, 1 unanswered (8, failed)
/// * Carol absent
/// * Dan (evening batch) 3 correct, 1 wrong (14, passed)
/// * student 99, no longer enrolled, 4 correct
pub fn seed_platform() -> Arc<InMemoryStore> {
    let now = Utc::now();
    let store = Arc::new(InMemoryStore::default());

    store.add_batch(MORNING, COURSE, "Morning");
    store.add_batch(EVENING, COURSE, "Evening");
    store.add_student(ALICE, "Alice", COURSE, MORNING);
    store.add_student(BOB, "Bob", COURSE, MORNING);
    store.add_student(CAROL, "Carol", COURSE, MORNING);
    store.add_student(DAN, "Dan", COURSE, EVENING);

    store.add_exam(exam(
        FINISHED_EXAM,
        COURSE,
        now - chrono::Duration::days(2),
        60,
        4,
        5.0,
        1.0,
        50.0,
        vec![MORNING, EVENING],
    ));
    store.add_question(1001, FINISHED_EXAM, OptionId::A);
    store.add_question(1002, FINISHED_EXAM, OptionId::B);
    store.add_question(1003, FINISHED_EXAM, OptionId::C);
    store.add_question(1004, FINISHED_EXAM, OptionId::D);

    store.add_exam(exam(
        RUNNING_EXAM,
        COURSE,
        now - chrono::Duration::minutes(10),
        60,
        2,
        1.0,
        0.0,
        50.0,
        vec![MORNING],
    ));
    store.add_question(2001, RUNNING_EXAM, OptionId::A);
    store.add_question(2002, RUNNING_EXAM, OptionId::B);

    store.add_exam(exam(
        UPCOMING_EXAM,
        COURSE,
        now + chrono::Duration::days(1),
        60,
        1,
        1.0,
        0.0,
        50.0,
        vec![MORNING],
    ));
    store.add_question(3001, UPCOMING_EXAM, OptionId::C);

    store.add_submission(
        ALICE,
        FINISHED_EXAM,
        &[
            (1001, OptionId::A, true),
            (1002, OptionId::B, true),
            (1003, OptionId::C, true),
            (1004, OptionId::D, true),
        ],
    );
    store.add_submission(
        BOB,
        FINISHED_EXAM,
        &[
            (1001, OptionId::A, true),
            (1002, OptionId::B, true),
            (1003, OptionId::A, false),
        ],
    );
    store.add_submission(
        DAN,
        FINISHED_EXAM,
        &[
            (1001, OptionId::A, true),
            (1002, OptionId::B, true),
            (1003, OptionId::C, true),
            (1004, OptionId::A, false),
        ],
    );
    store.add_submission(
        99,
        FINISHED_EXAM,
        &[
            (1001, OptionId::A, true),
            (1002, OptionId::B, true),
            (1003, OptionId::C, true),
            (1004, OptionId::D, true),
        ],
    );

    store
}

/// Adds CORRUPT_EXAM to a seeded store. Kept separate because it changes
/// course-wide averages.
pub fn add_corrupt_exam(store: &InMemoryStore) {
    store.add_exam(exam(
        CORRUPT_EXAM,
        COURSE,
        Utc::now() - chrono::Duration::days(1),
        30,
        1,
        1.0,
        0.0,
        50.0,
        vec![MORNING],
    ));
    store.add_question(4001, CORRUPT_EXAM, OptionId::A);
    store.add_submission(ALICE, CORRUPT_EXAM, &[(4001, OptionId::A, true)]);
    store.add_submission(CAROL, CORRUPT_EXAM, &[(9999, OptionId::B, true)]);
}

/// Finished exam of the course that only the morning batch sat.
pub const PREVIOUS_BATCH_EXAM: i64 = 600;
/// Finished exam of another course, assigned to the evening batch.
pub const OTHER_COURSE_EXAM: i64 = 700;

/// Gives Dan two old submissions that no longer belong to his course and
/// batch: one from when he was in the morning batch, one from another course.
pub fn add_dans_old_submissions(store: &InMemoryStore) {
    let ended = Utc::now() - chrono::Duration::days(3);

    store.add_exam(exam(
        PREVIOUS_BATCH_EXAM,
        COURSE,
        ended,
        30,
        1,
        1.0,
        0.0,
        50.0,
        vec![MORNING],
    ));
    store.add_question(6001, PREVIOUS_BATCH_EXAM, OptionId::A);
    store.add_submission(DAN, PREVIOUS_BATCH_EXAM, &[(6001, OptionId::B, false)]);

    store.add_exam(exam(
        OTHER_COURSE_EXAM,
        2,
        ended,
        30,
        1,
        1.0,
        0.0,
        50.0,
        vec![EVENING],
    ));
    store.add_question(7001, OTHER_COURSE_EXAM, OptionId::A);
    store.add_submission(DAN, OTHER_COURSE_EXAM, &[(7001, OptionId::A, true)]);
}
