// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub course_id: i64,

    /// The batch the student is currently enrolled in.
    pub batch_id: i64,
}

/// Represents the 'batches' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}
