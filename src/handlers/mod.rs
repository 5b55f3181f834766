// src/handlers/mod.rs

pub mod answers;
pub mod exams;
mod helpers;
pub mod reports;
pub mod results;
