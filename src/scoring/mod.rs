pub mod engine;
pub mod error;
pub mod report;

pub use engine::{
    AnswerBreakdown, CohortRanking, PassFailSummary, RankedEntry, ScoreResult, UngradableSubmission,
    absent_students, answer_breakdown, answer_breakdown_across_exams, compute_score, pass_fail_summary,
    rank_cohort,
};
pub use error::ScoringError;
pub use report::{
    AnswerReview, CoursePassFail, ExamPerformance, StudentDashboard, course_average_percentage,
    course_pass_fail, performance_history, review_answers, student_dashboard,
};
