// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{answers, exams, reports, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Student routes (taking exams, own results) require a valid token.
/// * Admin report routes additionally require the 'admin' role.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            axum::http::HeaderValue::from_static("http://localhost:3000"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let student_routes = Router::new()
        .route("/exams/available", get(exams::get_available_exams))
        .route("/exams/{exam_id}/questions", get(exams::get_questions))
        .route(
            "/exams/{exam_id}/answers",
            post(answers::submit_answer).get(exams::get_saved_answers),
        )
        .route("/exams/{exam_id}/result", get(results::get_my_result))
        .route("/me/history", get(results::get_my_history))
        .route("/me/dashboard", get(results::get_my_dashboard))
        .route("/me/breakdown", get(results::get_my_breakdown))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/batches/{batch_id}/exams/{exam_id}/rankings",
            get(reports::get_rankings),
        )
        .route(
            "/batches/{batch_id}/exams/{exam_id}/absent",
            get(reports::get_absent_students),
        )
        .route(
            "/batches/{batch_id}/exams/{exam_id}/pass-fail",
            get(reports::get_pass_fail),
        )
        .route(
            "/batches/{batch_id}/exams/{exam_id}/breakdown",
            get(reports::get_breakdown),
        )
        .route(
            "/students/{student_id}/exams/{exam_id}/result",
            get(reports::get_student_result),
        )
        .route("/courses/{course_id}/average", get(reports::get_course_average))
        .route("/courses/{course_id}/pass-fail", get(reports::get_course_pass_fail))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", student_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
