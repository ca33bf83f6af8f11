use crate::{
    routes::{
        health::get_health,
        index::{get_index_route, post_index_route},
    },
    state::StudentFormState,
};
use axum::{Router, routing::get};

pub mod health;
pub mod index;

pub fn student_form_router(state: StudentFormState) -> Router {
    Router::new()
        .route("/", get(get_index_route).post(post_index_route))
        .route("/health", get(get_health))
        .with_state(state)
}
