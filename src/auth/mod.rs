use axum::routing::get;
use axum::Router;

use crate::state::AppState;

mod dto;
mod error;
pub mod handlers;
mod otp;
pub mod repo;
mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route(
            "/verify-otp",
            get(handlers::verify_otp_page).post(handlers::verify_otp),
        )
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/welcome", get(handlers::welcome))
}
