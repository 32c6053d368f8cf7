//! Public landing route.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Greeting returned by `GET /`.
pub const WELCOME: &str = "Welcome to ML API. Please contact admin to use our system.";

#[derive(Debug, Serialize)]
struct Welcome {
    message: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> Json<Welcome> {
    Json(Welcome { message: WELCOME })
}
