//! # Route Modules
//!
//! | Path                     | Module        | Gate          |
//! |--------------------------|---------------|---------------|
//! | `/`                      | [`home`]      | exempt        |
//! | `/v1/users`              | [`resources`] | authenticated |
//! | `/v1/products`           | [`resources`] | authenticated |
//! | `/v1/my_users/users`     | [`resources`] | authenticated |
//! | `/v1/my_users/pets`      | [`resources`] | authenticated |
//! | `/health/*`              | [`health`]    | outside       |

pub mod health;
pub mod home;
pub mod resources;

use axum::Router;

use crate::state::AppState;

/// Routes mounted behind the admission gate.
pub fn gated() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(resources::router())
}
