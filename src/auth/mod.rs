pub(crate) mod dto;
pub mod handlers;
pub mod password;
pub mod services;
pub mod session;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
