// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod auth;
mod health;
mod metrics;
mod root;

// Core handlers
pub use health::health_check;
pub use metrics::metrics_handler;
pub use root::root_handler;

// Identity handlers (behind the authentication middlewares)
pub use auth::{auth_status, current_user};
