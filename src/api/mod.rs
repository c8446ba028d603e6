//! BlinkGuard HTTP API Module
//! REST surface for transaction analysis and the community registry

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::spawn_cleanup_task;
pub use routes::create_router;
pub use types::*;
