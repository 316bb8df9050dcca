mod handlers;
mod responses;
mod state;

pub use handlers::router;
pub use state::{AppConfig, AppState};
