mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::{api_key_auth, preflight_ok};
pub use state::AppState;
