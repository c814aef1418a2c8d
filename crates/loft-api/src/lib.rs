pub mod analytics;
pub mod conversations;
pub mod messages;
pub mod middleware;
pub mod search;

use std::sync::Arc;

use loft_store::Store;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub jwt_secret: String,
}
