pub mod api;
pub mod store;

pub use api::{router, AppState};
pub use store::{StoreError, StoreResult, TaskStore};
