pub mod config;
pub mod protocol;
pub mod task;
pub mod validate;

pub use config::{Config, ClientConfig, ServerConfig};
pub use protocol::{
    CommentCreated, Deleted, ErrorBody, NewComment, StatusChange, StatusUpdated, TaskCreated,
    TaskDraft, TaskPatch, TaskPatched,
};
pub use task::{Comment, Task, TaskId, TaskStatus};
pub use validate::{ValidationError, DATA_URL_PREFIX, MAX_IMAGE_BYTES};

use anyhow::Result;

/// Initialize tracing for a fieldboard binary
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Fieldboard core initialized");
    Ok(())
}
