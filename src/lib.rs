// Library surface for the CLI front end and integration tests.
pub mod app_dirs;
pub mod autosave;
pub mod clock;
pub mod config;
pub mod deferred;
pub mod edit_policy;
pub mod export;
pub mod metrics;
pub mod session;
pub mod storage;
pub mod store;
pub mod timer;
pub mod workspace;

pub use workspace::Workspace;
