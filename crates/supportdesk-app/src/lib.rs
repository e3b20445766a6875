pub mod app;
pub mod cli;
pub mod config;
pub mod notifier;
pub mod render;

pub use app::{run, Desk};
pub use cli::{Cli, Commands, SessionAction};
pub use config::AppConfig;
