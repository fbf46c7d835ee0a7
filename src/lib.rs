pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod ui;
pub mod util;

pub use app::App;
pub use chat::{SessionHandle, SupportSession};
pub use config::SupportConfig;
pub use error::{Result, SupportError};
