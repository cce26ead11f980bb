//! TUI widgets for the encyclopedia

pub mod article;
pub mod input;
pub mod status_bar;
pub mod welcome;

pub use article::{ArticleViewState, ArticleWidget};
pub use input::InputWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
pub use welcome::WelcomeWidget;
