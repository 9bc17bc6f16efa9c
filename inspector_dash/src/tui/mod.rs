//! Terminal User Interface for the request inspector dashboard

mod app;
mod ui;

pub use app::TuiApp;
pub use ui::draw;
