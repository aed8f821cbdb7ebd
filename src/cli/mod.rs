pub mod convert;
pub mod panel;
pub mod rate;
pub mod setup;
pub mod ui;
