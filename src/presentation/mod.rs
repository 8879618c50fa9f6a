pub mod admin;
pub mod format;
pub mod views;
