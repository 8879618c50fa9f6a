//! Application services layer.

pub mod admin;
pub mod auth;
pub mod error;
pub mod ordering;
pub mod pagination;
pub mod repos;
pub mod rich_text;
pub mod site;
pub mod slugs;
pub mod storage;
pub mod summary;
pub mod validation;
