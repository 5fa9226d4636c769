pub mod advisor;
pub mod api;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod i18n;
pub mod llm;
pub mod records;
pub mod retry;
pub mod security;
pub mod session;
pub mod sync;
pub mod translation;
pub mod weather;
