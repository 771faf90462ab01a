//! Application service layer - use cases, config, intake, report export

pub mod app;
pub mod config;
pub mod export;
pub mod intake;
pub mod repository;
pub mod scanner;
