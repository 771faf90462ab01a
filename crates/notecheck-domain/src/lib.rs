//! Domain services for the currency check pipeline

pub mod repository;
pub mod service;
