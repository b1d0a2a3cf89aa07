//! Core domain types and decision logic.

pub mod price;
pub mod indicator;
pub mod advisor;
pub mod action;
pub mod executor;
pub mod summary;
pub mod config;
pub mod simulation;
pub mod error;
