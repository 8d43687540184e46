//! HTTP handlers

pub mod health;
pub mod balance;
pub mod status;
pub mod recommendations;
pub mod config;
pub mod workload;
