pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod fingerprint;
pub mod orchestrator;
pub mod reasoning;
