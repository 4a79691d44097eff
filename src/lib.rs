//! # AnythingVoice API Library
//!
//! Backend for AI voice receptionists: the lead-to-demo pipeline, provider
//! integrations, call webhooks and the admin and customer HTTP API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod notifications;
pub mod phone;
pub mod pipeline;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod webhook_verification;
pub use migration;
