//! Provider-agnostic LLM client for the Scout synthesis pipeline (§4.6).
//!
//! Exposes [`service_profiles::LlmServiceProfiles`] as the single entry
//! point callers (the gate in `scout-gate`, the router in `scout-router`)
//! use to invoke any of the three configured tiers, plus [`pricing`] for
//! standalone cost estimation and [`health_service`] for status probes.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod pricing;
pub mod service_profiles;
pub mod services;

pub use error_handler::AiLlmError;
pub use service_profiles::{LlmCallResult, LlmServiceProfiles};
