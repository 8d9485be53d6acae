//! Scribe: a small community blogging service.
//!
//! Layers follow the usual split: `domain` holds records and pure rules,
//! `application` owns services and repository traits, `infra` wires Postgres,
//! HTTP and telemetry, `cache` serves the global feed from memory and
//! `presentation` renders askama views.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
