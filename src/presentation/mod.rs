//! Askama view models and the helpers that turn them into responses.

pub mod views;
