//! nasha - master catalog transformer for cannabis listing platforms.
//!
//! Core library exposing the transformation pipeline: taxonomy lookup,
//! row classification, field extraction, platform schema mapping and the
//! batch orchestrator that drives them.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod catalog;
pub mod config;
pub mod llm;
pub mod platform;
pub mod services;
pub mod taxonomy;
