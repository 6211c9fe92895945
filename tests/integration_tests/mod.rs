//! Integration tests module
//!
//! This module provides end-to-end tests for the forum crawler, including:
//! - Complete expand → navigate → extract → export pipeline
//! - Degradation and recovery scenarios at every nesting level

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
