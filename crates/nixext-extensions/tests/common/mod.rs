//! Common test utilities for nixext-extensions
//!
//! This module provides shared test infrastructure including:
//! - Constants
//! - Descriptor builders
//! - Package fixtures (ZIP, CRX)
//! - Mock command runner and pipeline wiring

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod fixtures;
pub mod mocks;

pub use builders::*;
pub use constants::*;
pub use fixtures::*;
pub use mocks::*;
