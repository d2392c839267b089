//! Shared test infrastructure.

#![allow(dead_code)]

pub mod mocks;
pub mod server;
