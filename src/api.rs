//! Typed models for the protected rounds API.

pub mod rounds;

pub use rounds::*;
