//! QUBO construction.
//!
//! This module provides:
//! - [`QuboMatrix`], the symmetric quadratic-form matrix
//! - [`build_qubo`], the encoding of problem parameters into Q

mod builder;
mod matrix;

pub use builder::{build_qubo, penalized_objective, penalty_offset};
pub use matrix::QuboMatrix;
