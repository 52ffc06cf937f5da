//! # Usual Math
//!
//! Deterministic numeric and hashing primitives shared by the distribution
//! engine:
//!
//! - **Fixed-point arithmetic**: multiply-then-divide through 256-bit
//!   intermediates with an explicit rounding mode. Every formula stage in the
//!   engine floors; two parties evaluating the same inputs must agree
//!   bit-for-bit.
//! - **Merkle utilities**: BLAKE3 commutative-pair trees used to prove
//!   cumulative off-chain entitlements without carrying leaf indices.

pub mod fixed;
pub mod merkle;

pub use fixed::{mul_div, mul_div_floor, MathError, Rounding};
pub use merkle::{compute_root, generate_proof, hash_blake3, verify_proof};
