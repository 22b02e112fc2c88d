//! Field and group primitives consumed by the waffle PLONK verifier.
#![deny(unused_import_braces, trivial_casts, bare_trait_objects)]
#![deny(unused_attributes, unused_imports, unused_mut, missing_docs)]
#![deny(unused_comparisons, unused_must_use, unused_allocation)]
#![forbid(unsafe_code)]
#![allow(clippy::upper_case_acronyms)]

/// Module for the BN254 curve.
pub mod bn254;

/// Module for error handling.
pub mod errors;

/// Module for the common imports.
pub mod prelude;

/// Module for test rng.
pub mod rand_helper;

/// Module for serialization of scalars and group elements.
pub mod serialization;

/// Module for traits.
pub mod traits;

/// Module for utils.
pub mod utils;

#[doc(hidden)]
pub use ark_std::{fmt, iter, ops, rand, One, UniformRand, Zero};
