#![deny(warnings)]
#![allow(clippy::needless_borrow)]
#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate serde_derive;

/// Module for error handling.
pub mod errors;

/// Module for the verifier-side TurboPLONK composition.
pub mod plonk;

pub use errors::PlonkError;
