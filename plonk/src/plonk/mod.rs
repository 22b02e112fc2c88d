//! The verifier-side TurboPlonk composition.

/// Module for alpha power bookkeeping.
pub mod alpha;

/// Module for help functions.
pub(crate) mod helpers;

/// Module for protocol variants.
pub mod settings;

/// Module for scalar multiplication terms.
pub mod terms;

/// Module for transcript.
pub mod transcript;

/// Module for the verification key.
pub mod verification_key;

/// Module for verifier.
pub mod verifier;

/// Module for widgets.
pub mod widgets;

#[cfg(test)]
pub(crate) mod test_utils;
