use crate::plonk::widgets::WidgetKind;
use ark_std::{error, fmt, string::String};
use waffle_algebra::prelude::AlgebraError;
use crate::plonk::transcript::HashType;

pub(crate) type Result<T> = core::result::Result<T, PlonkError>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlonkError {
    /// Algebra error
    Algebra(AlgebraError),
    /// The variant tag is not registered.
    UnknownVariant(String),
    /// A custom widget sequence was rejected.
    InvalidVariant(String),
    /// The verification key or the transcript lacks a commitment.
    MissingCommitment(String),
    /// The transcript cannot produce the challenge.
    MissingChallenge(String),
    /// The transcript lacks a prover-sent field element.
    MissingEvaluation(String),
    /// The transcript was built with a different challenge scheme.
    TranscriptMismatch {
        /// hash and challenge width of the protocol variant
        expected: (HashType, usize),
        /// hash and challenge width of the transcript
        found: (HashType, usize),
    },
    /// The key and the protocol variant disagree on the number of wires.
    ProgramWidthMismatch {
        /// width of the protocol variant
        expected: usize,
        /// width of the verification key
        found: usize,
    },
    /// The key and the transcript disagree on the number of public inputs.
    PublicInputCountMismatch {
        /// count in the verification key
        expected: usize,
        /// count in the transcript
        found: usize,
    },
    /// The two accumulation passes of a widget consumed different alpha powers.
    AlphaPowerDesync(WidgetKind),
    /// The transcript does not follow its manifest.
    ManifestError(String),
    /// Division by zero.
    DivisionByZero,
    /// Error occurred when verify.
    VerificationError,
}

impl PlonkError {
    /// Return true when the proof or its inputs are malformed, as opposed to a
    /// well-formed proof that failed the final check.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, PlonkError::VerificationError)
    }
}

impl fmt::Display for PlonkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PlonkError::*;
        match self {
            Algebra(e) => write!(f, "Algebra: {}", e),
            UnknownVariant(tag) => write!(f, "Unknown protocol variant: {}.", tag),
            InvalidVariant(msg) => write!(f, "Invalid protocol variant: {}.", msg),
            MissingCommitment(label) => write!(f, "Missing commitment {}.", label),
            MissingChallenge(label) => write!(f, "Missing challenge {}.", label),
            MissingEvaluation(label) => write!(f, "Missing evaluation {}.", label),
            TranscriptMismatch { expected, found } => write!(
                f,
                "Transcript mismatch: expected {:?}/{} bytes, found {:?}/{} bytes.",
                expected.0, expected.1, found.0, found.1
            ),
            ProgramWidthMismatch { expected, found } => write!(
                f,
                "Program width mismatch: expected {}, found {}.",
                expected, found
            ),
            PublicInputCountMismatch { expected, found } => write!(
                f,
                "Public input count mismatch: expected {}, found {}.",
                expected, found
            ),
            AlphaPowerDesync(kind) => write!(f, "Alpha power desync in {:?} widget.", kind),
            ManifestError(msg) => write!(f, "Manifest error: {}.", msg),
            DivisionByZero => f.write_str("Division by zero."),
            VerificationError => f.write_str("Verification error."),
        }
    }
}

impl error::Error for PlonkError {}

impl From<AlgebraError> for PlonkError {
    fn from(e: AlgebraError) -> PlonkError {
        PlonkError::Algebra(e)
    }
}
