use crate::errors::Result;
use crate::plonk::{
    alpha::AlphaPower, terms::ScalarMultiplicationTerms, transcript::Transcript,
    transcript::NU_CHALLENGE, verification_key::VerificationKey,
};
use ark_std::{format, string::String, vec::Vec};
use waffle_algebra::prelude::*;

mod arithmetic;
mod elliptic;
mod permutation;
mod turbo_arithmetic;
mod turbo_fixed_base;
mod turbo_logic;
mod turbo_range;

pub use arithmetic::ArithmeticWidget;
pub use elliptic::EllipticWidget;
pub use permutation::PermutationWidget;
pub use turbo_arithmetic::TurboArithmeticWidget;
pub use turbo_fixed_base::TurboFixedBaseWidget;
pub use turbo_logic::TurboLogicWidget;
pub use turbo_range::TurboRangeWidget;

/// Twisted Edwards `a` of the embedded Baby JubJub curve.
pub const EDWARDS_A: u64 = 168700;
/// Twisted Edwards `d` of the embedded Baby JubJub curve.
pub const EDWARDS_D: u64 = 168696;

/// The constraint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WidgetKind {
    /// Copy constraints.
    Permutation,
    /// Width-3 arithmetic gates.
    Arithmetic,
    /// Width-4 arithmetic gates.
    TurboArithmetic,
    /// Fixed-base scalar multiplication steps.
    TurboFixedBase,
    /// Base-4 range decomposition.
    TurboRange,
    /// Base-4 xor/and.
    TurboLogic,
    /// Twisted Edwards point addition.
    Elliptic,
}

/// The protocol flags a widget is applied under. They must match the prover's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WidgetFlags {
    /// Fold selector polynomials into the linearisation polynomial.
    pub use_linearisation: bool,
    /// Read the identity permutation from committed polynomials.
    pub use_identity_polynomials: bool,
}

/// The contract of one constraint family on the verifier side.
///
/// Both accumulation passes must consume the same alpha powers. The
/// orchestrator compares their results.
pub trait VerifierWidget {
    /// The family.
    const KIND: WidgetKind;

    /// Alpha powers consumed per application.
    const NUM_ALPHA_POWERS: usize = 1;

    /// Minimum number of wires per gate.
    const MIN_PROGRAM_WIDTH: usize;

    /// Challenge separating the sub-identities of the family, if it has several.
    fn separation_challenge() -> Option<&'static str> {
        None
    }

    /// Evaluation labels the prover must send for this family.
    fn required_evaluations(program_width: usize, flags: WidgetFlags) -> Vec<String>;

    /// Evaluation labels whose opening terms this family emits itself. Empty
    /// when linearised.
    fn raw_openings(program_width: usize, flags: WidgetFlags) -> Vec<String>;

    /// Contribute commitment coefficients.
    fn accumulate_scalar_terms<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)>;

    /// Add the scalar part of the family's identity to `r_0`.
    fn accumulate_quotient_contribution<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        r_0: T::Field,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, T::Field)>;
}

macro_rules! dispatch {
    ($kind:expr, $w:ident => $body:expr) => {
        match $kind {
            WidgetKind::Permutation => {
                type $w = PermutationWidget;
                $body
            }
            WidgetKind::Arithmetic => {
                type $w = ArithmeticWidget;
                $body
            }
            WidgetKind::TurboArithmetic => {
                type $w = TurboArithmeticWidget;
                $body
            }
            WidgetKind::TurboFixedBase => {
                type $w = TurboFixedBaseWidget;
                $body
            }
            WidgetKind::TurboRange => {
                type $w = TurboRangeWidget;
                $body
            }
            WidgetKind::TurboLogic => {
                type $w = TurboLogicWidget;
                $body
            }
            WidgetKind::Elliptic => {
                type $w = EllipticWidget;
                $body
            }
        }
    };
}

impl WidgetKind {
    /// Return every family.
    pub fn all() -> [WidgetKind; 7] {
        use WidgetKind::*;
        [
            Permutation,
            Arithmetic,
            TurboArithmetic,
            TurboFixedBase,
            TurboRange,
            TurboLogic,
            Elliptic,
        ]
    }

    /// Return the alpha powers consumed per application.
    pub fn num_alpha_powers(&self) -> usize {
        dispatch!(self, W => W::NUM_ALPHA_POWERS)
    }

    /// Return the minimum number of wires per gate.
    pub fn min_program_width(&self) -> usize {
        dispatch!(self, W => W::MIN_PROGRAM_WIDTH)
    }

    /// Return the separation challenge label.
    pub fn separation_challenge(&self) -> Option<&'static str> {
        dispatch!(self, W => W::separation_challenge())
    }

    /// Return the evaluation labels the prover must send.
    pub fn required_evaluations(&self, program_width: usize, flags: WidgetFlags) -> Vec<String> {
        dispatch!(self, W => W::required_evaluations(program_width, flags))
    }

    /// Return the evaluation labels opened by the widget itself.
    pub fn raw_openings(&self, program_width: usize, flags: WidgetFlags) -> Vec<String> {
        dispatch!(self, W => W::raw_openings(program_width, flags))
    }

    /// Run the scalar-term pass of this family.
    pub fn accumulate_scalar_terms<T: Transcript>(
        &self,
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
        dispatch!(self, W => W::accumulate_scalar_terms(key, alpha, transcript, flags))
    }

    /// Run the quotient pass of this family.
    pub fn accumulate_quotient_contribution<T: Transcript>(
        &self,
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        r_0: T::Field,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, T::Field)> {
        dispatch!(self, W => W::accumulate_quotient_contribution(key, alpha, transcript, r_0, flags))
    }
}

/// Return `w_1, .., w_width`.
pub(crate) fn wire_labels(program_width: usize) -> Vec<String> {
    (1..=program_width).map(|i| format!("w_{}", i)).collect()
}

/// Read the wire evaluations at `z`.
pub(crate) fn wire_evaluations<T: Transcript>(
    transcript: &T,
    program_width: usize,
) -> Result<Vec<T::Field>> {
    wire_labels(program_width)
        .iter()
        .map(|l| transcript.get_field_element(l))
        .collect()
}

/// Map an evaluation label to the commitment it opens and whether it is read
/// at the shifted point `z * omega`.
pub fn commitment_for_evaluation(label: &str) -> (String, bool) {
    let (base, shifted) = match label.strip_suffix("_omega") {
        Some(base) => (base, true),
        None => (label, false),
    };
    let commitment = match base {
        "q_arith" => "Q_ARITHMETIC_SELECTOR".into(),
        "q_fixed_base" => "Q_FIXED_BASE_SELECTOR".into(),
        "q_range" => "Q_RANGE_SELECTOR".into(),
        "q_logic" => "Q_LOGIC_SELECTOR".into(),
        "q_elliptic" => "Q_ELLIPTIC".into(),
        other => other.to_uppercase(),
    };
    (commitment, shifted)
}

/// Return true for commitments the prover sends rather than the key holds.
pub fn is_prover_commitment(label: &str) -> bool {
    label == "Z" || label.starts_with("W_") || label.starts_with("T_") || label.starts_with("PI_")
}

/// Opening terms `nu_label * [P]` for evaluations at `z` a widget opens itself.
pub(crate) fn raw_opening_terms<T: Transcript>(
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
    labels: &[String],
) -> Result<ScalarMultiplicationTerms<T::Field>> {
    let mut terms = ScalarMultiplicationTerms::new();
    for label in labels {
        let (commitment, _) = commitment_for_evaluation(label);
        let nu = transcript.get_challenge_field_element_from_map(NU_CHALLENGE, label)?;
        if is_prover_commitment(&commitment) {
            terms.add_term(&commitment, nu);
        } else {
            terms.add_key_term(key, &commitment, nu)?;
        }
    }
    Ok(terms)
}

/// A width-4 family whose identity is `q_gate * sum_j s^j c_j` for one gate
/// selector `q_gate`.
pub(crate) trait GatedIdentity {
    /// Evaluation label of the gate selector.
    const SELECTOR: &'static str;
    /// Separation challenge label.
    const SEPARATION: &'static str;
    /// Evaluations read in both modes, besides the unshifted wires.
    const INPUTS: &'static [&'static str];

    /// Return `sum_j s^j c_j`.
    fn identity<T: Transcript>(transcript: &T) -> Result<T::Field>;
}

pub(crate) fn gated_required_evaluations<W: GatedIdentity>(
    program_width: usize,
    flags: WidgetFlags,
) -> Vec<String> {
    let mut labels = wire_labels(program_width);
    labels.extend(W::INPUTS.iter().map(|l| String::from(*l)));
    if !flags.use_linearisation {
        labels.push(W::SELECTOR.into());
    }
    labels
}

pub(crate) fn gated_raw_openings<W: GatedIdentity>(flags: WidgetFlags) -> Vec<String> {
    if flags.use_linearisation {
        Vec::new()
    } else {
        vec![W::SELECTOR.into()]
    }
}

pub(crate) fn gated_scalar_terms<W: GatedIdentity + VerifierWidget, T: Transcript>(
    key: &VerificationKey<T::Commitment>,
    alpha: AlphaPower<T::Field>,
    transcript: &T,
    flags: WidgetFlags,
) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
    let terms = if flags.use_linearisation {
        let mut terms = ScalarMultiplicationTerms::new();
        let identity = W::identity(transcript)?;
        let (selector, _) = commitment_for_evaluation(W::SELECTOR);
        terms.add_key_term(key, &selector, alpha.base().mul(&identity))?;
        terms
    } else {
        raw_opening_terms(key, transcript, &gated_raw_openings::<W>(flags))?
    };
    Ok((alpha.advance(W::NUM_ALPHA_POWERS), terms))
}

pub(crate) fn gated_quotient_contribution<W: GatedIdentity + VerifierWidget, T: Transcript>(
    alpha: AlphaPower<T::Field>,
    transcript: &T,
    r_0: T::Field,
    flags: WidgetFlags,
) -> Result<(AlphaPower<T::Field>, T::Field)> {
    let mut r_0 = r_0;
    if !flags.use_linearisation {
        let q_gate = transcript.get_field_element(W::SELECTOR)?;
        let identity = W::identity(transcript)?;
        r_0.add_assign(&alpha.base().mul(&q_gate).mul(&identity));
    }
    Ok((alpha.advance(W::NUM_ALPHA_POWERS), r_0))
}
