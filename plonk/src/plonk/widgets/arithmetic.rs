use super::{wire_evaluations, wire_labels, raw_opening_terms, VerifierWidget, WidgetFlags, WidgetKind};
use crate::errors::Result;
use crate::plonk::{
    alpha::AlphaPower, terms::ScalarMultiplicationTerms, transcript::Transcript,
    verification_key::VerificationKey,
};
use ark_std::{string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// Selector evaluation labels, in the order their commitments are listed.
const SELECTORS: [(&str, &str); 5] = [
    ("q_m", "Q_M"),
    ("q_1", "Q_1"),
    ("q_2", "Q_2"),
    ("q_3", "Q_3"),
    ("q_c", "Q_C"),
];

/// The width-3 gate `q_m a b + q_1 a + q_2 b + q_3 c + q_c`.
pub struct ArithmeticWidget;

/// Return the multipliers of `q_m, q_1, q_2, q_3, q_c`.
fn selector_multipliers<F: Scalar>(wires: &[F]) -> [F; 5] {
    let (a, b, c) = (wires[0], wires[1], wires[2]);
    [a.mul(&b), a, b, c, F::one()]
}

impl VerifierWidget for ArithmeticWidget {
    const KIND: WidgetKind = WidgetKind::Arithmetic;
    const MIN_PROGRAM_WIDTH: usize = 3;

    fn required_evaluations(program_width: usize, flags: WidgetFlags) -> Vec<String> {
        let mut labels = wire_labels(program_width);
        labels.extend(Self::raw_openings(program_width, flags));
        labels
    }

    fn raw_openings(_program_width: usize, flags: WidgetFlags) -> Vec<String> {
        if flags.use_linearisation {
            Vec::new()
        } else {
            SELECTORS.iter().map(|(e, _)| String::from(*e)).collect()
        }
    }

    fn accumulate_scalar_terms<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
        let terms = if flags.use_linearisation {
            let wires = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
            let mut terms = ScalarMultiplicationTerms::new();
            for ((_, commitment), m) in SELECTORS.iter().zip(selector_multipliers(&wires)) {
                terms.add_key_term(key, commitment, alpha.base().mul(&m))?;
            }
            terms
        } else {
            raw_opening_terms(key, transcript, &Self::raw_openings(key.program_width, flags))?
        };
        Ok((alpha.advance(Self::NUM_ALPHA_POWERS), terms))
    }

    fn accumulate_quotient_contribution<T: Transcript>(
        _key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        r_0: T::Field,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, T::Field)> {
        let mut r_0 = r_0;
        if !flags.use_linearisation {
            let wires = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
            let mut gate = T::Field::zero();
            for ((selector, _), m) in SELECTORS.iter().zip(selector_multipliers(&wires)) {
                gate.add_assign(&transcript.get_field_element(selector)?.mul(&m));
            }
            r_0.add_assign(&alpha.base().mul(&gate));
        }
        Ok((alpha.advance(Self::NUM_ALPHA_POWERS), r_0))
    }
}
