use super::{raw_opening_terms, wire_evaluations, wire_labels, VerifierWidget, WidgetFlags, WidgetKind};
use crate::errors::Result;
use crate::plonk::{
    alpha::AlphaPower, terms::ScalarMultiplicationTerms, transcript::Transcript,
    verification_key::VerificationKey,
};
use ark_std::{string::String, vec::Vec};
use waffle_algebra::prelude::*;

const GATE_SELECTOR: &str = "q_arith";

const SELECTORS: [(&str, &str); 7] = [
    ("q_m", "Q_M"),
    ("q_1", "Q_1"),
    ("q_2", "Q_2"),
    ("q_3", "Q_3"),
    ("q_4", "Q_4"),
    ("q_5", "Q_5"),
    ("q_c", "Q_C"),
];

/// The width-4 gate
/// `q_arith (q_m a b + q_1 a + q_2 b + q_3 c + q_4 d + q_5 d (d - 1) (d - 2) + q_c)`.
pub struct TurboArithmeticWidget;

fn selector_multipliers<F: Scalar>(wires: &[F]) -> [F; 7] {
    let (a, b, c, d) = (wires[0], wires[1], wires[2], wires[3]);
    let d_1 = d.sub(&F::one());
    let d_2 = d.sub(&F::from(2u32));
    [a.mul(&b), a, b, c, d, d.mul(&d_1).mul(&d_2), F::one()]
}

impl VerifierWidget for TurboArithmeticWidget {
    const KIND: WidgetKind = WidgetKind::TurboArithmetic;
    const MIN_PROGRAM_WIDTH: usize = 4;

    fn required_evaluations(program_width: usize, flags: WidgetFlags) -> Vec<String> {
        let mut labels = wire_labels(program_width);
        labels.push(GATE_SELECTOR.into());
        labels.extend(
            Self::raw_openings(program_width, flags)
                .into_iter()
                .filter(|l| l != GATE_SELECTOR),
        );
        labels
    }

    fn raw_openings(_program_width: usize, flags: WidgetFlags) -> Vec<String> {
        if flags.use_linearisation {
            return Vec::new();
        }
        let mut labels = vec![String::from(GATE_SELECTOR)];
        labels.extend(SELECTORS.iter().map(|(e, _)| String::from(*e)));
        labels
    }

    fn accumulate_scalar_terms<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
        let terms = if flags.use_linearisation {
            let wires = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
            let gate = alpha
                .base()
                .mul(&transcript.get_field_element(GATE_SELECTOR)?);
            let mut terms = ScalarMultiplicationTerms::new();
            for ((_, commitment), m) in SELECTORS.iter().zip(selector_multipliers(&wires)) {
                terms.add_key_term(key, commitment, gate.mul(&m))?;
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
            let q_arith = transcript.get_field_element(GATE_SELECTOR)?;
            r_0.add_assign(&alpha.base().mul(&q_arith).mul(&gate));
        }
        Ok((alpha.advance(Self::NUM_ALPHA_POWERS), r_0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plonk::settings::resolve;
    use crate::plonk::test_utils::{linearised_identity, test_key, unrolled_identity, MockTranscript};
    use waffle_algebra::bn254::BN254Scalar;

    #[test]
    fn quintic_selector_multiplier() {
        let wires = [1u32, 2, 3, 5].map(BN254Scalar::from);
        let m = selector_multipliers(&wires);
        assert_eq!(m[0], BN254Scalar::from(2u32));
        assert_eq!(m[4], BN254Scalar::from(5u32));
        // 5 * 4 * 3
        assert_eq!(m[5], BN254Scalar::from(60u32));
        assert_eq!(m[6], BN254Scalar::one());
    }

    #[test]
    fn gate_selector_scales_every_term() {
        let mut prng = test_rng();
        let variant = resolve("turbo").unwrap();
        let key = test_key(&variant, 0, &mut prng);
        let mut transcript = MockTranscript::random(&variant, &key, &mut prng);
        transcript.set_evaluation(GATE_SELECTOR, BN254Scalar::zero());
        let (_, terms) = TurboArithmeticWidget::accumulate_scalar_terms(
            &key,
            AlphaPower::unit(BN254Scalar::from(7u32)),
            &transcript,
            variant.flags(),
        )
        .unwrap();
        assert_eq!(terms.len(), 7);
        assert!(terms.iter().all(|(_, c)| c.is_zero()));
    }

    #[test]
    fn both_modes_agree() {
        let mut prng = test_rng();
        let variant = resolve("turbo").unwrap();
        let key = test_key(&variant, 0, &mut prng);
        let transcript = MockTranscript::random(&variant, &key, &mut prng);
        let alpha = AlphaPower::unit(BN254Scalar::random(&mut prng));
        let lin = WidgetFlags {
            use_linearisation: true,
            use_identity_polynomials: false,
        };
        assert_eq!(
            linearised_identity::<TurboArithmeticWidget>(&key, alpha, &transcript, lin),
            unrolled_identity::<TurboArithmeticWidget>(&key, alpha, &transcript, WidgetFlags::default())
        );
    }

    #[test]
    fn evaluation_labels() {
        let lin = TurboArithmeticWidget::required_evaluations(
            4,
            WidgetFlags {
                use_linearisation: true,
                use_identity_polynomials: false,
            },
        );
        assert_eq!(lin, vec!["w_1", "w_2", "w_3", "w_4", "q_arith"]);
        let unrolled = TurboArithmeticWidget::required_evaluations(4, WidgetFlags::default());
        assert_eq!(unrolled.len(), 12);
        assert_eq!(
            TurboArithmeticWidget::raw_openings(4, WidgetFlags::default()).len(),
            8
        );
    }
}
