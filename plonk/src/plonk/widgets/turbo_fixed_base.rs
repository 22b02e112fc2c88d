use super::{
    gated_quotient_contribution, gated_raw_openings, gated_required_evaluations,
    gated_scalar_terms, wire_evaluations, GatedIdentity, VerifierWidget, WidgetFlags, WidgetKind,
    EDWARDS_A, EDWARDS_D,
};
use crate::errors::Result;
use crate::plonk::{
    alpha::AlphaPower, helpers::separate, terms::ScalarMultiplicationTerms,
    transcript::Transcript, verification_key::VerificationKey,
};
use ark_std::{string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// One step of a fixed-base scalar multiplication on the embedded twisted
/// Edwards curve.
///
/// The row holds the accumulated point `(a, b)`, the product `c = x_alpha y_alpha`
/// and the scalar accumulator `d`. The next row holds the new point `(a', b')`
/// and accumulator `d'`. The step's signed bit is `d' - 2d` and the selectors
/// `q_1, q_2` carry the precomputed base point:
///
/// * `x_alpha = q_1 bit`
/// * `y_alpha = bit^2 (q_2 - 1) + 1`
pub struct TurboFixedBaseWidget;

impl GatedIdentity for TurboFixedBaseWidget {
    const SELECTOR: &'static str = "q_fixed_base";
    const SEPARATION: &'static str = "fixed_base_separation";
    const INPUTS: &'static [&'static str] = &["w_1_omega", "w_2_omega", "w_4_omega", "q_1", "q_2"];

    fn identity<T: Transcript>(transcript: &T) -> Result<T::Field> {
        let s = transcript.get_challenge_field_element(Self::SEPARATION)?;
        let w = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
        let (a, b, c, d) = (w[0], w[1], w[2], w[3]);
        let a_next = transcript.get_field_element("w_1_omega")?;
        let b_next = transcript.get_field_element("w_2_omega")?;
        let d_next = transcript.get_field_element("w_4_omega")?;
        let q_1 = transcript.get_field_element("q_1")?;
        let q_2 = transcript.get_field_element("q_2")?;
        let one = T::Field::one();
        let edwards_a = T::Field::from(EDWARDS_A);
        let edwards_d = T::Field::from(EDWARDS_D);

        let bit = d_next.sub(&d.add(&d));
        let x_alpha = q_1.mul(&bit);
        let y_alpha = bit.square().mul(&q_2.sub(&one)).add(&one);
        let d_xy = edwards_d.mul(&a).mul(&b).mul(&c);

        let sub_identities = [
            bit.mul(&bit.sub(&one)).mul(&bit.add(&one)),
            c.sub(&x_alpha.mul(&y_alpha)),
            a_next
                .mul(&one.add(&d_xy))
                .sub(&a.mul(&y_alpha).add(&b.mul(&x_alpha))),
            b_next
                .mul(&one.sub(&d_xy))
                .sub(&b.mul(&y_alpha).sub(&edwards_a.mul(&a).mul(&x_alpha))),
        ];
        Ok(separate(&s, &sub_identities))
    }
}

impl VerifierWidget for TurboFixedBaseWidget {
    const KIND: WidgetKind = WidgetKind::TurboFixedBase;
    const MIN_PROGRAM_WIDTH: usize = 4;

    fn separation_challenge() -> Option<&'static str> {
        Some(Self::SEPARATION)
    }

    fn required_evaluations(program_width: usize, flags: WidgetFlags) -> Vec<String> {
        gated_required_evaluations::<Self>(program_width, flags)
    }

    fn raw_openings(_program_width: usize, flags: WidgetFlags) -> Vec<String> {
        gated_raw_openings::<Self>(flags)
    }

    fn accumulate_scalar_terms<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
        gated_scalar_terms::<Self, T>(key, alpha, transcript, flags)
    }

    fn accumulate_quotient_contribution<T: Transcript>(
        _key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        r_0: T::Field,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, T::Field)> {
        gated_quotient_contribution::<Self, T>(alpha, transcript, r_0, flags)
    }
}
