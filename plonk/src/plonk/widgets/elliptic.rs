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

/// Twisted Edwards point addition `(x_1, y_1) + (x_2, y_2) = (x_3, y_3)` over
/// two rows: `a, b, c, d` hold `x_1, y_1, x_2, y_2` and the next row holds
/// `x_3, y_3` and the product `x_1 y_2` in `a', b', d'`.
pub struct EllipticWidget;

impl GatedIdentity for EllipticWidget {
    const SELECTOR: &'static str = "q_elliptic";
    const SEPARATION: &'static str = "ecc_separation";
    const INPUTS: &'static [&'static str] = &["w_1_omega", "w_2_omega", "w_4_omega"];

    fn identity<T: Transcript>(transcript: &T) -> Result<T::Field> {
        let s = transcript.get_challenge_field_element(Self::SEPARATION)?;
        let w = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
        let (x_1, y_1, x_2, y_2) = (w[0], w[1], w[2], w[3]);
        let x_3 = transcript.get_field_element("w_1_omega")?;
        let y_3 = transcript.get_field_element("w_2_omega")?;
        let x_1_y_2 = transcript.get_field_element("w_4_omega")?;
        let edwards_a = T::Field::from(EDWARDS_A);
        let edwards_d = T::Field::from(EDWARDS_D);

        let y_1_x_2 = y_1.mul(&x_2);
        let d_xy = edwards_d.mul(&x_1_y_2).mul(&y_1_x_2);

        let sub_identities = [
            x_1.mul(&y_2).sub(&x_1_y_2),
            x_1_y_2.add(&y_1_x_2).sub(&x_3.add(&x_3.mul(&d_xy))),
            y_1.mul(&y_2)
                .sub(&edwards_a.mul(&x_1).mul(&x_2))
                .sub(&y_3.sub(&y_3.mul(&d_xy))),
        ];
        Ok(separate(&s, &sub_identities))
    }
}

impl VerifierWidget for EllipticWidget {
    const KIND: WidgetKind = WidgetKind::Elliptic;
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
