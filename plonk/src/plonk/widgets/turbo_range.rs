use super::{
    gated_quotient_contribution, gated_raw_openings, gated_required_evaluations,
    gated_scalar_terms, wire_evaluations, GatedIdentity, VerifierWidget, WidgetFlags, WidgetKind,
};
use crate::errors::Result;
use crate::plonk::{
    alpha::AlphaPower,
    helpers::{quad_range, separate},
    terms::ScalarMultiplicationTerms,
    transcript::Transcript,
    verification_key::VerificationKey,
};
use ark_std::{string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// Base-4 range decomposition. Each row holds four consecutive accumulators
/// `a, b, c, d` and the next row's `d`; every step `acc_{i+1} - 4 acc_i` must be
/// a base-4 digit.
pub struct TurboRangeWidget;

impl GatedIdentity for TurboRangeWidget {
    const SELECTOR: &'static str = "q_range";
    const SEPARATION: &'static str = "range_separation";
    const INPUTS: &'static [&'static str] = &["w_4_omega"];

    fn identity<T: Transcript>(transcript: &T) -> Result<T::Field> {
        let s = transcript.get_challenge_field_element(Self::SEPARATION)?;
        let w = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
        let (a, b, c, d) = (w[0], w[1], w[2], w[3]);
        let d_next = transcript.get_field_element("w_4_omega")?;
        let four = T::Field::from(4u32);

        let steps = [
            c.sub(&four.mul(&d)),
            b.sub(&four.mul(&c)),
            a.sub(&four.mul(&b)),
            d_next.sub(&four.mul(&a)),
        ];
        Ok(separate(&s, &steps.map(|f| quad_range(&f))))
    }
}

impl VerifierWidget for TurboRangeWidget {
    const KIND: WidgetKind = WidgetKind::TurboRange;
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
