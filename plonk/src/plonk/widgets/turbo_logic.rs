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

/// Base-4 xor/and. Columns `a, b, d` accumulate the two inputs and the output
/// quad by quad, `c` holds the product of the input quads and `q_c` picks the
/// operation (1 for and, -1 for xor).
pub struct TurboLogicWidget;

// The identity is q_logic * A = 0 with
// A = B + E
// B = q_c * [9c - 3(a+b)]
// E = 3(a+b+c) - 2F
// F = w[w(4w - 18(a+b) + 81) + 18(a^2 + b^2) - 81(a+b) + 83]
fn delta_xor_and<F: Scalar>(a: &F, b: &F, w: &F, c: &F, q_c: &F) -> F {
    let a_plus_b = a.add(b);
    let inner = w
        .mul(&F::from(4u32))
        .sub(&F::from(18u32).mul(&a_plus_b))
        .add(&F::from(81u32));
    let f = w.mul(
        &w.mul(&inner)
            .add(&F::from(18u32).mul(&a.square().add(&b.square())))
            .sub(&F::from(81u32).mul(&a_plus_b))
            .add(&F::from(83u32)),
    );
    let e = F::from(3u32)
        .mul(&a_plus_b.add(c))
        .sub(&F::from(2u32).mul(&f));
    let big_b = q_c.mul(&F::from(9u32).mul(c).sub(&F::from(3u32).mul(&a_plus_b)));
    big_b.add(&e)
}

impl GatedIdentity for TurboLogicWidget {
    const SELECTOR: &'static str = "q_logic";
    const SEPARATION: &'static str = "logic_separation";
    const INPUTS: &'static [&'static str] = &["w_1_omega", "w_2_omega", "w_4_omega", "q_c"];

    fn identity<T: Transcript>(transcript: &T) -> Result<T::Field> {
        let s = transcript.get_challenge_field_element(Self::SEPARATION)?;
        let w = wire_evaluations(transcript, Self::MIN_PROGRAM_WIDTH)?;
        let (a, b, c, d) = (w[0], w[1], w[2], w[3]);
        let a_next = transcript.get_field_element("w_1_omega")?;
        let b_next = transcript.get_field_element("w_2_omega")?;
        let d_next = transcript.get_field_element("w_4_omega")?;
        let q_c = transcript.get_field_element("q_c")?;
        let four = T::Field::from(4u32);

        let a_quad = a_next.sub(&four.mul(&a));
        let b_quad = b_next.sub(&four.mul(&b));
        let d_quad = d_next.sub(&four.mul(&d));

        let sub_identities = [
            quad_range(&a_quad),
            quad_range(&b_quad),
            quad_range(&d_quad),
            c.sub(&a_quad.mul(&b_quad)),
            delta_xor_and(&a_quad, &b_quad, &c, &d_quad, &q_c),
        ];
        Ok(separate(&s, &sub_identities))
    }
}

impl VerifierWidget for TurboLogicWidget {
    const KIND: WidgetKind = WidgetKind::TurboLogic;
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
