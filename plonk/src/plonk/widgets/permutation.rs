use super::{raw_opening_terms, wire_evaluations, wire_labels, VerifierWidget, WidgetFlags, WidgetKind};
use crate::errors::{PlonkError, Result};
use crate::plonk::{
    alpha::AlphaPower,
    helpers::{first_lagrange_eval, penultimate_lagrange_eval, public_input_delta},
    terms::ScalarMultiplicationTerms,
    transcript::{Transcript, BETA_CHALLENGE, EVALUATION_CHALLENGE, GAMMA_CHALLENGE},
    verification_key::VerificationKey,
};
use ark_std::{format, string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// Separates the grand product from its boundary conditions.
pub const PERMUTATION_SEPARATION: &str = "permutation_separation";

/// Label of the public input vector.
pub const PUBLIC_INPUTS: &str = "public_inputs";

/// The copy-constraint argument. With separation challenge `s` its identity is
///
/// `(z - omega^{-1}) (Z(z) prod(w_i + beta id_i + gamma) - Z(z omega) prod(w_i + beta sigma_i + gamma))
///   + s (Z(z) - 1) L_0(z) + s^2 (Z(z omega) - delta_pi) L_{n-2}(z)`.
pub struct PermutationWidget;

fn sigma_label(i: usize) -> String {
    format!("sigma_{}", i)
}

fn id_label(i: usize) -> String {
    format!("id_{}", i)
}

/// Everything the two passes share.
struct GrandProduct<F> {
    beta: F,
    gamma: F,
    separation: F,
    last_row_gate: F,
    l_first: F,
    l_end: F,
    delta_pi: F,
    z_omega_eval: F,
    identity_product: F,
    sigma_product: F,
    last_wire: F,
}

impl<F: Scalar> GrandProduct<F> {
    fn new<T: Transcript<Field = F>>(
        key: &VerificationKey<T::Commitment>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<Self> {
        let width = key.program_width;
        let beta = transcript.get_challenge_field_element(BETA_CHALLENGE)?;
        let gamma = transcript.get_challenge_field_element(GAMMA_CHALLENGE)?;
        let separation = transcript.get_challenge_field_element(PERMUTATION_SEPARATION)?;
        let z = transcript.get_challenge_field_element(EVALUATION_CHALLENGE)?;

        let wires = wire_evaluations(transcript, width)?;
        let z_omega_eval = transcript.get_field_element("z_omega")?;
        let public_inputs = transcript.get_field_element_vector(PUBLIC_INPUTS)?;
        if public_inputs.len() != key.num_public_inputs {
            return Err(PlonkError::PublicInputCountMismatch {
                expected: key.num_public_inputs,
                found: public_inputs.len(),
            });
        }

        let mut identity_product = F::one();
        for (i, w) in wires.iter().enumerate() {
            let id = if flags.use_identity_polynomials {
                transcript.get_field_element(&id_label(i + 1))?
            } else {
                key.coset_generator(i)?.mul(&z)
            };
            identity_product.mul_assign(&w.add(&beta.mul(&id)).add(&gamma));
        }

        let mut sigma_product = F::one();
        for (i, w) in wires.iter().take(width.saturating_sub(1)).enumerate() {
            let sigma = transcript.get_field_element(&sigma_label(i + 1))?;
            sigma_product.mul_assign(&w.add(&beta.mul(&sigma)).add(&gamma));
        }

        let n = key.circuit_size;
        Ok(Self {
            beta,
            gamma,
            separation,
            last_row_gate: z.sub(&key.root_inverse),
            l_first: first_lagrange_eval(&z, n)?,
            l_end: penultimate_lagrange_eval(&z, n, &key.root)?,
            delta_pi: public_input_delta(
                &public_inputs,
                &beta,
                &gamma,
                &key.root,
                &key.external_coset_generator()?,
            )?,
            z_omega_eval,
            identity_product,
            sigma_product,
            last_wire: wires.last().copied().unwrap_or_else(F::zero),
        })
    }

    /// `s^2 (Z(z omega) - delta_pi) L_{n-2}(z)`
    fn end_condition(&self) -> F {
        self.separation
            .square()
            .mul(&self.z_omega_eval.sub(&self.delta_pi))
            .mul(&self.l_end)
    }
}

impl VerifierWidget for PermutationWidget {
    const KIND: WidgetKind = WidgetKind::Permutation;
    const MIN_PROGRAM_WIDTH: usize = 2;

    fn separation_challenge() -> Option<&'static str> {
        Some(PERMUTATION_SEPARATION)
    }

    fn required_evaluations(program_width: usize, flags: WidgetFlags) -> Vec<String> {
        let mut labels = wire_labels(program_width);
        labels.extend((1..program_width).map(sigma_label));
        labels.push("z_omega".into());
        labels.extend(Self::raw_openings(program_width, flags));
        if flags.use_identity_polynomials && flags.use_linearisation {
            labels.extend((1..=program_width).map(id_label));
        }
        labels
    }

    fn raw_openings(program_width: usize, flags: WidgetFlags) -> Vec<String> {
        if flags.use_linearisation {
            return Vec::new();
        }
        let mut labels = vec![String::from("z")];
        labels.extend((1..=program_width).map(sigma_label));
        if flags.use_identity_polynomials {
            labels.extend((1..=program_width).map(id_label));
        }
        labels
    }

    fn accumulate_scalar_terms<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, ScalarMultiplicationTerms<T::Field>)> {
        let terms = if flags.use_linearisation {
            let gp = GrandProduct::new(key, transcript, flags)?;
            let mut terms = ScalarMultiplicationTerms::new();

            // Z: (z - omega^{-1}) prod(w_i + beta id_i + gamma) + s L_0(z)
            let z_coefficient = gp
                .last_row_gate
                .mul(&gp.identity_product)
                .add(&gp.separation.mul(&gp.l_first));
            terms.add_term("Z", alpha.base().mul(&z_coefficient));

            // SIGMA_w: -(z - omega^{-1}) Z(z omega) beta prod_{i < w}(w_i + beta sigma_i + gamma)
            let sigma_coefficient = gp
                .last_row_gate
                .mul(&gp.z_omega_eval)
                .mul(&gp.beta)
                .mul(&gp.sigma_product)
                .neg();
            terms.add_key_term(
                key,
                &format!("SIGMA_{}", key.program_width),
                alpha.base().mul(&sigma_coefficient),
            )?;
            terms
        } else {
            raw_opening_terms(
                key,
                transcript,
                &Self::raw_openings(key.program_width, flags),
            )?
        };
        Ok((alpha.advance(Self::NUM_ALPHA_POWERS), terms))
    }

    fn accumulate_quotient_contribution<T: Transcript>(
        key: &VerificationKey<T::Commitment>,
        alpha: AlphaPower<T::Field>,
        transcript: &T,
        r_0: T::Field,
        flags: WidgetFlags,
    ) -> Result<(AlphaPower<T::Field>, T::Field)> {
        let gp = GrandProduct::new(key, transcript, flags)?;

        let contribution = if flags.use_linearisation {
            let sigma_part = gp
                .last_row_gate
                .mul(&gp.z_omega_eval)
                .mul(&gp.sigma_product)
                .mul(&gp.last_wire.add(&gp.gamma));
            gp.end_condition()
                .sub(&sigma_part)
                .sub(&gp.separation.mul(&gp.l_first))
        } else {
            let z_eval = transcript.get_field_element("z")?;
            let last_sigma = transcript.get_field_element(&sigma_label(key.program_width))?;
            let last_factor = gp
                .last_wire
                .add(&gp.beta.mul(&last_sigma))
                .add(&gp.gamma);
            let grand_product = z_eval.mul(&gp.identity_product).sub(
                &gp.z_omega_eval
                    .mul(&gp.sigma_product)
                    .mul(&last_factor),
            );
            gp.last_row_gate
                .mul(&grand_product)
                .add(&gp.separation.mul(&z_eval.sub(&T::Field::one())).mul(&gp.l_first))
                .add(&gp.end_condition())
        };

        let mut r_0 = r_0;
        r_0.add_assign(&alpha.base().mul(&contribution));
        Ok((alpha.advance(Self::NUM_ALPHA_POWERS), r_0))
    }
}
