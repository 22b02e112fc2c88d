use crate::errors::{PlonkError, Result};
use crate::plonk::{
    alpha::{AlphaPower, AlphaSlot},
    helpers::{invert, vanishing_eval},
    settings::ProtocolVariant,
    terms::ScalarMultiplicationTerms,
    transcript::{
        Transcript, ALPHA_CHALLENGE, EVALUATION_CHALLENGE, NU_CHALLENGE, SEPARATOR_CHALLENGE,
    },
    verification_key::VerificationKey,
    widgets::{commitment_for_evaluation, is_prover_commitment},
};
use ark_std::{format, vec::Vec};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};
use waffle_algebra::prelude::*;

/// The combined contribution of every widget of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition<F> {
    /// Commitment label to coefficient.
    pub terms: ScalarMultiplicationTerms<F>,
    /// The scalar part of the identity.
    pub r_0: F,
    /// The alpha powers each widget consumed, in widget order.
    pub alpha_slots: Vec<AlphaSlot>,
    /// The first unused alpha power.
    pub final_alpha: AlphaPower<F>,
}

/// Apply the widgets of `variant` in order, starting from the `alpha`
/// challenge of the transcript.
pub fn compose<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
) -> Result<Composition<T::Field>> {
    let alpha = transcript.get_challenge_field_element(ALPHA_CHALLENGE)?;
    compose_from(variant, key, transcript, AlphaPower::from_challenge(alpha))
}

/// Apply the widgets of `variant` in order, starting from `initial`.
///
/// Nothing is returned if a widget fails.
#[instrument(skip_all, level = "debug")]
pub fn compose_from<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
    initial: AlphaPower<T::Field>,
) -> Result<Composition<T::Field>> {
    compose_widgets(variant, key, transcript, initial).map_err(|e| {
        debug!(error = %e, "composition aborted");
        e
    })
}

fn check_configuration<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
) -> Result<()> {
    variant.validate()?;
    let expected = (variant.hash_type, variant.num_challenge_bytes);
    let found = (transcript.hash_type(), transcript.num_challenge_bytes());
    if expected != found {
        return Err(PlonkError::TranscriptMismatch { expected, found });
    }
    if key.program_width != variant.program_width {
        return Err(PlonkError::ProgramWidthMismatch {
            expected: variant.program_width,
            found: key.program_width,
        });
    }
    key.validate()
}

fn compose_widgets<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
    initial: AlphaPower<T::Field>,
) -> Result<Composition<T::Field>> {
    check_configuration(variant, key, transcript)?;

    let flags = variant.flags();
    let mut alpha = initial;
    let mut r_0 = T::Field::zero();
    let mut terms = ScalarMultiplicationTerms::new();
    let mut alpha_slots = Vec::with_capacity(variant.widgets.len());

    for kind in variant.widgets.iter() {
        // both passes start from the same power and must end on the same one.
        let (after_terms, contribution) =
            kind.accumulate_scalar_terms(key, alpha, transcript, flags)?;
        let (after_quotient, next_r_0) =
            kind.accumulate_quotient_contribution(key, alpha, transcript, r_0, flags)?;
        if after_terms != after_quotient {
            return Err(PlonkError::AlphaPowerDesync(*kind));
        }

        let slot = AlphaSlot {
            widget: *kind,
            first: alpha.index(),
            count: after_terms.index() - alpha.index(),
        };
        debug!(widget = ?kind, first = slot.first, count = slot.count, "applied widget");

        alpha_slots.push(slot);
        terms.merge(contribution);
        r_0 = next_r_0;
        alpha = after_terms;
    }

    Ok(Composition {
        terms,
        r_0,
        alpha_slots,
        final_alpha: alpha,
    })
}

/// Compose independent transcripts against one key.
#[cfg(feature = "parallel")]
pub fn batch_compose<T: Transcript + Sync>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcripts: &[T],
) -> Vec<Result<Composition<T::Field>>> {
    transcripts
        .par_iter()
        .map(|t| compose(variant, key, t))
        .collect()
}

/// Compose independent transcripts against one key.
#[cfg(not(feature = "parallel"))]
pub fn batch_compose<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcripts: &[T],
) -> Vec<Result<Composition<T::Field>>> {
    transcripts
        .iter()
        .map(|t| compose(variant, key, t))
        .collect()
}

/// The input of the pairing engine: the batched opening of every committed
/// polynomial at `z` and `z * omega`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOpening<F> {
    /// Commitment label to coefficient of the batched commitment.
    pub terms: ScalarMultiplicationTerms<F>,
    /// The claimed value of the batched polynomial.
    pub batch_evaluation: F,
    /// The evaluation point.
    pub z: F,
    /// The shifted evaluation point.
    pub z_omega: F,
    /// Separates the two opening points.
    pub separator: F,
    /// Forwarded from the key.
    pub is_recursive_circuit: bool,
}

impl<F: Scalar> BatchOpening<F> {
    /// Return the pairing inputs `(P_0, P_1)`, to be checked as
    /// `e(P_0, [1]_2) = e(P_1, [x]_2)`, with
    ///
    /// * `P_0 = F - E [1] + z [PI_Z] + u z omega [PI_Z_OMEGA]`
    /// * `P_1 = [PI_Z] + u [PI_Z_OMEGA]`
    pub fn aggregate<T: Transcript<Field = F>>(
        &self,
        key: &VerificationKey<T::Commitment>,
        transcript: &T,
    ) -> Result<(T::Commitment, T::Commitment)> {
        let batch_commitment = self.terms.multi_exp(key, transcript)?;
        let pi_z = transcript.get_commitment("PI_Z")?;
        let pi_z_omega = transcript.get_commitment("PI_Z_OMEGA")?;
        let base = T::Commitment::get_base();

        let one = F::one();
        let minus_e = self.batch_evaluation.neg();
        let u_z_omega = self.separator.mul(&self.z_omega);
        let lhs = T::Commitment::multi_exp(
            &[&one, &minus_e, &self.z, &u_z_omega],
            &[&batch_commitment, &base, &pi_z, &pi_z_omega],
        )?;
        let witness = T::Commitment::multi_exp(&[&one, &self.separator], &[&pi_z, &pi_z_omega])?;
        Ok((lhs, witness))
    }
}

/// Build the batched opening for the pairing engine.
#[instrument(skip_all, level = "debug")]
pub fn compute_batch_opening<T: Transcript>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
) -> Result<BatchOpening<T::Field>> {
    // 1. compose the widgets.
    let Composition { mut terms, r_0, .. } = compose(variant, key, transcript)?;

    let z = transcript.get_challenge_field_element(EVALUATION_CHALLENGE)?;
    let separator = transcript.get_challenge_field_element(SEPARATOR_CHALLENGE)?;
    let nu = |label: &str| transcript.get_challenge_field_element_from_map(NU_CHALLENGE, label);
    let n = key.circuit_size;

    // 2. recover t(z) from the identity, and open the linearisation polynomial.
    let mut batch_evaluation = T::Field::zero();
    let mut identity = r_0;
    if variant.use_linearisation {
        let r_eval = transcript.get_field_element("r")?;
        let nu_r = nu("r")?;
        identity.add_assign(&r_eval);
        terms.scale(&nu_r);
        batch_evaluation.add_assign(&nu_r.mul(&r_eval));
    }
    let t_eval = identity.mul(&invert(&vanishing_eval(&z, n))?);

    // 3. open the quotient pieces t = T_1 + z^n T_2 + z^{2n} T_3 + ...
    let nu_t = nu("t")?;
    let z_n = z.pow(&[n as u64]);
    let mut z_pow = nu_t;
    for i in 1..=variant.program_width {
        terms.add_term(&format!("T_{}", i), z_pow);
        z_pow.mul_assign(&z_n);
    }
    batch_evaluation.add_assign(&nu_t.mul(&t_eval));

    // 4. open the remaining evaluations. Raw openings already carry their term.
    let raw_openings = variant.raw_openings();
    for label in variant.evaluation_labels().iter().filter(|l| *l != "r") {
        let (commitment, shifted) = commitment_for_evaluation(label);
        let mut coefficient = nu(label.as_str())?;
        if shifted {
            coefficient.mul_assign(&separator);
        }
        let eval = transcript.get_field_element(label)?;
        batch_evaluation.add_assign(&coefficient.mul(&eval));

        if raw_openings.contains(label) {
            continue;
        }
        if is_prover_commitment(&commitment) {
            terms.add_term(&commitment, coefficient);
        } else {
            terms.add_key_term(key, &commitment, coefficient)?;
        }
    }
    debug!(num_terms = terms.len(), "batch opening ready");

    Ok(BatchOpening {
        terms,
        batch_evaluation,
        z,
        z_omega: z.mul(&key.root),
        separator,
        is_recursive_circuit: key.is_recursive_circuit(),
    })
}

/// The pairing engine.
pub trait OpeningVerifier<G: Group> {
    /// Return true if `e(lhs, [1]_2) = e(witness, [x]_2)`. Recursive circuits
    /// carry an extra pairing point the engine accumulates itself.
    fn check_pairing(&self, lhs: &G, witness: &G, is_recursive_circuit: bool) -> bool;
}

/// Verify a proof held by `transcript`.
pub fn verify<T: Transcript, V: OpeningVerifier<T::Commitment>>(
    variant: &ProtocolVariant,
    key: &VerificationKey<T::Commitment>,
    transcript: &T,
    engine: &V,
) -> Result<()> {
    let opening = compute_batch_opening(variant, key, transcript)?;
    let (lhs, witness) = opening.aggregate(key, transcript)?;
    if engine.check_pairing(&lhs, &witness, opening.is_recursive_circuit) {
        Ok(())
    } else {
        Err(PlonkError::VerificationError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plonk::settings::{resolve, VariantTag};
    use crate::plonk::test_utils::{evaluate_terms, test_key, MockTranscript};
    use crate::plonk::transcript::HashType;
    use crate::plonk::widgets::WidgetKind;
    use waffle_algebra::bn254::{BN254Scalar, BN254G1};

    fn fixture(tag: &str) -> (ProtocolVariant, VerificationKey<BN254G1>, MockTranscript) {
        let mut prng = test_rng();
        let variant = resolve(tag).unwrap();
        let key = test_key(&variant, 3, &mut prng);
        let transcript = MockTranscript::random(&variant, &key, &mut prng);
        (variant, key, transcript)
    }

    #[test]
    fn standard_variant_ends_on_alpha_squared() {
        let (variant, key, transcript) = fixture("standard");
        let alpha = transcript.challenge("alpha");
        let composition =
            compose_from(&variant, &key, &transcript, AlphaPower::unit(alpha)).unwrap();
        assert_eq!(*composition.final_alpha.base(), alpha * alpha);
        assert_eq!(composition.final_alpha.index(), 2);
    }

    #[test]
    fn turbo_variant_ends_on_alpha_fifth() {
        let (variant, key, transcript) = fixture("turbo");
        let alpha = transcript.challenge("alpha");
        let composition =
            compose_from(&variant, &key, &transcript, AlphaPower::unit(alpha)).unwrap();
        assert_eq!(*composition.final_alpha.base(), alpha.pow(&[5]));

        // the transcript's alpha is the first power
        let composition = compose(&variant, &key, &transcript).unwrap();
        assert_eq!(*composition.final_alpha.base(), alpha.pow(&[6]));
    }

    #[test]
    fn alpha_powers_are_disjoint_without_gaps() {
        for tag in ["standard", "standard-unrolled", "turbo", "turbo-unrolled"] {
            let (variant, key, transcript) = fixture(tag);
            let composition = compose(&variant, &key, &transcript).unwrap();
            let slots = &composition.alpha_slots;
            assert_eq!(slots.len(), variant.widgets.len());

            let mut consumed: Vec<usize> = slots.iter().flat_map(|s| s.indices()).collect();
            let total = consumed.len();
            consumed.sort_unstable();
            consumed.dedup();
            assert_eq!(consumed.len(), total);
            assert_eq!(consumed, (1..=total).collect::<Vec<_>>());

            for (slot, kind) in slots.iter().zip(variant.widgets.iter()) {
                assert_eq!(slot.widget, *kind);
                assert_eq!(slot.count, kind.num_alpha_powers());
            }
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let (variant, key, transcript) = fixture("turbo-unrolled");
        assert_eq!(
            compose(&variant, &key, &transcript).unwrap(),
            compose(&variant, &key, &transcript).unwrap()
        );
    }

    #[test]
    fn linearisation_changes_labels_not_the_identity() {
        for (rolled, unrolled, sizes) in [
            ("standard", "standard-unrolled", (7, 9)),
            ("turbo", "turbo-unrolled", (12, 16)),
        ] {
            let (variant, key, mut transcript) = fixture(rolled);
            let linearised = compose(&variant, &key, &transcript).unwrap();

            let unrolled_variant = resolve(unrolled).unwrap();
            transcript.hash_type = unrolled_variant.hash_type;
            transcript.num_challenge_bytes = unrolled_variant.num_challenge_bytes;
            let full = compose(&unrolled_variant, &key, &transcript).unwrap();

            assert_eq!(linearised.terms.len(), sizes.0);
            assert_eq!(full.terms.len(), sizes.1);
            for label in linearised.terms.labels() {
                assert!(full.terms.get(label).is_some(), "{}", label);
            }
            assert_eq!(
                linearised.r_0 + evaluate_terms(&linearised.terms, &transcript),
                full.r_0
            );
        }
    }

    #[test]
    fn transcript_must_match_the_variant() {
        let (variant, key, mut transcript) = fixture("standard");
        transcript.hash_type = HashType::PedersenBlake2s;
        transcript.num_challenge_bytes = 16;
        assert_eq!(
            compose(&variant, &key, &transcript),
            Err(PlonkError::TranscriptMismatch {
                expected: (HashType::Keccak256, 32),
                found: (HashType::PedersenBlake2s, 16),
            })
        );

        let turbo = resolve("turbo").unwrap();
        transcript.hash_type = HashType::Keccak256;
        transcript.num_challenge_bytes = 32;
        assert_eq!(
            compose(&turbo, &key, &transcript),
            Err(PlonkError::ProgramWidthMismatch {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn malformed_configuration_is_rejected() {
        let (mut variant, mut key, transcript) = fixture("standard");
        variant.widgets.reverse();
        let res = compose(&variant, &key, &transcript);
        assert!(matches!(res, Err(PlonkError::InvalidVariant(_))));
        assert!(res.unwrap_err().is_malformed_input());
        variant.widgets.reverse();

        key.root = BN254Scalar::from(5u32);
        assert_eq!(
            compose(&variant, &key, &transcript),
            Err(PlonkError::Algebra(AlgebraError::ParameterError))
        );

        key.root = key.root_inverse.inv().unwrap();
        key.circuit_size = 12;
        assert_eq!(
            compute_batch_opening(&variant, &key, &transcript),
            Err(PlonkError::Algebra(AlgebraError::DomainSizeError))
        );
    }

    #[test]
    fn missing_commitment_aborts() {
        let (variant, mut key, transcript) = fixture("standard");
        key.commitments.remove("Q_M");
        let res = compose(&variant, &key, &transcript);
        assert_eq!(res, Err(PlonkError::MissingCommitment("Q_M".into())));
        assert!(res.unwrap_err().is_malformed_input());
    }

    #[test]
    fn missing_challenge_aborts() {
        let (variant, key, mut transcript) = fixture("turbo");
        transcript.challenges.remove("logic_separation");
        assert_eq!(
            compose(&variant, &key, &transcript),
            Err(PlonkError::MissingChallenge("logic_separation".into()))
        );
    }

    #[test]
    fn custom_variant_with_elliptic_widget() {
        let mut prng = test_rng();
        let variant = ProtocolVariant::custom(
            HashType::Keccak256,
            32,
            true,
            4,
            &[
                WidgetKind::Permutation,
                WidgetKind::TurboArithmetic,
                WidgetKind::Elliptic,
            ],
        )
        .unwrap();
        let key = test_key(&variant, 0, &mut prng);
        let transcript = MockTranscript::random(&variant, &key, &mut prng);
        let composition = compose(&variant, &key, &transcript).unwrap();
        assert_eq!(composition.final_alpha.index(), 4);
        assert!(composition.terms.get("Q_ELLIPTIC").is_some());
    }

    #[test]
    fn batch_compose_matches_single_runs() {
        let mut prng = test_rng();
        let variant = resolve("turbo").unwrap();
        let key = test_key(&variant, 1, &mut prng);
        let mut transcripts: Vec<MockTranscript> = (0..4)
            .map(|_| MockTranscript::random(&variant, &key, &mut prng))
            .collect();
        transcripts[2].challenges.remove("z");

        let results = batch_compose(&variant, &key, &transcripts);
        assert_eq!(results.len(), 4);
        for (res, t) in results.iter().zip(transcripts.iter()) {
            assert_eq!(*res, compose(&variant, &key, t));
        }
        assert!(results[2].is_err());
    }

    #[test]
    fn batch_opening_collects_every_commitment() {
        let (variant, key, transcript) = fixture("turbo");
        let opening = compute_batch_opening(&variant, &key, &transcript).unwrap();
        let nu = |l: &str| transcript.nu(l);
        let u = transcript.challenge("separator");
        let z = transcript.challenge("z");

        assert_eq!(opening.z_omega, z * key.root);
        assert_eq!(
            opening.terms.get("W_1"),
            Some(&(nu("w_1") + u * nu("w_1_omega")))
        );
        assert_eq!(opening.terms.get("W_3"), Some(&nu("w_3")));
        assert_eq!(
            opening.terms.get("T_2"),
            Some(&(nu("t") * z.pow(&[key.circuit_size as u64])))
        );
        // q_1 is read by the fixed-base widget, Q_1 is also in the linearisation
        let composition = compose(&variant, &key, &transcript).unwrap();
        let q_1 = *composition.terms.get("Q_1").unwrap() * nu("r") + nu("q_1");
        assert_eq!(opening.terms.get("Q_1"), Some(&q_1));

        let mut expected = nu("r") * transcript.evaluation("r");
        let t_eval = (composition.r_0 + transcript.evaluation("r"))
            * vanishing_eval(&z, key.circuit_size).inv().unwrap();
        expected = expected + nu("t") * t_eval;
        for label in variant.evaluation_labels() {
            if label == "r" {
                continue;
            }
            let mut c = nu(label.as_str());
            if label.ends_with("_omega") {
                c = c * u;
            }
            expected = expected + c * transcript.evaluation(&label);
        }
        assert_eq!(opening.batch_evaluation, expected);
    }

    #[test]
    fn unrolled_opening_does_not_repeat_raw_openings() {
        let (variant, key, transcript) = fixture("standard-unrolled");
        let opening = compute_batch_opening(&variant, &key, &transcript).unwrap();
        let u = transcript.challenge("separator");
        // Z is opened at z by the permutation widget and at z omega here
        assert_eq!(
            opening.terms.get("Z"),
            Some(&(transcript.nu("z") + u * transcript.nu("z_omega")))
        );
        assert_eq!(opening.terms.get("Q_M"), Some(&transcript.nu("q_m")));
        assert_eq!(opening.terms.get("SIGMA_3"), Some(&transcript.nu("sigma_3")));
    }

    struct FixedEngine(bool);

    impl OpeningVerifier<BN254G1> for FixedEngine {
        fn check_pairing(&self, _: &BN254G1, _: &BN254G1, _: bool) -> bool {
            self.0
        }
    }

    /// Checks `P_0 = x P_1` for a known trapdoor `x`.
    struct TrapdoorEngine(BN254Scalar);

    impl OpeningVerifier<BN254G1> for TrapdoorEngine {
        fn check_pairing(&self, lhs: &BN254G1, witness: &BN254G1, _: bool) -> bool {
            *lhs == witness.mul(&self.0)
        }
    }

    #[test]
    fn pairing_outcome_is_reported() {
        let (variant, key, transcript) = fixture("standard");
        assert_eq!(verify(&variant, &key, &transcript, &FixedEngine(true)), Ok(()));
        let res = verify(&variant, &key, &transcript, &FixedEngine(false));
        assert_eq!(res, Err(PlonkError::VerificationError));
        assert!(!res.unwrap_err().is_malformed_input());
    }

    /// Pick `PI_Z_OMEGA` so that `P_0 = x P_1` holds for the opening of `variant`.
    fn make_consistent(
        variant: &ProtocolVariant,
        key: &VerificationKey<BN254G1>,
        transcript: &mut MockTranscript,
        x: &BN254Scalar,
    ) {
        let opening = compute_batch_opening(variant, key, &*transcript).unwrap();
        let f = opening.terms.multi_exp(key, &*transcript).unwrap();
        let pi_z = transcript.commitment("PI_Z");
        let lhs_part = f - &BN254G1::get_base().mul(&opening.batch_evaluation)
            + &pi_z.mul(&opening.z.sub(x));
        let factor = opening.separator * (*x - opening.z_omega);
        let pi_z_omega = lhs_part.mul(&factor.inv().unwrap());
        transcript.commitments.insert("PI_Z_OMEGA".into(), pi_z_omega);

        let (lhs, witness) = opening.aggregate(key, &*transcript).unwrap();
        assert_eq!(lhs, witness.mul(x));
    }

    #[test]
    fn aggregate_satisfies_a_consistent_opening() {
        let x = BN254Scalar::from(1234567u32);
        for tag in VariantTag::all() {
            let (variant, key, mut transcript) = fixture(tag.as_str());
            make_consistent(&variant, &key, &mut transcript, &x);
            assert_eq!(
                verify(&variant, &key, &transcript, &TrapdoorEngine(x)),
                Ok(()),
                "{}",
                tag
            );
            assert_eq!(
                verify(&variant, &key, &transcript, &TrapdoorEngine(x + BN254Scalar::one())),
                Err(PlonkError::VerificationError),
                "{}",
                tag
            );
        }
    }

    #[test]
    fn unrolled_opening_fails_under_rolled_settings() {
        let x = BN254Scalar::from(7654321u32);
        for (rolled, unrolled) in [("standard", "standard-unrolled"), ("turbo", "turbo-unrolled")] {
            let (unrolled_variant, key, mut transcript) = fixture(unrolled);
            make_consistent(&unrolled_variant, &key, &mut transcript, &x);
            assert_eq!(
                verify(&unrolled_variant, &key, &transcript, &TrapdoorEngine(x)),
                Ok(())
            );

            let rolled_variant = resolve(rolled).unwrap();
            assert!(matches!(
                verify(&rolled_variant, &key, &transcript, &TrapdoorEngine(x)),
                Err(PlonkError::TranscriptMismatch { .. })
            ));

            // same messages, rolled challenge settings
            transcript.hash_type = rolled_variant.hash_type;
            transcript.num_challenge_bytes = rolled_variant.num_challenge_bytes;
            assert_eq!(
                verify(&rolled_variant, &key, &transcript, &TrapdoorEngine(x)),
                Err(PlonkError::VerificationError)
            );
        }
    }
}
