//! Fixtures for the widget and orchestrator tests.

use crate::errors::{PlonkError, Result};
use crate::plonk::{
    alpha::AlphaPower,
    settings::ProtocolVariant,
    terms::ScalarMultiplicationTerms,
    transcript::{HashType, Transcript, NU_CHALLENGE},
    verification_key::VerificationKey,
    widgets::{commitment_for_evaluation, VerifierWidget, WidgetFlags, WidgetKind},
};
use ark_std::{collections::BTreeMap, format, string::String, vec::Vec};
use waffle_algebra::{
    bn254::{BN254Scalar, BN254G1},
    prelude::*,
};

/// Commitment labels of every selector family.
const SELECTOR_COMMITMENTS: [&str; 12] = [
    "Q_M",
    "Q_1",
    "Q_2",
    "Q_3",
    "Q_4",
    "Q_5",
    "Q_C",
    "Q_ARITHMETIC_SELECTOR",
    "Q_FIXED_BASE_SELECTOR",
    "Q_RANGE_SELECTOR",
    "Q_LOGIC_SELECTOR",
    "Q_ELLIPTIC",
];

/// A key over a domain of 16 with random commitments for every label a
/// widget may ask for.
pub(crate) fn test_key<R: CryptoRng + RngCore>(
    variant: &ProtocolVariant,
    num_public_inputs: usize,
    prng: &mut R,
) -> VerificationKey<BN254G1> {
    let mut commitments = BTreeMap::new();
    for label in SELECTOR_COMMITMENTS {
        commitments.insert(label.into(), BN254G1::random(prng));
    }
    for i in 1..=variant.program_width {
        commitments.insert(format!("SIGMA_{}", i), BN254G1::random(prng));
        commitments.insert(format!("ID_{}", i), BN254G1::random(prng));
    }
    VerificationKey::new(16, num_public_inputs, variant.program_width, commitments).unwrap()
}

/// An in-memory transcript with directly settable contents.
#[derive(Debug, Clone)]
pub(crate) struct MockTranscript {
    pub hash_type: HashType,
    pub num_challenge_bytes: usize,
    pub challenges: BTreeMap<String, BN254Scalar>,
    pub nu: BTreeMap<String, BN254Scalar>,
    pub evaluations: BTreeMap<String, BN254Scalar>,
    pub vectors: BTreeMap<String, Vec<BN254Scalar>>,
    pub commitments: BTreeMap<String, BN254G1>,
}

impl MockTranscript {
    /// Fill every challenge, evaluation and prover commitment any widget
    /// reads under `variant`'s width, in both modes and with identity
    /// polynomials.
    pub fn random<R: CryptoRng + RngCore>(
        variant: &ProtocolVariant,
        key: &VerificationKey<BN254G1>,
        prng: &mut R,
    ) -> Self {
        let width = variant.program_width;
        let mut challenges = BTreeMap::new();
        let mut labels: Vec<&str> = vec!["init", "beta", "gamma", "alpha", "z", "separator"];
        labels.extend(WidgetKind::all().iter().filter_map(|w| w.separation_challenge()));
        for label in labels {
            challenges.insert(label.into(), BN254Scalar::random(prng));
        }

        let mut evaluations = BTreeMap::new();
        for kind in WidgetKind::all() {
            for use_linearisation in [true, false] {
                let flags = WidgetFlags {
                    use_linearisation,
                    use_identity_polynomials: true,
                };
                for label in kind.required_evaluations(width, flags) {
                    evaluations
                        .entry(label)
                        .or_insert_with(|| BN254Scalar::random(prng));
                }
            }
        }
        evaluations.insert("r".into(), BN254Scalar::random(prng));

        let mut nu = BTreeMap::new();
        for label in evaluations.keys().chain(["t".to_string()].iter()) {
            nu.insert(label.clone(), BN254Scalar::random(prng));
        }

        let mut vectors = BTreeMap::new();
        vectors.insert(
            "public_inputs".into(),
            (0..key.num_public_inputs)
                .map(|_| BN254Scalar::random(prng))
                .collect(),
        );

        let mut commitments = BTreeMap::new();
        commitments.insert("Z".into(), BN254G1::random(prng));
        commitments.insert("PI_Z".into(), BN254G1::random(prng));
        commitments.insert("PI_Z_OMEGA".into(), BN254G1::random(prng));
        for i in 1..=width {
            commitments.insert(format!("W_{}", i), BN254G1::random(prng));
            commitments.insert(format!("T_{}", i), BN254G1::random(prng));
        }

        Self {
            hash_type: variant.hash_type,
            num_challenge_bytes: variant.num_challenge_bytes,
            challenges,
            nu,
            evaluations,
            vectors,
            commitments,
        }
    }

    pub fn set_evaluation(&mut self, label: &str, value: BN254Scalar) {
        self.evaluations.insert(label.into(), value);
    }

    pub fn set_vector(&mut self, label: &str, value: Vec<BN254Scalar>) {
        self.vectors.insert(label.into(), value);
    }

    pub fn challenge(&self, label: &str) -> BN254Scalar {
        self.challenges[label]
    }

    pub fn evaluation(&self, label: &str) -> BN254Scalar {
        self.evaluations[label]
    }

    pub fn nu(&self, label: &str) -> BN254Scalar {
        self.nu[label]
    }

    pub fn commitment(&self, label: &str) -> BN254G1 {
        self.commitments[label]
    }

    /// Return the evaluation opening the commitment `label` at `z`.
    pub fn evaluation_of_commitment(&self, label: &str) -> BN254Scalar {
        self.evaluations
            .iter()
            .find(|(e, _)| commitment_for_evaluation(e) == (label.to_string(), false))
            .map(|(_, v)| *v)
            .unwrap()
    }
}

impl Transcript for MockTranscript {
    type Field = BN254Scalar;
    type Commitment = BN254G1;

    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    fn num_challenge_bytes(&self) -> usize {
        self.num_challenge_bytes
    }

    fn get_challenge_field_element(&self, label: &str) -> Result<BN254Scalar> {
        self.challenges
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingChallenge(label.into()))
    }

    fn get_challenge_field_element_from_map(
        &self,
        challenge: &str,
        label: &str,
    ) -> Result<BN254Scalar> {
        if challenge != NU_CHALLENGE {
            return Err(PlonkError::MissingChallenge(challenge.into()));
        }
        self.nu
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingChallenge(format!("{}[{}]", challenge, label)))
    }

    fn get_field_element(&self, label: &str) -> Result<BN254Scalar> {
        self.evaluations
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingEvaluation(label.into()))
    }

    fn get_field_element_vector(&self, label: &str) -> Result<Vec<BN254Scalar>> {
        self.vectors
            .get(label)
            .cloned()
            .ok_or_else(|| PlonkError::MissingEvaluation(label.into()))
    }

    fn get_commitment(&self, label: &str) -> Result<BN254G1> {
        self.commitments
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingCommitment(label.into()))
    }
}

/// Evaluate the linearised identity: `r_0` plus every scalar term times the
/// evaluation of its polynomial.
pub(crate) fn linearised_identity<W: VerifierWidget>(
    key: &VerificationKey<BN254G1>,
    alpha: AlphaPower<BN254Scalar>,
    transcript: &MockTranscript,
    flags: WidgetFlags,
) -> BN254Scalar {
    let (_, terms) = W::accumulate_scalar_terms(key, alpha, transcript, flags).unwrap();
    let (_, r_0) = W::accumulate_quotient_contribution(
        key,
        alpha,
        transcript,
        BN254Scalar::zero(),
        flags,
    )
    .unwrap();
    r_0 + evaluate_terms(&terms, transcript)
}

/// Return `sum_label coefficient * P_label(z)`.
pub(crate) fn evaluate_terms(
    terms: &ScalarMultiplicationTerms<BN254Scalar>,
    transcript: &MockTranscript,
) -> BN254Scalar {
    terms
        .iter()
        .map(|(label, c)| *c * transcript.evaluation_of_commitment(label))
        .sum()
}

/// The full identity as computed by the unrolled quotient pass.
pub(crate) fn unrolled_identity<W: VerifierWidget>(
    key: &VerificationKey<BN254G1>,
    alpha: AlphaPower<BN254Scalar>,
    transcript: &MockTranscript,
    flags: WidgetFlags,
) -> BN254Scalar {
    let (_, r_0) = W::accumulate_quotient_contribution(
        key,
        alpha,
        transcript,
        BN254Scalar::zero(),
        flags,
    )
    .unwrap();
    r_0
}
