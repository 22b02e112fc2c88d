use crate::errors::{PlonkError, Result};
use ark_std::{collections::BTreeMap, marker::PhantomData, string::String, vec::Vec};
use blake2::Blake2s256;
use sha3::{Digest, Keccak256};
use waffle_algebra::prelude::*;

/// Challenge drawn from the circuit metadata.
pub const INIT_CHALLENGE: &str = "init";
/// Permutation challenge.
pub const BETA_CHALLENGE: &str = "beta";
/// Permutation challenge.
pub const GAMMA_CHALLENGE: &str = "gamma";
/// Challenge combining the constraint families.
pub const ALPHA_CHALLENGE: &str = "alpha";
/// Evaluation point.
pub const EVALUATION_CHALLENGE: &str = "z";
/// Map challenge batching the opened polynomials.
pub const NU_CHALLENGE: &str = "nu";
/// Challenge separating the openings at `z` and `z * omega`.
pub const SEPARATOR_CHALLENGE: &str = "separator";

/// The hash used to derive challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashType {
    /// Keccak-256, 32-byte challenges.
    Keccak256,
    /// Pedersen pre-compression followed by Blake2s, 16-byte challenges. The
    /// Pedersen compression is a circuit-side optimisation of the prover; the
    /// native verifier only needs the Blake2s digest.
    PedersenBlake2s,
}

impl HashType {
    /// Digest `data`.
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashType::Keccak256 => Keccak256::digest(data).to_vec(),
            HashType::PedersenBlake2s => Blake2s256::digest(data).to_vec(),
        }
    }

    /// Return the digest length.
    pub fn output_len(&self) -> usize {
        32
    }
}

/// Query-by-label access to a Fiat-Shamir transcript.
pub trait Transcript {
    /// The scalar field.
    type Field: Scalar;
    /// The commitment group.
    type Commitment: Group<ScalarType = Self::Field>;

    /// Return the hash used to derive challenges.
    fn hash_type(&self) -> HashType;

    /// Return the width of a challenge in bytes.
    fn num_challenge_bytes(&self) -> usize;

    /// Return the challenge with this label.
    fn get_challenge_field_element(&self, label: &str) -> Result<Self::Field>;

    /// Return the member `label` of the map challenge `challenge`.
    fn get_challenge_field_element_from_map(
        &self,
        challenge: &str,
        label: &str,
    ) -> Result<Self::Field>;

    /// Return the prover-sent field element with this label.
    fn get_field_element(&self, label: &str) -> Result<Self::Field>;

    /// Return the prover-sent vector of field elements with this label.
    fn get_field_element_vector(&self, label: &str) -> Result<Vec<Self::Field>>;

    /// Return the prover-sent commitment with this label.
    fn get_commitment(&self, label: &str) -> Result<Self::Commitment>;
}

/// One prover message of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The label.
    pub name: String,
    /// Encoded size.
    pub num_bytes: usize,
    /// Computed by the verifier, hence absent from the serialized transcript.
    pub derived_by_verifier: bool,
}

impl ManifestEntry {
    /// A prover-sent element.
    pub fn new(name: &str, num_bytes: usize) -> Self {
        Self {
            name: name.into(),
            num_bytes,
            derived_by_verifier: false,
        }
    }
}

/// The messages of one round and the challenges derived at its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundManifest {
    /// Prover messages, hashed in this order.
    pub elements: Vec<ManifestEntry>,
    /// Challenge labels.
    pub challenges: Vec<String>,
    /// A map challenge yields one element per queried label.
    pub map_challenge: bool,
}

/// The ordered rounds of a proof.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Rounds in protocol order.
    pub rounds: Vec<RoundManifest>,
}

impl Manifest {
    /// Return the number of serialized bytes.
    pub fn size(&self) -> usize {
        self.rounds
            .iter()
            .flat_map(|r| r.elements.iter())
            .filter(|e| !e.derived_by_verifier)
            .map(|e| e.num_bytes)
            .sum()
    }

    /// Return the labels of the round deriving `challenge`.
    pub fn round_of_challenge(&self, challenge: &str) -> Option<&RoundManifest> {
        self.rounds
            .iter()
            .find(|r| r.challenges.iter().any(|c| c == challenge))
    }
}

/// A manifest-driven transcript hashing each round together with the digest
/// of the previous one.
///
/// The `i`-th challenge of a round is `H(round_digest || i)`, members of a map
/// challenge are `H(round_digest || label)`, both truncated to the challenge
/// width and read little-endian.
#[derive(Debug, Clone)]
pub struct StandardTranscript<G: Group> {
    manifest: Manifest,
    hash_type: HashType,
    num_challenge_bytes: usize,
    elements: BTreeMap<String, Vec<u8>>,
    challenges: BTreeMap<String, G::ScalarType>,
    map_digests: BTreeMap<String, Vec<u8>>,
    current_round: usize,
    previous_digest: Vec<u8>,
    _group: PhantomData<G>,
}

impl<G: Group> StandardTranscript<G> {
    /// Create an empty transcript following `manifest`.
    pub fn new(manifest: Manifest, hash_type: HashType, num_challenge_bytes: usize) -> Result<Self> {
        if num_challenge_bytes == 0
            || num_challenge_bytes > hash_type.output_len()
            || num_challenge_bytes > G::ScalarType::bytes_len()
        {
            return Err(PlonkError::ManifestError(format!(
                "unsupported challenge width {}",
                num_challenge_bytes
            )));
        }
        Ok(Self {
            manifest,
            hash_type,
            num_challenge_bytes,
            elements: BTreeMap::new(),
            challenges: BTreeMap::new(),
            map_digests: BTreeMap::new(),
            current_round: 0,
            previous_digest: Vec::new(),
            _group: PhantomData,
        })
    }

    /// Return the manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Return the number of completed rounds.
    pub fn completed_rounds(&self) -> usize {
        self.current_round
    }

    /// Record the raw bytes of a prover message.
    pub fn add_element(&mut self, name: &str, bytes: Vec<u8>) {
        self.elements.insert(name.into(), bytes);
    }

    /// Record a field element.
    pub fn add_field_element(&mut self, name: &str, element: &G::ScalarType) {
        self.add_element(name, element.to_bytes());
    }

    /// Record a vector of field elements.
    pub fn add_field_element_vector(&mut self, name: &str, elements: &[G::ScalarType]) {
        let bytes = elements.iter().flat_map(|e| e.to_bytes()).collect();
        self.add_element(name, bytes);
    }

    /// Record a commitment.
    pub fn add_commitment(&mut self, name: &str, commitment: &G) -> Result<()> {
        self.add_element(name, commitment.to_compressed_bytes()?);
        Ok(())
    }

    /// Close the current round and derive its challenges. `challenge` must be
    /// the first challenge label of the round.
    pub fn apply_fiat_shamir(&mut self, challenge: &str) -> Result<()> {
        let round = self
            .manifest
            .rounds
            .get(self.current_round)
            .ok_or_else(|| PlonkError::ManifestError("all rounds are complete".into()))?;
        if round.challenges.first().map(String::as_str) != Some(challenge) {
            return Err(PlonkError::ManifestError(format!(
                "round {} does not derive {}",
                self.current_round, challenge
            )));
        }

        let mut buffer = self.previous_digest.clone();
        for entry in round.elements.iter().filter(|e| !e.derived_by_verifier) {
            let bytes = self
                .elements
                .get(&entry.name)
                .ok_or_else(|| PlonkError::ManifestError(format!("{} is missing", entry.name)))?;
            if bytes.len() != entry.num_bytes {
                return Err(PlonkError::ManifestError(format!(
                    "{} has {} bytes, expected {}",
                    entry.name,
                    bytes.len(),
                    entry.num_bytes
                )));
            }
            buffer.extend_from_slice(bytes);
        }
        let digest = self.hash_type.hash(&buffer);

        if round.map_challenge {
            for label in round.challenges.iter() {
                self.map_digests.insert(label.clone(), digest.clone());
            }
        } else {
            for (i, label) in round.challenges.iter().enumerate() {
                let mut input = digest.clone();
                input.push(i as u8);
                let element = self.truncate_to_field(&self.hash_type.hash(&input))?;
                self.challenges.insert(label.clone(), element);
            }
        }

        self.previous_digest = digest;
        self.current_round += 1;
        Ok(())
    }

    /// Replay a serialized transcript. Rounds cut short by a truncated input
    /// are dropped, so their challenges stay unavailable.
    pub fn from_serialized(
        bytes: &[u8],
        manifest: Manifest,
        hash_type: HashType,
        num_challenge_bytes: usize,
    ) -> Result<Self> {
        let mut transcript = Self::new(manifest.clone(), hash_type, num_challenge_bytes)?;
        let mut offset = 0usize;
        for round in manifest.rounds.iter() {
            let round_size: usize = round
                .elements
                .iter()
                .filter(|e| !e.derived_by_verifier)
                .map(|e| e.num_bytes)
                .sum();
            if offset + round_size > bytes.len() {
                break;
            }
            for entry in round.elements.iter().filter(|e| !e.derived_by_verifier) {
                transcript.add_element(&entry.name, bytes[offset..offset + entry.num_bytes].to_vec());
                offset += entry.num_bytes;
            }
            let first = round
                .challenges
                .first()
                .ok_or_else(|| PlonkError::ManifestError("round without challenge".into()))?;
            transcript.apply_fiat_shamir(first)?;
        }
        if offset != bytes.len() && transcript.current_round == manifest.rounds.len() {
            return Err(PlonkError::ManifestError(format!(
                "{} trailing bytes",
                bytes.len() - offset
            )));
        }
        Ok(transcript)
    }

    /// Serialize the prover messages of the completed rounds.
    pub fn export(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.manifest.size());
        for round in self.manifest.rounds.iter().take(self.current_round) {
            for entry in round.elements.iter().filter(|e| !e.derived_by_verifier) {
                if let Some(bytes) = self.elements.get(&entry.name) {
                    out.extend_from_slice(bytes);
                }
            }
        }
        out
    }

    fn truncate_to_field(&self, digest: &[u8]) -> Result<G::ScalarType> {
        Ok(G::ScalarType::from_bytes(&digest[..self.num_challenge_bytes])?)
    }
}

impl<G: Group> Transcript for StandardTranscript<G> {
    type Field = G::ScalarType;
    type Commitment = G;

    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    fn num_challenge_bytes(&self) -> usize {
        self.num_challenge_bytes
    }

    fn get_challenge_field_element(&self, label: &str) -> Result<Self::Field> {
        self.challenges
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingChallenge(label.into()))
    }

    fn get_challenge_field_element_from_map(
        &self,
        challenge: &str,
        label: &str,
    ) -> Result<Self::Field> {
        let digest = self
            .map_digests
            .get(challenge)
            .ok_or_else(|| PlonkError::MissingChallenge(format!("{}[{}]", challenge, label)))?;
        let mut input = digest.clone();
        input.extend_from_slice(label.as_bytes());
        self.truncate_to_field(&self.hash_type.hash(&input))
    }

    fn get_field_element(&self, label: &str) -> Result<Self::Field> {
        let bytes = self
            .elements
            .get(label)
            .ok_or_else(|| PlonkError::MissingEvaluation(label.into()))?;
        if bytes.len() != Self::Field::bytes_len() {
            return Err(PlonkError::MissingEvaluation(label.into()));
        }
        Ok(Self::Field::from_bytes(bytes)?)
    }

    fn get_field_element_vector(&self, label: &str) -> Result<Vec<Self::Field>> {
        let bytes = self
            .elements
            .get(label)
            .ok_or_else(|| PlonkError::MissingEvaluation(label.into()))?;
        let len = Self::Field::bytes_len();
        if bytes.len() % len != 0 {
            return Err(PlonkError::MissingEvaluation(label.into()));
        }
        bytes
            .chunks(len)
            .map(|c| Self::Field::from_bytes(c).map_err(PlonkError::from))
            .collect()
    }

    fn get_commitment(&self, label: &str) -> Result<Self::Commitment> {
        let bytes = self
            .elements
            .get(label)
            .ok_or_else(|| PlonkError::MissingCommitment(label.into()))?;
        Ok(G::from_compressed_bytes(bytes)?)
    }
}
