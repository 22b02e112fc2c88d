use crate::errors::{PlonkError, Result};
use ark_std::{collections::BTreeMap, string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// The preprocessed data a verifier needs for one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "G: Group")]
pub struct VerificationKey<G: Group> {
    /// The size of the evaluation domain, a power of two.
    pub circuit_size: usize,
    /// The number of public inputs.
    pub num_public_inputs: usize,
    /// The number of wires per gate.
    pub program_width: usize,
    /// Whether the circuit verifies another proof.
    pub is_recursive_circuit: bool,
    /// A primitive `circuit_size`-th root of unity.
    pub root: G::ScalarType,
    /// The inverse of `root`.
    pub root_inverse: G::ScalarType,
    /// `program_width + 1` coset generators; `[0] = 1` and the last one
    /// separates the public inputs.
    pub coset_generators: Vec<G::ScalarType>,
    /// Selector, permutation and identity commitments by label.
    pub commitments: BTreeMap<String, G>,
}

impl<G: Group> VerificationKey<G> {
    /// Create a key for a domain of `circuit_size` with the default coset
    /// generators.
    pub fn new(
        circuit_size: usize,
        num_public_inputs: usize,
        program_width: usize,
        commitments: BTreeMap<String, G>,
    ) -> Result<Self> {
        let root = G::ScalarType::get_root_of_unity(circuit_size)?;
        let root_inverse = root.inv()?;
        Ok(Self {
            circuit_size,
            num_public_inputs,
            program_width,
            is_recursive_circuit: false,
            root,
            root_inverse,
            coset_generators: default_coset_generators(program_width),
            commitments,
        })
    }

    /// Return the commitment with this label.
    pub fn get_commitment(&self, label: &str) -> Result<G> {
        self.commitments
            .get(label)
            .copied()
            .ok_or_else(|| PlonkError::MissingCommitment(label.into()))
    }

    /// Return the domain size.
    pub fn domain_size(&self) -> usize {
        self.circuit_size
    }

    /// Return whether the circuit is recursive.
    pub fn is_recursive_circuit(&self) -> bool {
        self.is_recursive_circuit
    }

    /// Return the coset generator of wire `index`, counting from zero.
    pub fn coset_generator(&self, index: usize) -> Result<G::ScalarType> {
        self.coset_generators.get(index).copied().ok_or_else(|| {
            PlonkError::ProgramWidthMismatch {
                expected: index + 1,
                found: self.coset_generators.len(),
            }
        })
    }

    /// Return the generator of the public input coset.
    pub fn external_coset_generator(&self) -> Result<G::ScalarType> {
        self.coset_generator(self.program_width)
    }

    /// Check the metadata for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.circuit_size.is_power_of_two() || self.circuit_size < 4 {
            return Err(PlonkError::Algebra(AlgebraError::DomainSizeError));
        }
        if self.root.pow(&[self.circuit_size as u64]) != G::ScalarType::one()
            || self.root.mul(&self.root_inverse) != G::ScalarType::one()
        {
            return Err(PlonkError::Algebra(AlgebraError::ParameterError));
        }
        if self.coset_generators.len() != self.program_width + 1 {
            return Err(PlonkError::ProgramWidthMismatch {
                expected: self.program_width + 1,
                found: self.coset_generators.len(),
            });
        }
        Ok(())
    }
}

/// Return `g^0, g^1, ..., g^width` for the multiplicative generator `g`. Small
/// powers of a generator of the full group lie in distinct cosets of any
/// evaluation domain.
pub fn default_coset_generators<F: Scalar>(program_width: usize) -> Vec<F> {
    let g = F::multiplicative_generator();
    let mut current = F::one();
    let mut out = Vec::with_capacity(program_width + 1);
    for _ in 0..=program_width {
        out.push(current);
        current.mul_assign(&g);
    }
    out
}
