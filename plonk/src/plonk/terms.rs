use crate::errors::{PlonkError, Result};
use crate::plonk::{transcript::Transcript, verification_key::VerificationKey};
use ark_std::{collections::BTreeMap, string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// Commitment label to scalar coefficient, the input of the final
/// multi-scalar multiplication. Coefficients for the same label add up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScalarMultiplicationTerms<F> {
    terms: BTreeMap<String, F>,
}

impl<F: Scalar> ScalarMultiplicationTerms<F> {
    /// Create an empty set of terms.
    pub fn new() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    /// Add `coefficient` to `label`.
    pub fn add_term(&mut self, label: &str, coefficient: F) {
        match self.terms.get_mut(label) {
            Some(c) => c.add_assign(&coefficient),
            None => {
                self.terms.insert(label.into(), coefficient);
            }
        }
    }

    /// Add `coefficient` to a label the verification key must hold.
    pub fn add_key_term<G: Group<ScalarType = F>>(
        &mut self,
        key: &VerificationKey<G>,
        label: &str,
        coefficient: F,
    ) -> Result<()> {
        key.get_commitment(label)?;
        self.add_term(label, coefficient);
        Ok(())
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&mut self, factor: &F) {
        for c in self.terms.values_mut() {
            c.mul_assign(factor);
        }
    }

    /// Merge `other` additively.
    pub fn merge(&mut self, other: ScalarMultiplicationTerms<F>) {
        for (label, c) in other.terms {
            self.add_term(&label, c);
        }
    }

    /// Return the coefficient of `label`.
    pub fn get(&self, label: &str) -> Option<&F> {
        self.terms.get(label)
    }

    /// Return the labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.terms.keys().map(String::as_str).collect()
    }

    /// Iterate over the terms in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &F)> {
        self.terms.iter().map(|(l, c)| (l.as_str(), c))
    }

    /// Return the number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Return true when there is no term.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look every label up, first in the verification key and then among the
    /// prover commitments.
    pub fn resolve<T: Transcript<Field = F>>(
        &self,
        key: &VerificationKey<T::Commitment>,
        transcript: &T,
    ) -> Result<(Vec<F>, Vec<T::Commitment>)> {
        let mut scalars = Vec::with_capacity(self.terms.len());
        let mut points = Vec::with_capacity(self.terms.len());
        for (label, c) in self.terms.iter() {
            let point = match key.get_commitment(label) {
                Ok(p) => p,
                Err(PlonkError::MissingCommitment(_)) => transcript.get_commitment(label)?,
                Err(e) => return Err(e),
            };
            scalars.push(*c);
            points.push(point);
        }
        Ok((scalars, points))
    }

    /// Compute the aggregate commitment.
    pub fn multi_exp<T: Transcript<Field = F>>(
        &self,
        key: &VerificationKey<T::Commitment>,
        transcript: &T,
    ) -> Result<T::Commitment> {
        let (scalars, points) = self.resolve(key, transcript)?;
        let scalars_ref: Vec<&F> = scalars.iter().collect();
        let points_ref: Vec<&T::Commitment> = points.iter().collect();
        Ok(T::Commitment::multi_exp(&scalars_ref, &points_ref)?)
    }
}
