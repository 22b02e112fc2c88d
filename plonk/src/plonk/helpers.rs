use crate::errors::{PlonkError, Result};
use waffle_algebra::prelude::*;

/// Return `z^n - 1`.
pub(crate) fn vanishing_eval<F: Scalar>(z: &F, n: usize) -> F {
    z.pow(&[n as u64]).sub(&F::one())
}

/// Invert, mapping zero to `DivisionByZero`.
pub(crate) fn invert<F: Scalar>(x: &F) -> Result<F> {
    if x.is_zero() {
        return Err(PlonkError::DivisionByZero);
    }
    Ok(x.inv()?)
}

/// Return `L_0(z) = (z^n - 1) / (n (z - 1))`.
pub(crate) fn first_lagrange_eval<F: Scalar>(z: &F, n: usize) -> Result<F> {
    let denominator = F::from(n as u64).mul(&z.sub(&F::one()));
    Ok(vanishing_eval(z, n).mul(&invert(&denominator)?))
}

/// Return `L_{n-2}(z) = (z^n - 1) / (n (z omega^2 - 1))`, the last row the
/// shifted grand product is read on.
pub(crate) fn penultimate_lagrange_eval<F: Scalar>(z: &F, n: usize, root: &F) -> Result<F> {
    let denominator = F::from(n as u64).mul(&z.mul(&root.square()).sub(&F::one()));
    Ok(vanishing_eval(z, n).mul(&invert(&denominator)?))
}

/// Fold the public inputs into the grand product:
/// `prod_i (x_i + beta omega^i + gamma) / (x_i + beta k omega^i + gamma)` for
/// the external coset generator `k`.
pub(crate) fn public_input_delta<F: Scalar>(
    public_inputs: &[F],
    beta: &F,
    gamma: &F,
    root: &F,
    external_coset_generator: &F,
) -> Result<F> {
    let mut numerator = F::one();
    let mut denominator = F::one();
    let mut work_root = F::one();
    for x in public_inputs {
        let t = x.add(gamma);
        let shift = beta.mul(&work_root);
        numerator.mul_assign(&t.add(&shift));
        denominator.mul_assign(&t.add(&shift.mul(external_coset_generator)));
        work_root.mul_assign(root);
    }
    Ok(numerator.mul(&invert(&denominator)?))
}

/// Return `f (f - 1) (f - 2) (f - 3)`, zero exactly on base-4 digits.
pub(crate) fn quad_range<F: Scalar>(f: &F) -> F {
    let f_1 = f.sub(&F::one());
    let f_2 = f.sub(&F::from(2u32));
    let f_3 = f.sub(&F::from(3u32));
    f.mul(&f_1).mul(&f_2).mul(&f_3)
}

/// Return `[1, x, x^2, ..]` with `count` entries.
pub(crate) fn powers<F: Scalar>(x: &F, count: usize) -> Vec<F> {
    let mut out = Vec::with_capacity(count);
    let mut current = F::one();
    for _ in 0..count {
        out.push(current);
        current.mul_assign(x);
    }
    out
}

/// Return `sum_j s^j c_j`.
pub(crate) fn separate<F: Scalar>(separation: &F, sub_identities: &[F]) -> F {
    powers(separation, sub_identities.len())
        .iter()
        .zip(sub_identities.iter())
        .map(|(p, c)| p.mul(c))
        .sum()
}
