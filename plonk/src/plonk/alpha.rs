use crate::plonk::widgets::WidgetKind;
use waffle_algebra::prelude::*;

/// The next unused power of the `alpha` challenge.
///
/// `base` is always `alpha^index`. Widgets only ever move it forward through
/// [`AlphaPower::advance`], so two constraint families can never share a power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaPower<F> {
    alpha: F,
    base: F,
    index: usize,
}

impl<F: Scalar> AlphaPower<F> {
    /// Start from `alpha^1`, as the orchestrator does.
    pub fn from_challenge(alpha: F) -> Self {
        Self {
            alpha,
            base: alpha,
            index: 1,
        }
    }

    /// Start from `alpha^0 = 1`.
    pub fn unit(alpha: F) -> Self {
        Self {
            alpha,
            base: F::one(),
            index: 0,
        }
    }

    /// Return alpha.
    pub fn alpha(&self) -> &F {
        &self.alpha
    }

    /// Return the current power.
    pub fn base(&self) -> &F {
        &self.base
    }

    /// Return the exponent of the current power.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consume `count` powers.
    #[must_use]
    pub fn advance(&self, count: usize) -> Self {
        let mut base = self.base;
        for _ in 0..count {
            base.mul_assign(&self.alpha);
        }
        Self {
            alpha: self.alpha,
            base,
            index: self.index + count,
        }
    }
}

/// The alpha powers one widget occupied during an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaSlot {
    /// The widget.
    pub widget: WidgetKind,
    /// Exponent of its first power.
    pub first: usize,
    /// Number of consecutive powers.
    pub count: usize,
}

impl AlphaSlot {
    /// Return the exponents this slot covers.
    pub fn indices(&self) -> core::ops::Range<usize> {
        self.first..self.first + self.count
    }
}
