//! Pedersen Commitments
//!
//! Balance and amount hiding for confidential accounts.
//!
//! ```text
//! Commitment = r·G + v·H
//! ```
//!
//! `G` is the Baby Jubjub prime-order generator and `H` is hashed onto the
//! curve from a fixed seed, so nobody knows `log_G(H)`. Commitments add:
//! `commit(a, r1) + commit(b, r2) = commit(a + b, r1 + r2)`.

use ark_ec::twisted_edwards::TECurveConfig;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsConfig};
use ark_ff::{Field, One, PrimeField, Zero};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::context::CommitmentScheme;
use crate::{CurveScalar, FieldElement};

/// Seed `H` is derived from
pub const PEDERSEN_SEED: &str = "zkzru_pedersen_h";

/// A commitment point in affine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl Commitment {
    pub const fn new(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// Commitment to zero with zero blinding (the curve identity).
    pub fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
        }
    }

    fn to_point(self) -> EdwardsAffine {
        EdwardsAffine::new_unchecked(self.x, self.y)
    }

    fn from_point(p: EdwardsAffine) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Pedersen commitment scheme on Baby Jubjub
#[derive(Debug, Clone)]
pub struct Pedersen {
    h: EdwardsAffine,
}

impl Default for Pedersen {
    fn default() -> Self {
        Self::new()
    }
}

impl Pedersen {
    pub fn new() -> Self {
        Self::with_seed(PEDERSEN_SEED)
    }

    pub fn with_seed(seed: &str) -> Self {
        Self {
            h: hash_to_curve(seed.as_bytes()),
        }
    }

    /// The second generator `H`.
    pub fn h(&self) -> Commitment {
        Commitment::from_point(self.h)
    }

    /// Generate random blinding factor
    pub fn random_blinding<R: RngCore>(rng: &mut R) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes
    }
}

impl CommitmentScheme for Pedersen {
    fn commit(&self, value: u128, blinding: &[u8; 32]) -> Commitment {
        let r = CurveScalar::from_le_bytes_mod_order(blinding);
        let v = CurveScalar::from(value);
        let point = EdwardsAffine::generator() * r + self.h * v;
        Commitment::from_point(point.into_affine())
    }

    fn add(&self, a: &Commitment, b: &Commitment) -> Commitment {
        let sum = a.to_point().into_group() + b.to_point().into_group();
        Commitment::from_point(sum.into_affine())
    }

    fn sub(&self, a: &Commitment, b: &Commitment) -> Commitment {
        let diff = a.to_point().into_group() - b.to_point().into_group();
        Commitment::from_point(diff.into_affine())
    }
}

/// Try-and-increment: hash `seed || counter` to a y-coordinate until the
/// curve equation has a solution for x, then clear the cofactor.
fn hash_to_curve(seed: &[u8]) -> EdwardsAffine {
    let mut counter = 0u32;
    loop {
        let digest = Sha256::new()
            .chain_update(seed)
            .chain_update(counter.to_le_bytes())
            .finalize();
        let y = FieldElement::from_le_bytes_mod_order(&digest);

        if let Some(point) = point_from_y(y) {
            // Baby Jubjub cofactor is 8
            let cleared = (point * CurveScalar::from(8u64)).into_affine();
            if !cleared.x.is_zero() {
                return cleared;
            }
        }
        counter += 1;
    }
}

/// Solve `a·x² + y² = 1 + d·x²·y²` for x.
fn point_from_y(y: FieldElement) -> Option<EdwardsAffine> {
    let y2 = y.square();
    let denominator = EdwardsConfig::COEFF_A - EdwardsConfig::COEFF_D * y2;
    let x2 = (FieldElement::one() - y2) * denominator.inverse()?;
    let x = x2.sqrt()?;
    Some(EdwardsAffine::new_unchecked(x, y))
}
