//! EdDSA-MiMC over Baby Jubjub
//!
//! Baby Jubjub is the twisted Edwards curve whose base field is the BN254
//! scalar field, so public keys and the `R8` point are pairs of
//! [`FieldElement`]s that a circuit can consume directly.
//!
//! ```text
//! A  = s·G
//! R8 = r·G                      r = SHA-512(prefix || msg) mod l
//! h  = MiMC7(R8x, R8y, Ax, Ay, msg) mod l
//! S  = r + h·s mod l
//! verify: S·G == R8 + h·A
//! ```

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::EdwardsAffine;
use ark_ff::{BigInteger, PrimeField, Zero};
use sha2::{Digest, Sha512};

use crate::context::{FieldHasher, SignatureScheme};
use crate::mimc::Mimc7;
use crate::{CurveScalar, FieldElement};

/// A 32-byte EdDSA secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(pub [u8; 32]);

impl SecretKey {
    /// Deterministic key from a small integer, right-aligned in 32 bytes.
    /// Used for operator and fixture keys.
    pub fn from_index(i: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&i.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A Baby Jubjub public key. `(0, 0)` is not a curve point and is used as
/// the "no owner" key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PublicKey {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl PublicKey {
    pub const fn new(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// The all-zero key
    pub fn zero() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }
}

/// An EdDSA signature `(R8, S)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signature {
    pub r8x: FieldElement,
    pub r8y: FieldElement,
    pub s: CurveScalar,
}

/// EdDSA with MiMC7 as the challenge hash.
#[derive(Debug, Clone, Default)]
pub struct EddsaMimc {
    mimc: Mimc7,
}

impl EddsaMimc {
    pub fn new(mimc: Mimc7) -> Self {
        Self { mimc }
    }

    /// Split the SHA-512 expansion of a secret key into the signing scalar
    /// and the nonce prefix.
    fn expand(sk: &SecretKey) -> (CurveScalar, [u8; 32]) {
        let digest = Sha512::digest(sk.0);
        let scalar = CurveScalar::from_le_bytes_mod_order(&digest[..32]);
        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&digest[32..]);
        (scalar, prefix)
    }

    fn challenge(&self, r8: &EdwardsAffine, a: &EdwardsAffine, msg: FieldElement) -> CurveScalar {
        let h = self.mimc.multi_hash(&[r8.x, r8.y, a.x, a.y, msg]);
        CurveScalar::from_le_bytes_mod_order(&h.into_bigint().to_bytes_le())
    }

    /// On the curve, in the prime-order subgroup, and not the identity `(0, 1)`.
    fn is_valid_point(p: &EdwardsAffine) -> bool {
        p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve() && !p.x.is_zero()
    }
}

impl SignatureScheme for EddsaMimc {
    fn derive_public_key(&self, sk: &SecretKey) -> PublicKey {
        let (s, _) = Self::expand(sk);
        let a = (EdwardsAffine::generator() * s).into_affine();
        PublicKey::new(a.x, a.y)
    }

    fn sign(&self, sk: &SecretKey, msg: FieldElement) -> Signature {
        let (s, prefix) = Self::expand(sk);
        let a = (EdwardsAffine::generator() * s).into_affine();

        let mut hasher = Sha512::new();
        hasher.update(prefix);
        hasher.update(msg.into_bigint().to_bytes_le());
        let r = CurveScalar::from_le_bytes_mod_order(&hasher.finalize());
        let r8 = (EdwardsAffine::generator() * r).into_affine();

        let h = self.challenge(&r8, &a, msg);
        Signature {
            r8x: r8.x,
            r8y: r8.y,
            s: r + h * s,
        }
    }

    fn verify(&self, pk: &PublicKey, msg: FieldElement, sig: &Signature) -> bool {
        let a = EdwardsAffine::new_unchecked(pk.x, pk.y);
        let r8 = EdwardsAffine::new_unchecked(sig.r8x, sig.r8y);
        if !Self::is_valid_point(&a) || !Self::is_valid_point(&r8) {
            return false;
        }

        let h = self.challenge(&r8, &a, msg);
        EdwardsAffine::generator() * sig.s == r8.into_group() + a * h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let eddsa = EddsaMimc::default();
        let sk = SecretKey::from_index(2);
        let pk = eddsa.derive_public_key(&sk);
        let msg = FieldElement::from(1234u64);

        let sig = eddsa.sign(&sk, msg);
        assert!(eddsa.verify(&pk, msg, &sig));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let eddsa = EddsaMimc::default();
        let sk = SecretKey::from_index(7);
        let msg = FieldElement::from(99u64);
        assert_eq!(eddsa.sign(&sk, msg), eddsa.sign(&sk, msg));
    }

    #[test]
    fn test_wrong_message_rejected() {
        let eddsa = EddsaMimc::default();
        let sk = SecretKey::from_index(3);
        let pk = eddsa.derive_public_key(&sk);

        let sig = eddsa.sign(&sk, FieldElement::from(1u64));
        assert!(!eddsa.verify(&pk, FieldElement::from(2u64), &sig));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let eddsa = EddsaMimc::default();
        let msg = FieldElement::from(42u64);
        let sig = eddsa.sign(&SecretKey::from_index(4), msg);
        let other = eddsa.derive_public_key(&SecretKey::from_index(5));

        assert!(!eddsa.verify(&other, msg, &sig));
    }

    #[test]
    fn test_zero_key_never_verifies() {
        let eddsa = EddsaMimc::default();
        let msg = FieldElement::from(42u64);
        let sig = eddsa.sign(&SecretKey::from_index(4), msg);

        assert!(!eddsa.verify(&PublicKey::zero(), msg, &sig));
    }

    #[test]
    fn test_distinct_keys() {
        let eddsa = EddsaMimc::default();
        let a = eddsa.derive_public_key(&SecretKey::from_index(1));
        let b = eddsa.derive_public_key(&SecretKey::from_index(2));
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }
}
