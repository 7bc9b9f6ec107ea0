//! MiMC7 Hash
//!
//! The MiMC variant used by circomlib and by the rollup contract's
//! `MiMCMerkle` helper, so that tree roots computed here match what the
//! circuit and the contract recompute.
//!
//! - BN254 scalar field
//! - x^7 round function
//! - 91 rounds, `c_0 = 0`, `c_i = keccak256^i(seed)` read big-endian
//! - multi-input hashing via the Miyaguchi-Preneel style chain
//!   `r = r + x + E_r(x)`

use ark_ff::{Field, PrimeField, Zero};
use sha3::{Digest, Keccak256};

use crate::FieldElement;
use crate::context::FieldHasher;

/// Number of MiMC rounds (matches circuit)
pub const MIMC_ROUNDS: usize = 91;

/// Seed the round constants are derived from
pub const MIMC_SEED: &str = "mimc";

/// MiMC7 hasher with precomputed round constants
#[derive(Debug, Clone)]
pub struct Mimc7 {
    round_constants: Vec<FieldElement>,
}

impl Default for Mimc7 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mimc7 {
    pub fn new() -> Self {
        Self::with_params(MIMC_SEED, MIMC_ROUNDS)
    }

    /// Build a hasher for a non-default seed or round count.
    pub fn with_params(seed: &str, rounds: usize) -> Self {
        let mut round_constants = Vec::with_capacity(rounds);
        round_constants.push(FieldElement::zero());

        let mut c: [u8; 32] = Keccak256::digest(seed.as_bytes()).into();
        for _ in 1..rounds {
            c = Keccak256::digest(c).into();
            round_constants.push(FieldElement::from_be_bytes_mod_order(&c));
        }

        Self { round_constants }
    }

    pub fn rounds(&self) -> usize {
        self.round_constants.len()
    }

    /// MiMC round function: (x + k + c)^7
    fn round(x: FieldElement, k: FieldElement, c: FieldElement) -> FieldElement {
        let t = x + k + c;
        let t2 = t.square();
        let t4 = t2.square();
        t4 * t2 * t
    }

    /// MiMC permutation: encrypts x with key k
    pub fn encrypt(&self, x: FieldElement, k: FieldElement) -> FieldElement {
        let mut state = x;
        for c in &self.round_constants {
            state = Self::round(state, k, *c);
        }
        state + k
    }

    /// Hash an arbitrary number of elements under `key`.
    pub fn multi_hash_with_key(&self, inputs: &[FieldElement], key: FieldElement) -> FieldElement {
        let mut r = key;
        for x in inputs {
            r = r + x + self.encrypt(*x, r);
        }
        r
    }
}

impl FieldHasher for Mimc7 {
    fn multi_hash(&self, inputs: &[FieldElement]) -> FieldElement {
        self.multi_hash_with_key(inputs, FieldElement::zero())
    }
}
