//! Crypto Context
//!
//! The capability traits the state engine consumes, and the context value that
//! carries one implementation of each. A context is built once at startup and
//! shared by reference; nothing in it is mutable after construction.

use std::fmt;
use std::sync::Arc;

use crate::FieldElement;
use crate::eddsa::{EddsaMimc, PublicKey, SecretKey, Signature};
use crate::mimc::{MIMC_ROUNDS, MIMC_SEED, Mimc7};
use crate::pedersen::{Commitment, PEDERSEN_SEED, Pedersen};

/// SNARK-friendly multi-input hash.
pub trait FieldHasher: Send + Sync {
    fn multi_hash(&self, inputs: &[FieldElement]) -> FieldElement;

    /// Hash two children into their parent node.
    fn hash_pair(&self, left: FieldElement, right: FieldElement) -> FieldElement {
        self.multi_hash(&[left, right])
    }
}

/// Signature scheme over field-element messages.
pub trait SignatureScheme: Send + Sync {
    fn derive_public_key(&self, sk: &SecretKey) -> PublicKey;
    fn sign(&self, sk: &SecretKey, msg: FieldElement) -> Signature;
    fn verify(&self, pk: &PublicKey, msg: FieldElement, sig: &Signature) -> bool;
}

/// Additively homomorphic commitment scheme.
pub trait CommitmentScheme: Send + Sync {
    fn commit(&self, value: u128, blinding: &[u8; 32]) -> Commitment;
    fn add(&self, a: &Commitment, b: &Commitment) -> Commitment;
    fn sub(&self, a: &Commitment, b: &Commitment) -> Commitment;
}

/// Hash, signature and commitment capabilities shared by every component.
#[derive(Clone)]
pub struct CryptoContext {
    hasher: Arc<dyn FieldHasher>,
    signer: Arc<dyn SignatureScheme>,
    commitments: Arc<dyn CommitmentScheme>,
}

impl CryptoContext {
    /// MiMC7, EdDSA-MiMC and Pedersen with their default parameters.
    pub fn new() -> Self {
        Self::with_params(MIMC_SEED, MIMC_ROUNDS, PEDERSEN_SEED)
    }

    pub fn with_params(mimc_seed: &str, mimc_rounds: usize, pedersen_seed: &str) -> Self {
        let mimc = Mimc7::with_params(mimc_seed, mimc_rounds);
        log::debug!(
            "building crypto context: mimc seed {:?}, {} rounds",
            mimc_seed,
            mimc_rounds
        );
        Self {
            hasher: Arc::new(mimc.clone()),
            signer: Arc::new(EddsaMimc::new(mimc)),
            commitments: Arc::new(Pedersen::with_seed(pedersen_seed)),
        }
    }

    /// Assemble a context from externally supplied primitives.
    pub fn from_parts(
        hasher: Arc<dyn FieldHasher>,
        signer: Arc<dyn SignatureScheme>,
        commitments: Arc<dyn CommitmentScheme>,
    ) -> Self {
        Self {
            hasher,
            signer,
            commitments,
        }
    }

    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }

    pub fn signer(&self) -> &dyn SignatureScheme {
        self.signer.as_ref()
    }

    pub fn commitments(&self) -> &dyn CommitmentScheme {
        self.commitments.as_ref()
    }

    pub fn multi_hash(&self, inputs: &[FieldElement]) -> FieldElement {
        self.hasher.multi_hash(inputs)
    }
}

impl Default for CryptoContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoContext").finish_non_exhaustive()
    }
}
