//! zkzru cryptographic primitives
//!
//! Everything the state engine hashes, signs or commits to lives in the BN254
//! scalar field. The engine itself only talks to the capability traits in
//! [`context`]; the concrete schemes here are the defaults a [`CryptoContext`]
//! is built with.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CryptoContext                        │
//! │  ┌────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │   MiMC7    │  │ EdDSA-MiMC (BJJ) │  │   Pedersen   │  │
//! │  │ FieldHasher│  │ SignatureScheme  │  │ Commitment.. │  │
//! │  └────────────┘  └──────────────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod context;
pub mod eddsa;
pub mod mimc;
pub mod pedersen;

pub use codec::{CodecError, field_from_decimal, field_to_decimal};
pub use context::{CommitmentScheme, CryptoContext, FieldHasher, SignatureScheme};
pub use eddsa::{EddsaMimc, PublicKey, SecretKey, Signature};
pub use mimc::Mimc7;
pub use pedersen::{Commitment, Pedersen};

/// Element of the BN254 scalar field. Every tree node, hash, public key
/// coordinate and commitment coordinate is one of these.
pub type FieldElement = ark_bn254::Fr;

/// Scalar field of the Baby Jubjub curve (secret keys, signature `S`, blindings).
pub type CurveScalar = ark_ed_on_bn254::Fr;
