//! Decimal encoding of field elements.
//!
//! Circuit inputs and contract calls exchange field values as base-10 strings.
//! This is the only place the conversion happens.

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use thiserror::Error;

use crate::FieldElement;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("not a decimal integer: {0:?}")]
    NotDecimal(String),
    #[error("value {0} is not below the field modulus")]
    OutOfRange(String),
}

/// Render any prime-field element as its canonical decimal integer.
pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    let n: BigUint = BigUint::from_bytes_le(&value.into_bigint().to_bytes_le());
    n.to_str_radix(10)
}

/// Parse a canonical decimal integer into a field element.
///
/// Values at or above the modulus are rejected rather than reduced, so that a
/// round trip through a string never silently changes a value.
pub fn field_from_decimal(s: &str) -> Result<FieldElement, CodecError> {
    let n = BigUint::parse_bytes(s.trim().as_bytes(), 10)
        .ok_or_else(|| CodecError::NotDecimal(s.to_string()))?;
    let modulus = BigUint::from_bytes_le(&FieldElement::MODULUS.to_bytes_le());
    if n >= modulus {
        return Err(CodecError::OutOfRange(s.to_string()));
    }
    Ok(FieldElement::from_be_bytes_mod_order(&n.to_bytes_be()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert_eq!(field_to_decimal(&FieldElement::from(0u64)), "0");
        assert_eq!(field_to_decimal(&FieldElement::from(1000u64)), "1000");
        assert_eq!(field_from_decimal("1000"), Ok(FieldElement::from(1000u64)));
    }

    #[test]
    fn test_negative_one_is_modulus_minus_one() {
        let minus_one = -FieldElement::from(1u64);
        assert_eq!(
            field_to_decimal(&minus_one),
            "21888242871839275222246405745257275088548364400416034343698204186575808495616"
        );
    }

    #[test]
    fn test_rejects_garbage_and_modulus() {
        assert!(matches!(
            field_from_decimal("12a"),
            Err(CodecError::NotDecimal(_))
        ));
        assert!(matches!(
            field_from_decimal(
                "21888242871839275222246405745257275088548364400416034343698204186575808495617"
            ),
            Err(CodecError::OutOfRange(_))
        ));
    }
}
