//! # Field-Element Decimal Codec
//!
//! Proof systems in the circom/snarkjs lineage exchange field elements as
//! decimal strings. This module defines [`FieldElement`], the canonical
//! decimal encoding of a 256-bit value, and the conversions the rest of
//! the workspace uses: digest bytes to decimal, `u64` to decimal, and the
//! bounded reverse parse.
//!
//! ## Security Invariant
//!
//! Every field element in the system is in canonical form: ASCII digits
//! only, no leading zeros, value below 2^256. Non-canonical encodings of
//! the same value ("007" vs "7") would otherwise let the same commitment
//! register twice under different keys. Validation happens at every
//! construction boundary, including serde deserialization.

use serde::{Deserialize, Serialize};

use ccl_core::error::EncodingError;

/// Decimal rendering of 2^256 - 1, the largest encodable value (78 digits).
const MAX_256_DECIMAL: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// A 256-bit value in its canonical decimal-string encoding.
///
/// This is the wire representation of commitments, nullifiers, group-element
/// coordinates, and numeric public signals. The inner string is guaranteed
/// canonical by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldElement(String);

impl FieldElement {
    /// Parse and validate a decimal-string field element.
    ///
    /// # Errors
    ///
    /// Rejects empty strings, non-digit characters, leading zeros, and
    /// values of 2^256 or above.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        if s.is_empty() {
            return Err(EncodingError::MalformedFieldElement(
                "empty string".to_string(),
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EncodingError::MalformedFieldElement(format!(
                "non-digit character in {s:?}"
            )));
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(EncodingError::MalformedFieldElement(format!(
                "leading zero in {s:?}"
            )));
        }
        if s.len() > MAX_256_DECIMAL.len()
            || (s.len() == MAX_256_DECIMAL.len() && s > MAX_256_DECIMAL)
        {
            return Err(EncodingError::MalformedFieldElement(format!(
                "value exceeds 2^256 - 1: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Encode a 32-byte big-endian value (e.g., a SHA-256 digest) as a
    /// decimal field element.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        // Base-256 to base-10: digits held least-significant first.
        let mut digits: Vec<u8> = vec![0];
        for &byte in bytes.iter() {
            let mut carry = byte as u32;
            for d in digits.iter_mut() {
                let v = (*d as u32) * 256 + carry;
                *d = (v % 10) as u8;
                carry = v / 10;
            }
            while carry > 0 {
                digits.push((carry % 10) as u8);
                carry /= 10;
            }
        }
        let s: String = digits
            .iter()
            .rev()
            .map(|d| char::from(b'0' + d))
            .collect();
        Self(s)
    }

    /// Encode a `u64` as a decimal field element.
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_string())
    }

    /// Interpret the element as a `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }

    /// The canonical decimal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

impl TryFrom<String> for FieldElement {
    type Error = EncodingError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<FieldElement> for String {
    fn from(fe: FieldElement) -> String {
        fe.0
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_and_one() {
        assert_eq!(FieldElement::from_bytes(&[0u8; 32]).as_str(), "0");
        let mut one = [0u8; 32];
        one[31] = 1;
        assert_eq!(FieldElement::from_bytes(&one).as_str(), "1");
    }

    #[test]
    fn test_max_value() {
        let fe = FieldElement::from_bytes(&[0xff; 32]);
        assert_eq!(fe.as_str(), MAX_256_DECIMAL);
        assert!(FieldElement::parse(MAX_256_DECIMAL).is_ok());
    }

    #[test]
    fn test_value_above_max_rejected() {
        // MAX_256_DECIMAL + 1
        let above =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(FieldElement::parse(above).is_err());
        assert!(FieldElement::parse(&"9".repeat(79)).is_err());
    }

    #[test]
    fn test_known_digest_conversion() {
        // sha256(0x00 || [0u8; 32]) — decimal verified against Python:
        // int.from_bytes(bytes.fromhex("7f9c9e31...96ce9"), "big")
        let mut digest = [0u8; 32];
        let hex = "7f9c9e31ac8256ca2f258583df262dbc7d6f68f2a03043d5c99a4ae5a7396ce9";
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            digest[i] = u8::from_str_radix(std::str::from_utf8(chunk).unwrap(), 16).unwrap();
        }
        assert_eq!(
            FieldElement::from_bytes(&digest).as_str(),
            "57720451727307771409194090010672608749434683491374644621838586419544373947625"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(FieldElement::parse("").is_err());
        assert!(FieldElement::parse("12a4").is_err());
        assert!(FieldElement::parse("007").is_err());
        assert!(FieldElement::parse("-1").is_err());
        assert!(FieldElement::parse(" 12").is_err());
    }

    #[test]
    fn test_parse_accepts_zero() {
        assert!(FieldElement::parse("0").unwrap().is_zero());
    }

    #[test]
    fn test_u64_roundtrip() {
        let fe = FieldElement::from_u64(1_000);
        assert_eq!(fe.as_str(), "1000");
        assert_eq!(fe.as_u64(), Some(1_000));
    }

    #[test]
    fn test_as_u64_rejects_oversized() {
        let fe = FieldElement::from_bytes(&[0xff; 32]);
        assert_eq!(fe.as_u64(), None);
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: FieldElement = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(ok.as_str(), "42");
        let bad: Result<FieldElement, _> = serde_json::from_str("\"007\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_u64_roundtrip(v: u64) {
            let fe = FieldElement::from_u64(v);
            prop_assert_eq!(fe.as_u64(), Some(v));
            prop_assert!(FieldElement::parse(fe.as_str()).is_ok());
        }

        #[test]
        fn prop_from_bytes_is_canonical(bytes: [u8; 32]) {
            let fe = FieldElement::from_bytes(&bytes);
            let reparsed = FieldElement::parse(fe.as_str()).unwrap();
            prop_assert_eq!(reparsed, fe);
        }

        #[test]
        fn prop_from_bytes_agrees_with_u64_embedding(a: u64, b: u64) {
            let mut ba = [0u8; 32];
            ba[24..].copy_from_slice(&a.to_be_bytes());
            let mut bb = [0u8; 32];
            bb[24..].copy_from_slice(&b.to_be_bytes());
            let fa = FieldElement::from_bytes(&ba);
            let fb = FieldElement::from_bytes(&bb);
            prop_assert_eq!(fa.as_u64(), Some(a));
            prop_assert_eq!(fb.as_u64(), Some(b));
            prop_assert_eq!(a == b, fa == fb);
        }
    }
}
