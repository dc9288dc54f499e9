//! Mixed-radix packing of a chunk into a single big-endian integer.
//!
//! Each character of a chunk becomes its position inside the front order of
//! the chunk's first character. The digit sequence is read as one base-N
//! number, most significant digit first, and stored as its minimal big-endian
//! byte string.
//!
//! The first digit is always 0 (the front sits at position 0 of its own
//! order), so the payload alone never determines the digit count; the record
//! length field does. [`MixedRadix::decode`] only rejects a value that needs
//! more than `length` digits. [`MixedRadix::decode_canonical`] additionally
//! demands the exact byte string the encoder produces.

use num_bigint::BigUint;

use crate::alphabet::{Alphabet, SENTINEL};
use crate::error::{Result, SjzError};
use crate::front_order::FrontOrders;

/// What to do with a decoded digit that has no symbol in the front order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitPolicy {
    /// Fail with [`SjzError::DigitOutOfRange`].
    #[default]
    Strict,
    /// Substitute [`SENTINEL`] and keep going. Used by level-3 optimized decoding.
    DegradeToSentinel,
}

/// Stateless digit packer bounded by a payload ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedRadix {
    base: u32,
    max_payload_size: usize,
}

impl MixedRadix {
    /// Packer over the process alphabet.
    pub fn new(max_payload_size: usize) -> Self {
        Self {
            base: Alphabet::get().len() as u32,
            max_payload_size,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    // ========================================================================
    // Text <-> digits
    // ========================================================================

    /// Front-order positions of every character of `chars`, keyed by `chars[0]`.
    ///
    /// Returns the front's alphabet index together with the digits.
    pub fn digits_from_chars(&self, chars: &[char]) -> Result<(u16, Vec<u32>)> {
        let alphabet = Alphabet::get();
        let orders = FrontOrders::get();

        let front = *chars.first().ok_or(SjzError::EmptyText)?;
        let front_index = alphabet.ensure_supported(front)?;
        let digits = chars
            .iter()
            .enumerate()
            .map(|(position, ch)| {
                let index = alphabet
                    .index_of(*ch)
                    .ok_or(SjzError::UnsupportedCharacterAt { ch: *ch, position })?;
                Ok(u32::from(orders.position_of(front_index, index)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((front_index, digits))
    }

    /// Map digits back through `FrontOrder(front_index)`.
    pub fn chars_from_digits(
        &self,
        front_index: u16,
        digits: &[u32],
        policy: DigitPolicy,
    ) -> Result<String> {
        let orders = FrontOrders::get();
        if orders.order(front_index).is_none() {
            return Err(SjzError::field_out_of_range(
                "front_index",
                format!("{front_index} is not below alphabet size {}", self.base),
            ));
        }

        let mut text = String::with_capacity(digits.len());
        for digit in digits {
            match orders.symbol_at(front_index, *digit) {
                Some(ch) => text.push(ch),
                None => match policy {
                    DigitPolicy::Strict => {
                        return Err(SjzError::DigitOutOfRange {
                            digit: *digit,
                            base: self.base,
                        });
                    }
                    DigitPolicy::DegradeToSentinel => text.push(SENTINEL),
                },
            }
        }
        Ok(text)
    }

    // ========================================================================
    // Digits <-> payload
    // ========================================================================

    /// Pack `digits` into the minimal big-endian byte string of their base-N value.
    ///
    /// A zero value serializes as `[0]`.
    pub fn pack(&self, digits: &[u32]) -> Result<Vec<u8>> {
        if digits.is_empty() {
            return Err(SjzError::EmptyText);
        }

        let max_bits = (self.max_payload_size as u64).saturating_mul(8);
        let mut value = BigUint::default();
        for digit in digits {
            if *digit >= self.base {
                return Err(SjzError::InvalidDigit {
                    digit: *digit,
                    base: self.base,
                });
            }
            value *= self.base;
            value += *digit;
            if value.bits() > max_bits {
                return Err(SjzError::ValueOverflow {
                    max_bytes: self.max_payload_size,
                });
            }
        }

        Ok(value.to_bytes_be())
    }

    /// Unpack exactly `expected_digits` digits from `payload`.
    pub fn unpack(&self, payload: &[u8], expected_digits: usize) -> Result<Vec<u32>> {
        if payload.is_empty() {
            return Err(SjzError::EmptyPayload);
        }
        if payload.len() > self.max_payload_size {
            return Err(SjzError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_size,
            });
        }
        if expected_digits == 0 {
            return Err(SjzError::EmptyText);
        }

        let value = BigUint::from_bytes_be(payload);
        // Least significant first; the zero value yields a single 0 digit.
        let mut digits = value.to_radix_le(self.base);
        if digits.len() > expected_digits {
            return Err(SjzError::NonZeroRemainder { expected_digits });
        }
        digits.resize(expected_digits, 0);

        Ok(digits.into_iter().rev().map(u32::from).collect())
    }

    // ========================================================================
    // Text <-> payload
    // ========================================================================

    /// Encode one chunk. Returns the front index, character count and payload.
    pub fn encode(&self, chunk: &str) -> Result<(u16, usize, Vec<u8>)> {
        let chars: Vec<char> = chunk.chars().collect();
        let (front_index, digits) = self.digits_from_chars(&chars)?;
        let payload = self.pack(&digits)?;
        Ok((front_index, digits.len(), payload))
    }

    /// Decode one chunk of `length` characters whose front is `front_index`.
    ///
    /// Leading zero bytes and a first digit other than 0 are accepted as-is.
    pub fn decode(
        &self,
        front_index: u16,
        length: usize,
        payload: &[u8],
        policy: DigitPolicy,
    ) -> Result<String> {
        let digits = self.unpack(payload, length)?;
        self.chars_from_digits(front_index, &digits, policy)
    }

    /// Strict decode that only accepts what [`Self::encode`] can produce: a
    /// minimal payload and a text that starts with its own front.
    pub fn decode_canonical(
        &self,
        front_index: u16,
        length: usize,
        payload: &[u8],
    ) -> Result<String> {
        if payload.len() > 1 && payload[0] == 0 {
            let leading_zeros = payload.iter().take_while(|b| **b == 0).count();
            return Err(SjzError::NonCanonicalPayload {
                leading_zeros: leading_zeros.min(payload.len() - 1),
            });
        }

        let text = self.decode(front_index, length, payload, DigitPolicy::Strict)?;
        let expected = Alphabet::get()
            .char_at(usize::from(front_index))
            .unwrap_or(SENTINEL);
        match text.chars().next() {
            Some(found) if found != expected => Err(SjzError::FrontMismatch { expected, found }),
            _ => Ok(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_PAYLOAD_SIZE;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn radix() -> MixedRadix {
        MixedRadix::new(MAX_PAYLOAD_SIZE)
    }

    fn alphabet_text(min: usize, max: usize) -> impl Strategy<Value = String> {
        proptest::collection::vec(0..Alphabet::get().len(), min..=max).prop_map(|indices| {
            let symbols = Alphabet::get().symbols();
            indices.into_iter().map(|i| symbols[i]).collect()
        })
    }

    #[test]
    fn test_apple() {
        let radix = radix();
        let (front_index, length, payload) = radix.encode("Apple").unwrap();
        assert_eq!(front_index, 34);
        assert_eq!(length, 5);

        let orders = FrontOrders::get();
        let n = 250u64;
        let expected = ['A', 'p', 'p', 'l', 'e']
            .iter()
            .map(|ch| u64::from(orders.front_position('A', *ch).unwrap()))
            .fold(0u64, |value, digit| value * n + digit);
        assert_eq!(payload, BigUint::from(expected).to_bytes_be());

        let text = radix
            .decode(front_index, length, &payload, DigitPolicy::Strict)
            .unwrap();
        assert_eq!(text, "Apple");
    }

    #[test]
    fn test_zero_value_is_one_byte() {
        let radix = radix();
        let (_, length, payload) = radix.encode("aaaa").unwrap();
        assert_eq!(payload, vec![0]);
        assert_eq!(length, 4);
        assert_eq!(
            radix.decode(radix_index('a'), 4, &payload, DigitPolicy::Strict).unwrap(),
            "aaaa"
        );
    }

    fn radix_index(ch: char) -> u16 {
        Alphabet::get().index_of(ch).unwrap()
    }

    #[test]
    fn test_leading_front_repeats_rely_on_length() {
        let radix = radix();
        let (front, _, payload) = radix.encode("xxxy").unwrap();
        let (_, _, shorter) = radix.encode("xy").unwrap();
        assert_eq!(payload, shorter);
        assert_eq!(radix.decode(front, 4, &payload, DigitPolicy::Strict).unwrap(), "xxxy");
        assert_eq!(radix.decode(front, 2, &payload, DigitPolicy::Strict).unwrap(), "xy");
    }

    #[test]
    fn test_rejects_empty_input() {
        let radix = radix();
        assert_eq!(radix.encode(""), Err(SjzError::EmptyText));
        assert_eq!(radix.pack(&[]), Err(SjzError::EmptyText));
        assert_eq!(radix.unpack(&[], 3), Err(SjzError::EmptyPayload));
    }

    #[test]
    fn test_rejects_invalid_digit() {
        assert_eq!(
            radix().pack(&[0, 250]),
            Err(SjzError::InvalidDigit {
                digit: 250,
                base: 250
            })
        );
    }

    #[test]
    fn test_value_overflow() {
        let small = MixedRadix::new(2);
        assert!(small.pack(&[249, 249]).is_ok());
        let err = small.pack(&[249, 249, 249]).unwrap_err();
        assert_eq!(err, SjzError::ValueOverflow { max_bytes: 2 });
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_payload_ceiling() {
        let small = MixedRadix::new(2);
        assert_eq!(
            small.unpack(&[1, 2, 3], 5),
            Err(SjzError::PayloadTooLarge { size: 3, max: 2 })
        );
    }

    #[test]
    fn test_remainder_detected() {
        let radix = radix();
        let (front, length, payload) = radix.encode("Hi").unwrap();
        let mut grown = payload;
        grown.extend_from_slice(&[0xFF, 0xFF]);
        let err = radix
            .decode(front, length, &grown, DigitPolicy::Strict)
            .unwrap_err();
        assert_eq!(err, SjzError::NonZeroRemainder { expected_digits: 2 });
        assert_eq!(err.kind(), ErrorKind::Corruption);
    }

    #[test]
    fn test_leading_zero_bytes_are_accepted() {
        let radix = radix();
        assert_eq!(radix.unpack(&[0, 0, 7], 3).unwrap(), vec![0, 0, 7]);
        assert_eq!(radix.unpack(&[0, 0, 7], 3), radix.unpack(&[7], 3));

        let front = radix_index('x');
        assert_eq!(
            radix.decode(front, 3, &[0, 0, 7], DigitPolicy::Strict),
            radix.decode(front, 3, &[7], DigitPolicy::Strict)
        );

        let err = radix.decode_canonical(front, 3, &[0, 0, 7]).unwrap_err();
        assert_eq!(err, SjzError::NonCanonicalPayload { leading_zeros: 2 });
        assert_eq!(err.kind(), ErrorKind::Corruption);
        assert!(radix.decode_canonical(front, 3, &[7]).is_ok());
    }

    #[test]
    fn test_first_digit_need_not_be_front() {
        let radix = radix();
        // Top digit 1 of a two-digit value: the chunk starts with the anchor.
        let payload = radix.pack(&[1, 0]).unwrap();
        let text = radix
            .decode(radix_index('x'), 2, &payload, DigitPolicy::Strict)
            .unwrap();
        assert_eq!(text, "Ax");

        let err = radix
            .decode_canonical(radix_index('x'), 2, &payload)
            .unwrap_err();
        assert_eq!(
            err,
            SjzError::FrontMismatch {
                expected: 'x',
                found: 'A'
            }
        );
    }

    #[test]
    fn test_degrade_policy_substitutes_sentinel() {
        let radix = radix();
        let text = radix
            .chars_from_digits(radix_index('x'), &[0, 300, 1], DigitPolicy::DegradeToSentinel)
            .unwrap();
        assert_eq!(text, "x\0A");
        assert_eq!(
            radix.chars_from_digits(radix_index('x'), &[0, 300], DigitPolicy::Strict),
            Err(SjzError::DigitOutOfRange {
                digit: 300,
                base: 250
            })
        );
    }

    #[test]
    fn test_unsupported_character_position() {
        let err = radix().encode("ab\u{1}").unwrap_err();
        assert_eq!(err.position(), Some(2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_round_trip(text in alphabet_text(1, 500)) {
            let radix = radix();
            let (front, length, payload) = radix.encode(&text).unwrap();
            let decoded = radix.decode(front, length, &payload, DigitPolicy::Strict).unwrap();
            prop_assert_eq!(&decoded, &text);
            prop_assert_eq!(radix.decode_canonical(front, length, &payload).unwrap(), text);
        }

        #[test]
        fn prop_deterministic(text in alphabet_text(1, 200)) {
            let radix = radix();
            prop_assert_eq!(radix.encode(&text).unwrap(), radix.encode(&text).unwrap());
        }

        #[test]
        fn prop_payload_is_minimal(text in alphabet_text(1, 200)) {
            let (_, _, payload) = radix().encode(&text).unwrap();
            prop_assert!(payload.len() == 1 || payload[0] != 0);
        }

        /// Chunks made mostly of the front character produce the shortest
        /// payloads and are where a wrong digit count would go unnoticed.
        #[test]
        fn prop_leading_zero_digits(
            front_index in 0..250usize,
            repeats in 1..64usize,
            tail in alphabet_text(0, 16),
        ) {
            let radix = radix();
            let front = Alphabet::get().symbols()[front_index];
            let text: String = std::iter::repeat_n(front, repeats).chain(tail.chars()).collect();
            let (front, length, payload) = radix.encode(&text).unwrap();
            let decoded = radix.decode(front, length, &payload, DigitPolicy::Strict).unwrap();
            prop_assert_eq!(&decoded, &text);

            // Any other digit count either fails or yields a different text.
            for other in [length - 1, length + 1] {
                if other == 0 {
                    continue;
                }
                if let Ok(decoded) = radix.decode(front, other, &payload, DigitPolicy::Strict) {
                    prop_assert_ne!(&decoded, &text);
                }
            }
        }

        #[test]
        fn prop_random_payload_never_panics(
            payload in proptest::collection::vec(any::<u8>(), 1..32),
            front in 0..250u16,
            length in 1..40usize,
        ) {
            let radix = radix();
            if let Ok(text) = radix.decode(front, length, &payload, DigitPolicy::Strict) {
                prop_assert_eq!(text.chars().count(), length);
            }
            // Whatever the canonical decoder accepts re-encodes to the same bytes.
            if let Ok(text) = radix.decode_canonical(front, length, &payload) {
                let (re_front, re_length, re_payload) = radix.encode(&text).unwrap();
                prop_assert_eq!(re_front, front);
                prop_assert_eq!(re_length, length);
                prop_assert_eq!(re_payload, payload);
            }
        }
    }
}
