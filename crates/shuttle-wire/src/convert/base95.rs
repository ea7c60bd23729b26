//! Printable ASCII base-95 encoding of 64-bit integers.

use super::{ConversionError, LongConverter};

const NAME: &str = "base95";
const BASE: u64 = 95;
const FIRST: u32 = ' ' as u32;
const LAST: u32 = '~' as u32;

/// Encodes a 64-bit value as up to ten printable ASCII characters.
///
/// The value is treated as unsigned. Zero renders as the empty string and
/// a leading space is a zero digit.
///
/// # Example
///
/// ```
/// use shuttle_wire::{Base95LongConverter, LongConverter};
///
/// let converter = Base95LongConverter;
/// let value = converter.parse("ab.de").expect("valid base-95 text");
/// assert_eq!(converter.render(value), "ab.de");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base95LongConverter;

impl Base95LongConverter {
    /// Longest text that fits in 64 bits.
    pub const MAX_LENGTH: usize = 10;
}

impl LongConverter for Base95LongConverter {
    fn parse(&self, text: &str) -> Result<i64, ConversionError> {
        let length = text.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(ConversionError::TooLong {
                converter: NAME,
                length,
                max: Self::MAX_LENGTH,
            });
        }
        let mut value: u64 = 0;
        for character in text.chars() {
            let code = u32::from(character);
            if !(FIRST..=LAST).contains(&code) {
                return Err(ConversionError::InvalidCharacter {
                    converter: NAME,
                    character,
                });
            }
            value = value
                .wrapping_mul(BASE)
                .wrapping_add(u64::from(code - FIRST));
        }
        Ok(value.cast_signed())
    }

    fn append(&self, out: &mut String, value: i64) {
        let mut remaining = value.cast_unsigned();
        let mut digits = Vec::with_capacity(Self::MAX_LENGTH);
        while remaining != 0 {
            let digit = remaining.rem_euclid(BASE);
            remaining = remaining.div_euclid(BASE);
            let code = u32::try_from(digit).map_or(FIRST, |d| FIRST + d);
            digits.push(char::from_u32(code).unwrap_or(' '));
        }
        out.extend(digits.iter().rev());
    }
}
