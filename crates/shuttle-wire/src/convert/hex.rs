//! Hexadecimal text for 32- and 64-bit integers.

use super::{ConversionError, IntConverter, LongConverter};

const NAME: &str = "hex";

/// Renders integers as unsigned lowercase hexadecimal.
///
/// Parsing accepts either case. Empty text parses as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexConverter;

fn parse_digits(text: &str, max: usize) -> Result<u64, ConversionError> {
    let length = text.chars().count();
    if length > max {
        return Err(ConversionError::TooLong {
            converter: NAME,
            length,
            max,
        });
    }
    text.chars().try_fold(0_u64, |value, character| {
        character
            .to_digit(16)
            .map(|digit| (value << 4) | u64::from(digit))
            .ok_or(ConversionError::InvalidCharacter {
                converter: NAME,
                character,
            })
    })
}

impl IntConverter for HexConverter {
    fn parse(&self, text: &str) -> Result<i32, ConversionError> {
        let value = parse_digits(text, 8)?;
        // Eight hex digits always fit in 32 bits.
        Ok(u32::try_from(value).unwrap_or(u32::MAX).cast_signed())
    }

    fn append(&self, out: &mut String, value: i32) {
        out.push_str(&format!("{:x}", value.cast_unsigned()));
    }
}

impl LongConverter for HexConverter {
    fn parse(&self, text: &str) -> Result<i64, ConversionError> {
        Ok(parse_digits(text, 16)?.cast_signed())
    }

    fn append(&self, out: &mut String, value: i64) {
        out.push_str(&format!("{:x}", value.cast_unsigned()));
    }
}
