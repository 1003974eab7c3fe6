use std::fmt::Display;

use rustc_serialize::hex::{FromHex, ToHex};

use crate::error::DifferenceError;
use crate::oracle::SymbolWidth;

/*
A fixed input or output difference.
The text is written most significant symbol first: symbol i of the string lands at position (len - 1 - i) of the block.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Difference {
    symbols: Vec<u8>,
    width: SymbolWidth,
}

impl Difference {
    pub fn parse(text: &str, width: SymbolWidth, len: usize) -> Result<Self, DifferenceError> {
        let expected = len * width.hex_digits();
        let found = text.chars().count();
        if found != expected {
            return Err(DifferenceError::Length {
                text: text.to_owned(),
                expected,
                found,
            });
        }
        let invalid = || DifferenceError::InvalidHex {
            text: text.to_owned(),
        };

        let mut symbols: Vec<u8> = match width {
            SymbolWidth::Byte => text.from_hex().map_err(|_| invalid())?,
            SymbolWidth::Nibble => text
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(invalid)?,
        };
        /* from_hex skips whitespace, so a well-sized text may still decode short. */
        if symbols.len() != len {
            return Err(invalid());
        }
        symbols.reverse();

        Ok(Self { symbols, width })
    }

    /// A difference of `len` zero symbols.
    pub fn zero(width: SymbolWidth, len: usize) -> Self {
        Self {
            symbols: vec![0; len],
            width,
        }
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn is_zero(&self) -> bool {
        self.symbols.iter().all(|s| *s == 0)
    }
}

impl Display for Difference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ordered = self.symbols.to_owned();
        ordered.reverse();
        match self.width {
            SymbolWidth::Byte => write!(f, "{}", ordered.to_hex()),
            SymbolWidth::Nibble => ordered
                .iter()
                .try_for_each(|nibble| write!(f, "{:x}", nibble)),
        }
    }
}
