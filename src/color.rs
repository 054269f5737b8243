//! Waveform / progress colour pair.
//!
//! Colours are kept as `#rrggbb` strings so they can be shown and edited in
//! the UI as-is, and converted to RGB only when rendering.

use std::fmt;

use rand::Rng;
use thiserror::Error;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("colour `{0}` is not of the form #rgb or #rrggbb")]
    Invalid(String),
}

/// A validated, lowercase `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    /// Parse user input. Accepts `#rgb` and `#rrggbb` in any case.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let s = input.trim();
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::Invalid(input.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::Invalid(input.to_string()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorError::Invalid(input.to_string())),
        };
        Ok(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    pub fn black() -> Self {
        Self("#000000".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `#` followed by six hex digits, each drawn uniformly from `0-9a-f`.
pub fn random_hex_color<R: Rng + ?Sized>(rng: &mut R) -> HexColor {
    let mut s = String::with_capacity(7);
    s.push('#');
    for _ in 0..6 {
        s.push(HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())] as char);
    }
    HexColor(s)
}

/// The two colours the waveform is drawn with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePair {
    /// Unplayed part of the waveform.
    pub wave: HexColor,
    /// Played part of the waveform.
    pub progress: HexColor,
}

impl ThemePair {
    /// Both colours generated independently.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let wave = random_hex_color(rng);
        let progress = random_hex_color(rng);
        Self { wave, progress }
    }

    /// Shown when there is no current track.
    pub fn neutral(color: &HexColor) -> Self {
        Self {
            wave: color.clone(),
            progress: color.clone(),
        }
    }
}
