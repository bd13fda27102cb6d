use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{KeymergeError, KeymergeResult};

/// Straight (non-premultiplied) RGBA with every channel on the `0..=0xffff` scale.
///
/// All pixel comparisons happen on this scale, whatever the source pixel format.
pub type Rgba16 = image::Rgba<u16>;

/// Background color treated as "empty" during compositing.
///
/// Only the RGB channels take part in matching; alpha is carried along for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyColor(pub Rgba16);

impl Default for KeyColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl KeyColor {
    /// Opaque white, the fallback key.
    pub const WHITE: Self = Self(image::Rgba([u16::MAX; 4]));

    /// Build a key from 8-bit channels, scaling each by 257.
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self(image::Rgba(rgba.map(widen_u8)))
    }

    /// Build a key from channels already on the 16-bit scale.
    pub fn from_rgba16(rgba: Rgba16) -> Self {
        Self(rgba)
    }

    /// The key's channels on the 16-bit scale.
    pub fn rgba16(self) -> Rgba16 {
        self.0
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `#rrrrggggbbbbaaaa`.
    ///
    /// The `#` is optional and digits are case-insensitive. Short form doubles each
    /// digit. Alpha defaults to opaque.
    pub fn parse(s: &str) -> KeymergeResult<Self> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KeymergeError::invalid_color(format!(
                "\"{s}\" is not a hex color"
            )));
        }

        let hex = |range: std::ops::Range<usize>| -> u16 {
            // Digits were validated above.
            u16::from_str_radix(&digits[range], 16).unwrap_or(0)
        };

        let rgba = match digits.len() {
            3 => [
                hex(0..1) * 17 * 257,
                hex(1..2) * 17 * 257,
                hex(2..3) * 17 * 257,
                u16::MAX,
            ],
            6 => [hex(0..2) * 257, hex(2..4) * 257, hex(4..6) * 257, u16::MAX],
            8 => [
                hex(0..2) * 257,
                hex(2..4) * 257,
                hex(4..6) * 257,
                hex(6..8) * 257,
            ],
            16 => [hex(0..4), hex(4..8), hex(8..12), hex(12..16)],
            n => {
                return Err(KeymergeError::invalid_color(format!(
                    "\"{s}\" has {n} hex digits, expected 3, 6, 8 or 16"
                )));
            }
        };

        Ok(Self(image::Rgba(rgba)))
    }

    /// Parse `s`, falling back to [`KeyColor::WHITE`] when it is malformed.
    pub fn parse_or_default(s: &str) -> Self {
        match Self::parse(s) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(%err, "using white as the key color");
                Self::WHITE
            }
        }
    }

    /// True when `px` has exactly the key's RGB channels. Alpha is never consulted.
    pub fn matches_rgb(self, px: Rgba16) -> bool {
        self.0.0[..3] == px.0[..3]
    }
}

fn widen_u8(v: u8) -> u16 {
    u16::from(v) * 257
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        if self.0.0.iter().all(|c| c % 257 == 0) {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                r / 257,
                g / 257,
                b / 257,
                a / 257
            )
        } else {
            write!(f, "#{r:04x}{g:04x}{b:04x}{a:04x}")
        }
    }
}

impl FromStr for KeyColor {
    type Err = KeymergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for KeyColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
