//! Text style bitmask, orthogonal to colour.

use serde::{Deserialize, Serialize};

/// Style flags for a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style(u16);

impl Style {
    /// No styling.
    pub const NONE: Self = Self(0);
    /// Struck-through text.
    pub const STRUCK: Self = Self(1 << 0);
    /// Bold text.
    pub const BOLD: Self = Self(1 << 1);
    /// Curly underline.
    pub const UNDERCURL: Self = Self(1 << 2);
    /// Underlined text.
    pub const UNDERLINE: Self = Self(1 << 3);
    /// Italic text.
    pub const ITALIC: Self = Self(1 << 4);
    /// Dim/faint text.
    pub const DIM: Self = Self(1 << 5);
    /// Blinking text.
    pub const BLINK: Self = Self(1 << 6);
    /// Reversed colours.
    pub const REVERSE: Self = Self(1 << 7);

    const KNOWN: u16 = 0x00ff;

    /// Create empty style.
    #[must_use]
    pub const fn empty() -> Self {
        Self::NONE
    }

    /// Check if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Add flags.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Get raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Create from raw bits; unknown bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::KNOWN)
    }
}

impl std::ops::BitOr for Style {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Style {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for Style {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for Style {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0 & Self::KNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_empty() {
        let s = Style::empty();
        assert!(s.is_empty());
        assert_eq!(s.bits(), 0);
    }

    #[test]
    fn test_style_with_without() {
        let s = Style::BOLD.with(Style::ITALIC);
        assert!(s.contains(Style::BOLD));
        let s2 = s.without(Style::BOLD);
        assert!(!s2.contains(Style::BOLD));
        assert!(s2.contains(Style::ITALIC));
    }

    #[test]
    fn test_style_ops() {
        let mut s = Style::BOLD | Style::UNDERLINE;
        s |= Style::STRUCK;
        assert!(s.contains(Style::STRUCK));
        assert_eq!(s & Style::BOLD, Style::BOLD);
        assert!(!(!s).contains(Style::BOLD));
        assert!((!s).contains(Style::ITALIC));
    }

    #[test]
    fn test_from_bits_masks_unknown() {
        let s = Style::from_bits(0xff02);
        assert_eq!(s, Style::BOLD | Style::from_bits(0x00));
        assert_eq!(s.bits(), 0x0002);
    }

    #[test]
    fn test_bit_values() {
        assert_eq!(Style::STRUCK.bits(), 0x0001);
        assert_eq!(Style::BOLD.bits(), 0x0002);
        assert_eq!(Style::UNDERCURL.bits(), 0x0004);
        assert_eq!(Style::UNDERLINE.bits(), 0x0008);
        assert_eq!(Style::ITALIC.bits(), 0x0010);
    }
}
