//! Fixed-function state vocabulary: capabilities, clear masks, viewports.

use std::ops::BitOr;

/// A toggleable pipeline capability (the `glEnable` / `glDisable` set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Depth testing against the bound depth attachment.
    DepthTest,
    /// Depth writes. Enabled by default.
    DepthWrite,
    /// Alpha blending (`SrcAlpha`, `OneMinusSrcAlpha`).
    Blend,
    /// Back-face culling.
    CullFace,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 4] = [
        Self::DepthTest,
        Self::DepthWrite,
        Self::Blend,
        Self::CullFace,
    ];

    /// Whether the capability is on in a freshly created context.
    #[must_use]
    pub fn default_enabled(self) -> bool {
        matches!(self, Self::DepthWrite)
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of enabled capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// No capability enabled.
    pub const EMPTY: Self = Self(0);

    /// Whether `cap` is in the set.
    #[must_use]
    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Add or remove `cap`.
    pub fn set(&mut self, cap: Capability, enabled: bool) {
        if enabled {
            self.0 |= cap.bit();
        } else {
            self.0 &= !cap.bit();
        }
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        let mut set = Self::EMPTY;
        for cap in Capability::ALL {
            set.set(cap, cap.default_enabled());
        }
        set
    }
}

/// Buffers cleared by a single clear call.
///
/// Masks combine with `|`, so a pass can register
/// `ClearMask::DEPTH | ClearMask::COLOR` as one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClearMask(u8);

impl ClearMask {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Color attachments.
    pub const COLOR: Self = Self(1);
    /// Depth attachment.
    pub const DEPTH: Self = Self(1 << 1);

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ClearMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Viewport rectangle in pixels, origin at the top-left of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Viewport {
    /// Viewport at the origin with the given size.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Whether the viewport covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clip the rectangle to a `width × height` target. Returns `None` if
    /// nothing is left.
    #[must_use]
    pub fn clipped_to(&self, width: u32, height: u32) -> Option<Self> {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let w = self.width.min(width - x);
        let h = self.height.min(height - y);
        let clipped = Self {
            x,
            y,
            width: w,
            height: h,
        };
        (!clipped.is_empty()).then_some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities() {
        let set = CapabilitySet::default();
        assert!(set.contains(Capability::DepthWrite));
        assert!(!set.contains(Capability::DepthTest));
        assert!(!set.contains(Capability::Blend));
        assert!(!set.contains(Capability::CullFace));
    }

    #[test]
    fn capability_set_toggles_single_bit() {
        let mut set = CapabilitySet::EMPTY;
        set.set(Capability::Blend, true);
        set.set(Capability::CullFace, true);
        set.set(Capability::Blend, false);
        assert!(!set.contains(Capability::Blend));
        assert!(set.contains(Capability::CullFace));
    }

    #[test]
    fn clear_mask_combines() {
        let both = ClearMask::DEPTH | ClearMask::COLOR;
        assert!(both.contains(ClearMask::COLOR));
        assert!(both.contains(ClearMask::DEPTH));
        assert!(!ClearMask::DEPTH.contains(ClearMask::COLOR));
        assert!(ClearMask::NONE.is_empty());
    }

    #[test]
    fn viewport_clipping() {
        let vp = Viewport {
            x: 100,
            y: 50,
            width: 400,
            height: 400,
        };
        let clipped = vp.clipped_to(256, 256).unwrap();
        assert_eq!(clipped, Viewport { x: 100, y: 50, width: 156, height: 206 });
        assert!(Viewport::default().clipped_to(256, 256).is_none());
        assert!(Viewport::full(10, 10).clipped_to(0, 0).is_none());
    }
}
