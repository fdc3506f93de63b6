//! Texture identity
//!
//! Engine textures are referenced by `TextureHandle`; the GUI library only
//! sees opaque `TextureId`s. The registry translates between the two.

pub mod registry;

pub use registry::{SpriteInfo, SpriteSource, TextureRegistry};

use std::fmt;

/// Handle to an engine-owned texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to an engine-owned sprite (a sub-rectangle of an atlas texture)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u64);

/// Opaque texture id embedded in GUI draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureId(pub u64);

impl TextureId {
    /// Id that never refers to a texture
    pub const NULL: Self = Self(0);

    /// Raw value handed to the GUI library
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the null id
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
