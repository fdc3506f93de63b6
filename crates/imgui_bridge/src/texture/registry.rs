//! Texture registry
//!
//! Bidirectional mapping between engine textures and the ids the GUI library
//! stores in its draw calls. Ids come from slot map keys, so an id stays valid
//! for as long as its texture is registered and is never handed out again
//! after the texture is unregistered.

use std::collections::HashMap;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use super::{SpriteHandle, TextureHandle, TextureId};
use crate::foundation::math::{Rect, Vec2};

new_key_type! {
    /// Slot map key behind every `TextureId`
    pub struct TextureKey;
}

impl From<TextureKey> for TextureId {
    fn from(key: TextureKey) -> Self {
        Self(key.data().as_ffi())
    }
}

impl From<TextureId> for TextureKey {
    fn from(id: TextureId) -> Self {
        KeyData::from_ffi(id.0).into()
    }
}

/// Where a sprite lives inside its atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSource {
    /// Atlas texture
    pub texture: TextureHandle,
    /// Atlas size in pixels
    pub texture_size: Vec2,
    /// Sprite rectangle in atlas pixels, origin at the bottom-left
    pub rect: Rect,
}

/// What GUI code needs to draw a sprite as an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInfo {
    /// Id of the atlas texture
    pub texture_id: TextureId,
    /// Sprite size in pixels
    pub size: Vec2,
    /// Top-left uv
    pub uv0: Vec2,
    /// Bottom-right uv
    pub uv1: Vec2,
}

/// Registry of textures referenced by GUI draw calls
#[derive(Debug, Default)]
pub struct TextureRegistry {
    textures: SlotMap<TextureKey, TextureHandle>,
    ids: HashMap<TextureHandle, TextureId>,
    sprites: HashMap<SpriteHandle, SpriteInfo>,
}

impl TextureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture, returning its id
    ///
    /// Registering the same texture again returns the same id.
    pub fn register(&mut self, texture: TextureHandle) -> TextureId {
        if let Some(&id) = self.ids.get(&texture) {
            return id;
        }

        let id = TextureId::from(self.textures.insert(texture));
        self.ids.insert(texture, id);
        log::debug!("Registered texture {:?} as {}", texture, id);
        id
    }

    /// Id of an already registered texture
    pub fn id_of(&self, texture: TextureHandle) -> Option<TextureId> {
        self.ids.get(&texture).copied()
    }

    /// Texture behind an id
    pub fn resolve(&self, id: TextureId) -> Option<TextureHandle> {
        if id.is_null() {
            return None;
        }
        self.textures.get(TextureKey::from(id)).copied()
    }

    /// Forget a texture and every sprite cut from it
    ///
    /// Returns the id the texture had, if it was registered.
    pub fn unregister(&mut self, texture: TextureHandle) -> Option<TextureId> {
        let id = self.ids.remove(&texture)?;
        self.textures.remove(TextureKey::from(id));
        self.sprites.retain(|_, info| info.texture_id != id);
        log::debug!("Unregistered texture {:?} ({})", texture, id);
        Some(id)
    }

    /// Register a sprite, registering its atlas texture as needed
    pub fn register_sprite(&mut self, sprite: SpriteHandle, source: SpriteSource) -> SpriteInfo {
        if let Some(&info) = self.sprites.get(&sprite) {
            return info;
        }

        let texture_id = self.register(source.texture);
        let SpriteSource { texture_size, rect, .. } = source;

        // Sprite rects are bottom-left based; GUI uvs are top-left based.
        let info = SpriteInfo {
            texture_id,
            size: Vec2::new(rect.width, rect.height),
            uv0: Vec2::new(rect.x / texture_size.x, rect.max_y() / texture_size.y),
            uv1: Vec2::new(rect.max_x() / texture_size.x, rect.y / texture_size.y),
        };
        self.sprites.insert(sprite, info);
        info
    }

    /// Sprite info of an already registered sprite
    pub fn sprite_info(&self, sprite: SpriteHandle) -> Option<SpriteInfo> {
        self.sprites.get(&sprite).copied()
    }

    /// Number of registered textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether no texture is registered
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drop every texture and sprite
    pub fn clear(&mut self) {
        self.textures.clear();
        self.ids.clear();
        self.sprites.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TextureRegistry::new();
        let a = registry.register(TextureHandle(7));
        let b = registry.register(TextureHandle(7));

        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert!(!a.is_null());
    }

    #[test]
    fn test_resolve_round_trip() {
        let mut registry = TextureRegistry::new();
        let font = registry.register(TextureHandle(1));
        let image = registry.register(TextureHandle(2));

        assert_ne!(font, image);
        assert_eq!(registry.resolve(font), Some(TextureHandle(1)));
        assert_eq!(registry.resolve(image), Some(TextureHandle(2)));
        assert_eq!(registry.id_of(TextureHandle(2)), Some(image));
    }

    #[test]
    fn test_unknown_ids_do_not_resolve() {
        let registry = TextureRegistry::new();
        assert_eq!(registry.resolve(TextureId::NULL), None);
        assert_eq!(registry.resolve(TextureId(0xdead_beef)), None);
        assert_eq!(registry.id_of(TextureHandle(3)), None);
    }

    #[test]
    fn test_unregistered_id_is_not_reused() {
        let mut registry = TextureRegistry::new();
        let old = registry.register(TextureHandle(1));
        assert_eq!(registry.unregister(TextureHandle(1)), Some(old));
        assert_eq!(registry.resolve(old), None);

        let new = registry.register(TextureHandle(1));
        assert_ne!(old, new);
        assert_eq!(registry.resolve(old), None);
        assert_eq!(registry.resolve(new), Some(TextureHandle(1)));
    }

    #[test]
    fn test_sprite_uvs() {
        let mut registry = TextureRegistry::new();
        let info = registry.register_sprite(
            SpriteHandle(10),
            SpriteSource {
                texture: TextureHandle(5),
                texture_size: Vec2::new(256.0, 128.0),
                rect: Rect::new(64.0, 32.0, 32.0, 64.0),
            },
        );

        assert_eq!(Some(info.texture_id), registry.id_of(TextureHandle(5)));
        assert_relative_eq!(info.size, Vec2::new(32.0, 64.0));
        assert_relative_eq!(info.uv0, Vec2::new(0.25, 0.75));
        assert_relative_eq!(info.uv1, Vec2::new(0.375, 0.25));
        assert_eq!(registry.sprite_info(SpriteHandle(10)), Some(info));
    }

    #[test]
    fn test_unregister_drops_sprites() {
        let mut registry = TextureRegistry::new();
        registry.register_sprite(
            SpriteHandle(1),
            SpriteSource {
                texture: TextureHandle(9),
                texture_size: Vec2::new(16.0, 16.0),
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
            },
        );

        registry.unregister(TextureHandle(9));
        assert_eq!(registry.sprite_info(SpriteHandle(1)), None);
        assert!(registry.is_empty());
    }
}
