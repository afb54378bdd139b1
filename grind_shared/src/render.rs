//! Render host abstraction.
//!
//! The scene never draws directly. It asks a host for sprites and text
//! labels and gets back opaque handles; the host owns the visual objects and
//! whatever graphics backend sits behind them.

use std::collections::HashMap;

use crate::math::Vec2;

/// Handle to a sprite owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u64);

/// Handle to a text label owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextHandle(pub u64);

/// Visual parameters of a text label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: u16,
    /// Anchor inside the text box, `(0,0)` top-left to `(1,1)` bottom-right.
    pub origin: (f32, f32),
    pub depth: i32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12,
            origin: (0.5, 0.5),
            depth: 0,
        }
    }
}

/// Everything the scene needs from a renderer.
pub trait RenderHost {
    fn add_sprite(&mut self, texture: &str, position: Vec2) -> SpriteHandle;
    fn set_sprite_position(&mut self, sprite: SpriteHandle, position: Vec2);
    fn destroy_sprite(&mut self, sprite: SpriteHandle);

    fn add_text(&mut self, position: Vec2, content: &str, style: TextStyle) -> TextHandle;
    fn set_text(&mut self, text: TextHandle, content: &str);
    fn set_text_position(&mut self, text: TextHandle, position: Vec2);
    fn set_text_visible(&mut self, text: TextHandle, visible: bool);
    fn destroy_text(&mut self, text: TextHandle);
}

/// A sprite as the headless host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteNode {
    pub texture: String,
    pub position: Vec2,
}

/// A text label as the headless host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub position: Vec2,
    pub style: TextStyle,
    pub visible: bool,
}

/// In-memory host with no graphics backend. Used by the console binary and
/// by tests that need to inspect what is on screen.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_id: u64,
    sprites: HashMap<SpriteHandle, SpriteNode>,
    texts: HashMap<TextHandle, TextNode>,
}

impl HeadlessRenderer {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn sprite(&self, sprite: SpriteHandle) -> Option<&SpriteNode> {
        self.sprites.get(&sprite)
    }

    pub fn text(&self, text: TextHandle) -> Option<&TextNode> {
        self.texts.get(&text)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }
}

impl RenderHost for HeadlessRenderer {
    fn add_sprite(&mut self, texture: &str, position: Vec2) -> SpriteHandle {
        let handle = SpriteHandle(self.next());
        self.sprites.insert(
            handle,
            SpriteNode {
                texture: texture.to_string(),
                position,
            },
        );
        handle
    }

    fn set_sprite_position(&mut self, sprite: SpriteHandle, position: Vec2) {
        if let Some(node) = self.sprites.get_mut(&sprite) {
            node.position = position;
        }
    }

    fn destroy_sprite(&mut self, sprite: SpriteHandle) {
        self.sprites.remove(&sprite);
    }

    fn add_text(&mut self, position: Vec2, content: &str, style: TextStyle) -> TextHandle {
        let handle = TextHandle(self.next());
        self.texts.insert(
            handle,
            TextNode {
                content: content.to_string(),
                position,
                style,
                visible: true,
            },
        );
        handle
    }

    fn set_text(&mut self, text: TextHandle, content: &str) {
        if let Some(node) = self.texts.get_mut(&text) {
            node.content = content.to_string();
        }
    }

    fn set_text_position(&mut self, text: TextHandle, position: Vec2) {
        if let Some(node) = self.texts.get_mut(&text) {
            node.position = position;
        }
    }

    fn set_text_visible(&mut self, text: TextHandle, visible: bool) {
        if let Some(node) = self.texts.get_mut(&text) {
            node.visible = visible;
        }
    }

    fn destroy_text(&mut self, text: TextHandle) {
        self.texts.remove(&text);
    }
}
