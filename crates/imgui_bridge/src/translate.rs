//! Draw-list to command translation
//!
//! Walks a frame's draw lists and emits the command sequence that renders
//! them from the shared GUI mesh: viewport and matrices first, then per draw
//! call a texture bind (only when the texture changes), the clip-rect keyword
//! toggle, a scissor rectangle and a sub-mesh draw, and a final scissor
//! disable.
//!
//! The output depends only on the draw data, the texture registry and the
//! translator's resources, so identical input always yields identical
//! commands.

use crate::command::{BoundTexture, CommandWriter, DrawCommand};
use crate::draw_data::{CallbackError, DrawData};
use crate::foundation::math::{Mat4, Mat4Ext, Rect, Vec2, Vec4};
use crate::handles::{KeywordId, MaterialHandle, MeshHandle, PropertyId};
use crate::texture::{TextureId, TextureRegistry};

/// Destination of translated commands
pub trait CommandSink {
    /// Append a command
    fn push(&mut self, command: DrawCommand);
}

impl CommandSink for Vec<DrawCommand> {
    fn push(&mut self, command: DrawCommand) {
        Vec::push(self, command);
    }
}

impl CommandSink for CommandWriter<'_> {
    fn push(&mut self, command: DrawCommand) {
        CommandWriter::push(self, command);
    }
}

/// Errors raised during translation
#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    /// A user draw callback failed
    #[error("draw callback {command} of draw list {list} failed")]
    Callback {
        /// Draw list index
        list: usize,
        /// Draw call index inside the list
        command: usize,
        /// Callback error
        #[source]
        source: CallbackError,
    },
}

/// Host resources referenced by translated commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorResources {
    /// Shared GUI mesh
    pub mesh: MeshHandle,
    /// GUI material
    pub material: MaterialHandle,
    /// Property the draw call's texture is bound to
    pub texture_property: PropertyId,
    /// Keyword toggling soft clip-rect evaluation in the shader
    pub clip_rect_keyword: KeywordId,
}

/// Counters of one translation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslateStats {
    /// Sub-mesh draws emitted
    pub draws: usize,
    /// Draw calls skipped as fully off-screen
    pub culled: usize,
    /// User callbacks invoked
    pub callbacks: usize,
    /// Texture binds emitted
    pub texture_binds: usize,
}

/// Translates draw data into buffered draw commands
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    resources: TranslatorResources,
}

impl CommandTranslator {
    /// Create a translator drawing with the given resources
    pub const fn new(resources: TranslatorResources) -> Self {
        Self { resources }
    }

    /// Resources referenced by emitted commands
    pub const fn resources(&self) -> &TranslatorResources {
        &self.resources
    }

    /// Translate one frame into `out`
    ///
    /// Degenerate frames (non-positive framebuffer or no vertices) emit
    /// nothing. User callbacks run synchronously, in draw order; the first
    /// failing callback aborts translation.
    ///
    /// # Panics
    ///
    /// Panics if a draw call references a texture id that is not in
    /// `textures`. That means GUI code drew a texture that was never
    /// registered, which is a programming error.
    pub fn translate<S: CommandSink + ?Sized>(
        &self,
        draw_data: &DrawData<'_>,
        textures: &TextureRegistry,
        out: &mut S,
    ) -> Result<TranslateStats, TranslateError> {
        let mut stats = TranslateStats::default();
        if draw_data.is_degenerate() {
            return Ok(stats);
        }

        let fb_size = draw_data.framebuffer_size();
        let clip_offset = Vec4::new(
            draw_data.display_pos.x,
            draw_data.display_pos.y,
            draw_data.display_pos.x,
            draw_data.display_pos.y,
        );
        let clip_scale = Vec4::new(
            draw_data.framebuffer_scale.x,
            draw_data.framebuffer_scale.y,
            draw_data.framebuffer_scale.x,
            draw_data.framebuffer_scale.y,
        );

        out.push(DrawCommand::SetViewport(Rect::new(0.0, 0.0, fb_size.x, fb_size.y)));
        out.push(DrawCommand::SetViewProjection {
            // Half-pixel shift keeps glyph edges on pixel centers.
            view: Mat4::translation(0.5 / fb_size.x, 0.5 / fb_size.y, 0.0),
            projection: Mat4::orthographic(0.0, fb_size.x, fb_size.y, 0.0, 0.0, 1.0),
        });

        let mut prev_texture: Option<TextureId> = None;
        let mut sub_mesh: u32 = 0;

        for (list_index, list) in draw_data.cmd_lists.iter().enumerate() {
            for (cmd_index, cmd) in list.cmd_buffer.iter().enumerate() {
                let current = sub_mesh;
                sub_mesh += 1;

                if let Some(callback) = &cmd.user_callback {
                    callback.invoke(list, cmd).map_err(|source| TranslateError::Callback {
                        list: list_index,
                        command: cmd_index,
                        source,
                    })?;
                    stats.callbacks += 1;
                    continue;
                }

                let clip = (cmd.clip_rect - clip_offset).component_mul(&clip_scale);
                if is_outside_framebuffer(&clip, &fb_size) {
                    stats.culled += 1;
                    continue;
                }

                if prev_texture != Some(cmd.texture_id) {
                    prev_texture = Some(cmd.texture_id);
                    let texture = textures.resolve(cmd.texture_id).unwrap_or_else(|| {
                        panic!(
                            "texture {} is not registered; register it before drawing it",
                            cmd.texture_id
                        )
                    });
                    out.push(DrawCommand::SetGlobalTexture {
                        property: self.resources.texture_property,
                        texture: BoundTexture::Engine(texture),
                    });
                    stats.texture_binds += 1;
                }

                out.push(DrawCommand::DisableKeyword {
                    material: self.resources.material,
                    keyword: self.resources.clip_rect_keyword,
                });
                out.push(DrawCommand::EnableScissor(Rect::new(
                    clip.x,
                    fb_size.y - clip.w,
                    clip.z - clip.x,
                    clip.w - clip.y,
                )));
                out.push(DrawCommand::DrawMesh {
                    mesh: self.resources.mesh,
                    transform: Mat4::identity(),
                    material: self.resources.material,
                    sub_mesh: current,
                });
                stats.draws += 1;
            }
        }

        out.push(DrawCommand::DisableScissor);

        log::trace!(
            "Translated frame: {} draws, {} culled, {} callbacks, {} texture binds",
            stats.draws,
            stats.culled,
            stats.callbacks,
            stats.texture_binds
        );
        Ok(stats)
    }
}

/// Whether a framebuffer-space clip rect `(min_x, min_y, max_x, max_y)` misses the framebuffer
fn is_outside_framebuffer(clip: &Vec4, fb_size: &Vec2) -> bool {
    clip.x >= fb_size.x || clip.y >= fb_size.y || clip.z <= 0.0 || clip.w <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_data::{DrawCmd, DrawList, UserCallback};
    use crate::mesh::{DrawIdx, DrawVert};
    use crate::texture::TextureHandle;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const RESOURCES: TranslatorResources = TranslatorResources {
        mesh: MeshHandle(1),
        material: MaterialHandle(2),
        texture_property: PropertyId(3),
        clip_rect_keyword: KeywordId(4),
    };

    const FULL: [f32; 4] = [0.0, 0.0, 800.0, 600.0];

    fn clip(rect: [f32; 4]) -> Vec4 {
        Vec4::new(rect[0], rect[1], rect[2], rect[3])
    }

    fn geometry() -> (Vec<DrawVert>, Vec<DrawIdx>) {
        (vec![DrawVert::default(); 4], vec![0, 1, 2, 0, 2, 3])
    }

    fn translate(data: &DrawData<'_>, textures: &TextureRegistry) -> (Vec<DrawCommand>, TranslateStats) {
        let mut out = Vec::new();
        let stats = CommandTranslator::new(RESOURCES).translate(data, textures, &mut out).unwrap();
        (out, stats)
    }

    fn count(commands: &[DrawCommand], name: &str) -> usize {
        commands.iter().filter(|c| c.name() == name).count()
    }

    #[test]
    fn test_two_lists_bind_each_texture_once() {
        let mut textures = TextureRegistry::new();
        let t1 = textures.register(TextureHandle(10));
        let t2 = textures.register(TextureHandle(20));
        let (verts, idx) = geometry();

        let list_a = vec![DrawCmd::new(clip(FULL), t1, 0, 6)];
        let list_b = vec![DrawCmd::new(clip(FULL), t1, 0, 6), DrawCmd::new(clip(FULL), t2, 0, 6)];
        let data = DrawData::new(
            Vec2::new(800.0, 600.0),
            vec![DrawList::new(&verts, &idx, &list_a), DrawList::new(&verts, &idx, &list_b)],
        );

        let (commands, stats) = translate(&data, &textures);

        let names: Vec<_> = commands.iter().map(DrawCommand::name).collect();
        assert_eq!(
            names,
            vec![
                "SetViewport",
                "SetViewProjection",
                "SetGlobalTexture",
                "DisableKeyword",
                "EnableScissor",
                "DrawMesh",
                "DisableKeyword",
                "EnableScissor",
                "DrawMesh",
                "SetGlobalTexture",
                "DisableKeyword",
                "EnableScissor",
                "DrawMesh",
                "DisableScissor",
            ]
        );
        assert_eq!(stats.texture_binds, 2);
        assert_eq!(stats.draws, 3);

        let bound: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetGlobalTexture { property, texture } => {
                    assert_eq!(*property, PropertyId(3));
                    Some(texture.source())
                }
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec![TextureHandle(10), TextureHandle(20)]);

        let sub_meshes: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawMesh { sub_mesh, mesh, material, transform } => {
                    assert_eq!(*mesh, MeshHandle(1));
                    assert_eq!(*material, MaterialHandle(2));
                    assert_eq!(*transform, Mat4::identity());
                    Some(*sub_mesh)
                }
                _ => None,
            })
            .collect();
        assert_eq!(sub_meshes, vec![0, 1, 2]);
    }

    #[test]
    fn test_viewport_and_matrices() {
        let mut textures = TextureRegistry::new();
        let t = textures.register(TextureHandle(1));
        let (verts, idx) = geometry();
        let cmds = vec![DrawCmd::new(clip(FULL), t, 0, 6)];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let (commands, _) = translate(&data, &textures);

        assert_eq!(commands[0], DrawCommand::SetViewport(Rect::new(0.0, 0.0, 800.0, 600.0)));
        match &commands[1] {
            DrawCommand::SetViewProjection { view, projection } => {
                assert_relative_eq!(view[(0, 3)], 0.5 / 800.0);
                assert_relative_eq!(view[(1, 3)], 0.5 / 600.0);
                assert_relative_eq!(projection[(1, 1)], -2.0 / 600.0);
                assert_relative_eq!(projection[(1, 3)], 1.0);
            }
            other => panic!("expected view-projection, got {other:?}"),
        }
    }

    #[test]
    fn test_scissor_is_y_flipped_and_scaled() {
        let mut textures = TextureRegistry::new();
        let t = textures.register(TextureHandle(1));
        let (verts, idx) = geometry();
        let cmds = vec![DrawCmd::new(Vec4::new(110.0, 70.0, 210.0, 120.0), t, 0, 6)];
        let mut data = DrawData::new(Vec2::new(400.0, 300.0), vec![DrawList::new(&verts, &idx, &cmds)]);
        data.display_pos = Vec2::new(100.0, 50.0);
        data.framebuffer_scale = Vec2::new(2.0, 2.0);

        let (commands, _) = translate(&data, &textures);

        // (110,70)-(210,120) minus (100,50), times 2 => (20,40)-(220,140) in an 800x600 framebuffer.
        let scissor = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::EnableScissor(rect) => Some(*rect),
                _ => None,
            })
            .unwrap();
        assert_eq!(scissor, Rect::new(20.0, 460.0, 200.0, 100.0));
    }

    #[test]
    fn test_offscreen_calls_emit_nothing() {
        let mut textures = TextureRegistry::new();
        let t = textures.register(TextureHandle(1));
        let (verts, idx) = geometry();
        let cmds = vec![
            DrawCmd::new(Vec4::new(-50.0, 0.0, 0.0, 100.0), t, 0, 6),
            DrawCmd::new(Vec4::new(0.0, -50.0, 100.0, 0.0), t, 0, 6),
            DrawCmd::new(Vec4::new(800.0, 0.0, 900.0, 100.0), t, 0, 6),
            DrawCmd::new(Vec4::new(0.0, 600.0, 100.0, 700.0), t, 0, 6),
        ];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let (commands, stats) = translate(&data, &textures);

        assert_eq!(stats.culled, 4);
        assert_eq!(commands.len(), 3);
        assert_eq!(count(&commands, "SetGlobalTexture"), 0);
        assert_eq!(count(&commands, "EnableScissor"), 0);
        assert_eq!(count(&commands, "DrawMesh"), 0);
    }

    #[test]
    fn test_culled_calls_still_advance_sub_mesh_index() {
        let mut textures = TextureRegistry::new();
        let t = textures.register(TextureHandle(1));
        let (verts, idx) = geometry();
        let cmds = vec![
            DrawCmd::new(Vec4::new(900.0, 0.0, 950.0, 10.0), t, 0, 6),
            DrawCmd::new(clip(FULL), t, 0, 6),
        ];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let (commands, _) = translate(&data, &textures);

        assert!(commands.iter().any(|c| matches!(c, DrawCommand::DrawMesh { sub_mesh: 1, .. })));
    }

    #[test]
    fn test_callbacks_run_during_translation() {
        let mut textures = TextureRegistry::new();
        let t = textures.register(TextureHandle(1));
        let (verts, idx) = geometry();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let cmds = vec![
            DrawCmd::new(clip(FULL), t, 0, 6),
            DrawCmd::callback(
                clip(FULL),
                UserCallback::new(move |list, _| {
                    assert_eq!(list.vtx_buffer.len(), 4);
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            ),
            DrawCmd::new(clip(FULL), t, 0, 6),
        ];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let (commands, stats) = translate(&data, &textures);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.callbacks, 1);
        // The callback leaves the texture binding untouched.
        assert_eq!(count(&commands, "SetGlobalTexture"), 1);
        let subs: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawMesh { sub_mesh, .. } => Some(*sub_mesh),
                _ => None,
            })
            .collect();
        assert_eq!(subs, vec![0, 2]);
    }

    #[test]
    fn test_callback_error_propagates() {
        let textures = TextureRegistry::new();
        let (verts, idx) = geometry();
        let cmds = vec![DrawCmd::callback(clip(FULL), UserCallback::new(|_, _| Err("boom".into())))];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let mut out = Vec::new();
        let err = CommandTranslator::new(RESOURCES).translate(&data, &textures, &mut out).unwrap_err();

        let TranslateError::Callback { list, command, source } = err;
        assert_eq!((list, command), (0, 0));
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_unregistered_texture_panics() {
        let textures = TextureRegistry::new();
        let (verts, idx) = geometry();
        let cmds = vec![DrawCmd::new(clip(FULL), TextureId(0x42), 0, 6)];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        translate(&data, &textures);
    }

    #[test]
    fn test_empty_frame_emits_nothing() {
        let textures = TextureRegistry::new();
        let data = DrawData::new(Vec2::new(800.0, 600.0), Vec::new());

        let (commands, stats) = translate(&data, &textures);

        assert!(commands.is_empty());
        assert_eq!(stats, TranslateStats::default());
    }

    #[test]
    fn test_translation_is_deterministic() {
        let mut textures = TextureRegistry::new();
        let t1 = textures.register(TextureHandle(1));
        let t2 = textures.register(TextureHandle(2));
        let (verts, idx) = geometry();
        let cmds = vec![
            DrawCmd::new(clip(FULL), t1, 0, 6),
            DrawCmd::new(Vec4::new(10.0, 10.0, 50.0, 50.0), t2, 0, 6),
            DrawCmd::new(clip(FULL), t1, 0, 6),
        ];
        let data = DrawData::new(Vec2::new(800.0, 600.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let (first, _) = translate(&data, &textures);
        let (second, _) = translate(&data, &textures);
        assert_eq!(first, second);
        assert_eq!(count(&first, "SetGlobalTexture"), 3);
    }
}
