//! Per-frame mesh rebuild
//!
//! Concatenates every draw list's vertex and index memory into one dynamic
//! mesh and defines one sub-mesh per draw call, in list order then call order.

use super::dynamic::{DynamicMesh, IndexFormat, MeshTopology, MeshUpdateFlags, SubMeshDescriptor};
use super::vertex::DRAW_VERT_LAYOUT;
use super::MeshResult;
use crate::draw_data::DrawData;

/// Rebuilds the GUI mesh from a frame's draw lists
#[derive(Debug)]
pub struct MeshBuilder {
    /// Sub-mesh count of the previous rebuild
    prev_sub_mesh_count: usize,
    /// Reused between frames to avoid per-frame allocation
    descriptors: Vec<SubMeshDescriptor>,
}

impl MeshBuilder {
    /// Create a builder for a freshly created mesh (one sub-mesh)
    pub fn new() -> Self {
        Self {
            prev_sub_mesh_count: 1,
            descriptors: Vec::new(),
        }
    }

    /// Sub-mesh count defined by the last rebuild
    pub const fn sub_mesh_count(&self) -> usize {
        self.prev_sub_mesh_count
    }

    /// Rebuild `mesh` from `draw_data`
    ///
    /// Draw-list memory is only read during this call.
    pub fn update<M: DynamicMesh + ?Sized>(&mut self, mesh: &mut M, draw_data: &DrawData<'_>) -> MeshResult<()> {
        let sub_mesh_count = draw_data.total_cmd_count();

        if self.prev_sub_mesh_count != sub_mesh_count {
            log::trace!(
                "Sub-mesh count changed {} -> {}, resetting mesh",
                self.prev_sub_mesh_count,
                sub_mesh_count
            );
            mesh.clear(true);
            mesh.set_sub_mesh_count(sub_mesh_count)?;
            self.prev_sub_mesh_count = sub_mesh_count;
        }

        mesh.set_vertex_buffer_params(draw_data.total_vtx_count(), &DRAW_VERT_LAYOUT)?;
        mesh.set_index_buffer_params(draw_data.total_idx_count(), IndexFormat::UInt16)?;

        let mut vtx_offset = 0;
        let mut idx_offset = 0;
        self.descriptors.clear();

        for list in &draw_data.cmd_lists {
            mesh.set_vertex_buffer_data(list.vtx_buffer, vtx_offset, MeshUpdateFlags::NO_CHECKS)?;
            mesh.set_index_buffer_data(list.idx_buffer, idx_offset, MeshUpdateFlags::NO_CHECKS)?;

            self.descriptors.extend(list.cmd_buffer.iter().map(|cmd| SubMeshDescriptor {
                topology: MeshTopology::Triangles,
                index_start: idx_offset + cmd.idx_offset as usize,
                index_count: cmd.elem_count as usize,
                base_vertex: vtx_offset + cmd.vtx_offset as usize,
            }));

            vtx_offset += list.vtx_buffer.len();
            idx_offset += list.idx_buffer.len();
        }

        mesh.set_sub_meshes(&self.descriptors, MeshUpdateFlags::NO_CHECKS)?;
        mesh.upload(false)?;

        log::trace!(
            "Rebuilt GUI mesh: {} vertices, {} indices, {} sub-meshes",
            vtx_offset,
            idx_offset,
            self.descriptors.len()
        );
        Ok(())
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}
