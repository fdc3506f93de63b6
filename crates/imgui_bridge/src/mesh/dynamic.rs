//! Host mesh interface
//!
//! `DynamicMesh` is the slice of a host engine's mesh API the builder needs.
//! `CpuMesh` implements it over plain vectors and enforces the same rules a
//! GPU mesh does, most importantly that the sub-mesh count may only change
//! right after the mesh was cleared.

use bitflags::bitflags;

use super::vertex::{DrawIdx, DrawVert, VertexAttributeDescriptor};
use super::{MeshError, MeshResult};
use crate::handles::MeshHandle;

bitflags! {
    /// Checks the host may skip while mesh data is updated
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeshUpdateFlags: u32 {
        /// Don't notify renderers using the mesh
        const DONT_NOTIFY_USERS = 1 << 0;
        /// Don't recompute bounds
        const DONT_RECALCULATE_BOUNDS = 1 << 1;
        /// Don't reset skinned bone bounds
        const DONT_RESET_BONE_BOUNDS = 1 << 2;
        /// Don't validate indices against the vertex count
        const DONT_VALIDATE_INDICES = 1 << 3;
    }
}

impl MeshUpdateFlags {
    /// Every check skipped; used for the per-frame GUI upload
    pub const NO_CHECKS: Self = Self::DONT_NOTIFY_USERS
        .union(Self::DONT_RECALCULATE_BOUNDS)
        .union(Self::DONT_RESET_BONE_BOUNDS)
        .union(Self::DONT_VALIDATE_INDICES);
}

/// Primitive topology of a sub-mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshTopology {
    /// Indexed triangle list
    #[default]
    Triangles,
}

/// Index buffer element format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit unsigned indices
    UInt16,
    /// 32-bit unsigned indices
    UInt32,
}

/// Contiguous range of the shared buffers drawn as one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubMeshDescriptor {
    /// Primitive topology
    pub topology: MeshTopology,
    /// First index in the shared index buffer
    pub index_start: usize,
    /// Number of indices
    pub index_count: usize,
    /// Value added to every index before fetching a vertex
    pub base_vertex: usize,
}

/// Mesh the host rebuilds every frame
pub trait DynamicMesh {
    /// Handle used when the mesh is referenced from draw commands
    fn handle(&self) -> MeshHandle;

    /// Hint that the mesh is rewritten frequently
    fn mark_dynamic(&mut self);

    /// Drop all vertex, index and sub-mesh data
    fn clear(&mut self, keep_vertex_layout: bool);

    /// Current number of sub-meshes
    fn sub_mesh_count(&self) -> usize;

    /// Change the number of sub-meshes
    ///
    /// Must directly follow `clear` when the count actually changes.
    fn set_sub_mesh_count(&mut self, count: usize) -> MeshResult<()>;

    /// Allocate the vertex buffer
    fn set_vertex_buffer_params(
        &mut self,
        vertex_count: usize,
        layout: &[VertexAttributeDescriptor],
    ) -> MeshResult<()>;

    /// Allocate the index buffer
    fn set_index_buffer_params(&mut self, index_count: usize, format: IndexFormat) -> MeshResult<()>;

    /// Copy vertices into the buffer starting at `dst_start`
    fn set_vertex_buffer_data(
        &mut self,
        data: &[DrawVert],
        dst_start: usize,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()>;

    /// Copy indices into the buffer starting at `dst_start`
    fn set_index_buffer_data(
        &mut self,
        data: &[DrawIdx],
        dst_start: usize,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()>;

    /// Replace every sub-mesh descriptor
    fn set_sub_meshes(&mut self, descriptors: &[SubMeshDescriptor], flags: MeshUpdateFlags) -> MeshResult<()>;

    /// Push pending changes to the GPU
    fn upload(&mut self, mark_no_longer_readable: bool) -> MeshResult<()>;
}

/// CPU-side `DynamicMesh`
#[derive(Debug, Clone)]
pub struct CpuMesh {
    handle: MeshHandle,
    name: String,
    dynamic: bool,
    vertices: Vec<DrawVert>,
    indices: Vec<DrawIdx>,
    index_format: IndexFormat,
    sub_mesh_count: usize,
    sub_meshes: Vec<SubMeshDescriptor>,
    /// Set by `clear`, dropped once the structure is defined again
    cleared: bool,
    readable: bool,
    upload_count: u64,
}

impl CpuMesh {
    /// Create an empty mesh with a single sub-mesh
    pub fn new(handle: MeshHandle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            dynamic: false,
            vertices: Vec::new(),
            indices: Vec::new(),
            index_format: IndexFormat::UInt16,
            sub_mesh_count: 1,
            sub_meshes: Vec::new(),
            cleared: true,
            readable: true,
            upload_count: 0,
        }
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `mark_dynamic` was called
    pub const fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Vertex buffer contents
    pub fn vertices(&self) -> &[DrawVert] {
        &self.vertices
    }

    /// Vertex buffer as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents
    pub fn indices(&self) -> &[DrawIdx] {
        &self.indices
    }

    /// Index buffer format
    pub const fn index_format(&self) -> IndexFormat {
        self.index_format
    }

    /// Sub-mesh descriptors currently defined
    pub fn sub_meshes(&self) -> &[SubMeshDescriptor] {
        &self.sub_meshes
    }

    /// Whether CPU-side data survives the next upload
    pub const fn is_readable(&self) -> bool {
        self.readable
    }

    /// Number of uploads performed
    pub const fn upload_count(&self) -> u64 {
        self.upload_count
    }
}

impl DynamicMesh for CpuMesh {
    fn handle(&self) -> MeshHandle {
        self.handle
    }

    fn mark_dynamic(&mut self) {
        self.dynamic = true;
    }

    fn clear(&mut self, _keep_vertex_layout: bool) {
        self.vertices.clear();
        self.indices.clear();
        self.sub_meshes.clear();
        self.cleared = true;
    }

    fn sub_mesh_count(&self) -> usize {
        self.sub_mesh_count
    }

    fn set_sub_mesh_count(&mut self, count: usize) -> MeshResult<()> {
        if count != self.sub_mesh_count && !self.cleared {
            return Err(MeshError::ResizeWithoutReset {
                from: self.sub_mesh_count,
                to: count,
            });
        }
        self.sub_mesh_count = count;
        self.sub_meshes.truncate(count);
        Ok(())
    }

    fn set_vertex_buffer_params(
        &mut self,
        vertex_count: usize,
        _layout: &[VertexAttributeDescriptor],
    ) -> MeshResult<()> {
        self.vertices.resize(vertex_count, DrawVert::default());
        Ok(())
    }

    fn set_index_buffer_params(&mut self, index_count: usize, format: IndexFormat) -> MeshResult<()> {
        if format != IndexFormat::UInt16 {
            return Err(MeshError::UnsupportedIndexFormat(format));
        }
        self.index_format = format;
        self.indices.resize(index_count, 0);
        Ok(())
    }

    fn set_vertex_buffer_data(
        &mut self,
        data: &[DrawVert],
        dst_start: usize,
        _flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        let end = dst_start + data.len();
        let capacity = self.vertices.len();
        let dst = self
            .vertices
            .get_mut(dst_start..end)
            .ok_or(MeshError::BufferOverflow { start: dst_start, len: data.len(), capacity })?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn set_index_buffer_data(
        &mut self,
        data: &[DrawIdx],
        dst_start: usize,
        _flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        let end = dst_start + data.len();
        let capacity = self.indices.len();
        let dst = self
            .indices
            .get_mut(dst_start..end)
            .ok_or(MeshError::BufferOverflow { start: dst_start, len: data.len(), capacity })?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn set_sub_meshes(&mut self, descriptors: &[SubMeshDescriptor], _flags: MeshUpdateFlags) -> MeshResult<()> {
        if descriptors.len() != self.sub_mesh_count {
            return Err(MeshError::SubMeshCountMismatch {
                expected: self.sub_mesh_count,
                actual: descriptors.len(),
            });
        }

        // Range checks stay on regardless of flags: they guard the copy, not the data.
        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.index_start + descriptor.index_count > self.indices.len() {
                return Err(MeshError::SubMeshOutOfRange {
                    index,
                    end: descriptor.index_start + descriptor.index_count,
                    capacity: self.indices.len(),
                });
            }
        }

        self.sub_meshes.clear();
        self.sub_meshes.extend_from_slice(descriptors);
        self.cleared = false;
        Ok(())
    }

    fn upload(&mut self, mark_no_longer_readable: bool) -> MeshResult<()> {
        self.readable = !mark_no_longer_readable;
        self.upload_count += 1;
        Ok(())
    }
}
