//! GPU-resident meshes and the render pass extension that draws them.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::gfx::geometry::Mesh;

/// Vertex buffer plus optional index buffer for one uploaded [`Mesh`].
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    /// Index count when indexed, vertex count otherwise
    pub count: u32,
}

impl GpuMesh {
    /// Interleaves and uploads `mesh`. The mesh should already be validated.
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertices = mesh.to_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = mesh.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", label)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        Self {
            vertex_buffer,
            index_buffer,
            count: mesh.draw_count() as u32,
        }
    }
}

pub trait DrawGpuMesh<'a> {
    fn draw_gpu_mesh(&mut self, mesh: &'a GpuMesh);
    fn draw_gpu_mesh_instanced(&mut self, mesh: &'a GpuMesh, instances: Range<u32>);
}

impl<'a, 'b> DrawGpuMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_gpu_mesh(&mut self, mesh: &'b GpuMesh) {
        self.draw_gpu_mesh_instanced(mesh, 0..1);
    }

    /// Indexed draw when the mesh has indices, array draw otherwise.
    fn draw_gpu_mesh_instanced(&mut self, mesh: &'b GpuMesh, instances: Range<u32>) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        match &mesh.index_buffer {
            Some(index_buffer) => {
                self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..mesh.count, 0, instances);
            }
            None => self.draw(0..mesh.count, instances),
        }
    }
}
