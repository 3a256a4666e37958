use bytemuck::{Pod, Zeroable};
use std::num::NonZeroU64;
use sparse_life::{Cell, GridSnapshot, View};

pub const CELL_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const HIGHLIGHT_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
pub const INITIAL_INSTANCE_CAPACITY: u64 = 4096;

/// Vertices per cell quad (two triangles).
pub const QUAD_VERTICES: u32 = 6;

// Uniforms specific to rendering
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderParams {
    pub screen_size: [f32; 2],
    pub origin: [f32; 2],
    pub cell_size: f32,
    pub _padding: [f32; 3], // Pad to 32 bytes to match the WGSL struct
}

/// Per-instance data: cell position relative to the first visible cell.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CellInstance {
    pub position: [i32; 2],
    pub color: [f32; 4],
}

impl CellInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Sint32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CellInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Fill `instances` with the visible part of `snapshot` and return the
/// matching uniforms. The hover highlight goes first so live cells draw
/// over it.
pub fn build_instances(
    snapshot: &GridSnapshot,
    view: &View,
    width: u32,
    height: u32,
    hover: Option<Cell>,
    instances: &mut Vec<CellInstance>,
) -> RenderParams {
    let (min, max) = view.visible_cells(width, height);
    let relative = |cell: Cell| [cell.x - min.x, cell.y - min.y];

    instances.clear();
    if let Some(cell) = hover {
        if cell.x >= min.x && cell.x <= max.x && cell.y >= min.y && cell.y <= max.y {
            instances.push(CellInstance {
                position: relative(cell),
                color: HIGHLIGHT_COLOR,
            });
        }
    }
    instances.extend(snapshot.cells_in(min, max).map(|cell| CellInstance {
        position: relative(cell),
        color: CELL_COLOR,
    }));

    RenderParams {
        screen_size: [width.max(1) as f32, height.max(1) as f32],
        origin: view.cell_to_screen(min),
        cell_size: view.cell_size as f32,
        _padding: [0.0; 3],
    }
}

pub fn create_render_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Render Bind Group Layout"),
        entries: &[
            // RenderParams Uniform (Binding 0)
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<RenderParams>() as u64),
                },
                count: None,
            },
        ],
    })
}

pub fn create_render_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    render_param_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Render Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: render_param_buffer.as_entire_binding(),
        }],
    })
}

pub fn create_render_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Cell Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("render.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Render Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[CellInstance::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(format.into())],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

pub fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Cell Instance Buffer"),
        size: capacity * std::mem::size_of::<CellInstance>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
