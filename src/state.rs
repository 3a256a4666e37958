use crate::error::AppError;
use crate::render::{
    self, CellInstance, RenderParams, INITIAL_INSTANCE_CAPACITY, QUAD_VERTICES,
};
use crate::ui::{self, PanelState};
use sparse_life::{Cell, Engine, View};
use wgpu::util::DeviceExt;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    window::Window,
};
use std::sync::Arc;

// GUI Imports
use egui_winit::State as EguiWinitState;
use egui_wgpu::Renderer as EguiWgpuRenderer;
use egui::Context as EguiContext;

pub const TITLE: &str = "Conway's Game of Life";

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub window: Arc<Window>,

    pub render_pipeline: wgpu::RenderPipeline,
    pub render_bind_group: wgpu::BindGroup,
    pub render_param_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub instance_capacity: u64,
    instances: Vec<CellInstance>,

    pub engine: Arc<Engine>,
    pub view: View,
    pub is_left_mouse_pressed: bool,
    pub is_middle_mouse_pressed: bool,
    pub last_mouse_pos: Option<PhysicalPosition<f64>>, // For panning
    pub cursor_pos: Option<PhysicalPosition<f64>>,     // For zoom centering and hover
    pub last_paint_cell: Option<Cell>,                 // Start of the next drag segment
    pub hover_cell: Option<Cell>,

    // GUI state
    pub egui_ctx: EguiContext,
    pub egui_winit_state: EguiWinitState,
    pub egui_renderer: EguiWgpuRenderer,
    pub panel: PanelState,
    title: String,
}

impl State {
    pub async fn new(window: Arc<Window>, engine: Arc<Engine>, view: View) -> Result<Self, AppError> {
        let size = window.inner_size();

        log::info!("Initializing wgpu...");

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(AppError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Create Render Resources
        let render_param_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Parameters"),
            contents: bytemuck::bytes_of(&<RenderParams as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let render_bind_group_layout = render::create_render_bind_group_layout(&device);
        let render_bind_group =
            render::create_render_bind_group(&device, &render_bind_group_layout, &render_param_buffer);
        let render_pipeline =
            render::create_render_pipeline(&device, &render_bind_group_layout, config.format);
        let instance_buffer = render::create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        log::info!("Initializing egui...");
        let egui_ctx = EguiContext::default();
        let egui_winit_state = EguiWinitState::new(egui_ctx.clone(), egui_ctx.viewport_id(), &window, None, None);
        let egui_renderer = EguiWgpuRenderer::new(&device, config.format, None, 1);
        log::info!("egui initialized.");

        log::info!("wgpu initialized successfully.");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            render_pipeline,
            render_bind_group,
            render_param_buffer,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            instances: Vec::new(),
            engine,
            view,
            is_left_mouse_pressed: false,
            is_middle_mouse_pressed: false,
            last_mouse_pos: None,
            cursor_pos: None,
            last_paint_cell: None,
            hover_cell: None,
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            panel: PanelState::default(),
            title: String::new(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.engine.request_redraw();
            log::info!("Reconfigured surface to: {}x{}", new_size.width, new_size.height);
        } else {
            log::warn!("Ignoring resize to zero dimensions: {}x{}", new_size.width, new_size.height);
        }
    }

    /// Grow the instance buffer (doubling) until it holds `needed` cells.
    fn ensure_instance_capacity(&mut self, needed: u64) {
        if needed <= self.instance_capacity {
            return;
        }
        let mut capacity = self.instance_capacity.max(1);
        while capacity < needed {
            capacity *= 2;
        }
        log::debug!("Growing cell instance buffer to {} instances", capacity);
        self.instance_buffer = render::create_instance_buffer(&self.device, capacity);
        self.instance_capacity = capacity;
    }

    /// Draw the latest generation plus the egui overlay and present it.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let snapshot = self.engine.snapshot();
        let params = render::build_instances(
            &snapshot,
            &self.view,
            self.size.width,
            self.size.height,
            self.hover_cell,
            &mut self.instances,
        );
        drop(snapshot);

        self.queue.write_buffer(&self.render_param_buffer, 0, bytemuck::bytes_of(&params));
        self.ensure_instance_capacity(self.instances.len() as u64);
        if !self.instances.is_empty() {
            self.queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }

        let output_frame = self.surface.get_current_texture()?;
        let output_view = output_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Render Encoder") });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &output_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })
                ],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !self.instances.is_empty() {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.render_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..self.instances.len() as u32);
            }
        }

        let egui_commands = self.render_ui(&mut encoder, &output_view);

        self.queue.submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output_frame.present();

        self.update_title();
        Ok(())
    }

    /// Run the egui frame and record its render pass on top of the cells.
    fn render_ui(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
    ) -> Vec<wgpu::CommandBuffer> {
        let raw_input = self.egui_winit_state.take_egui_input(&self.window);
        self.egui_ctx.begin_frame(raw_input);

        let screen_center = (self.size.width as f64 / 2.0, self.size.height as f64 / 2.0);
        ui::show(&self.egui_ctx, &mut self.panel, &self.engine, &mut self.view, screen_center);

        let full_output = self.egui_ctx.end_frame();
        self.egui_winit_state.handle_platform_output(&self.window, full_output.platform_output);
        let pixels_per_point = self.window.scale_factor() as f32;
        let paint_jobs = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output_view, // Render egui ON TOP of the cells
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        commands
    }

    fn update_title(&mut self) {
        let stats = self.engine.stats();
        let mut title = String::from(TITLE);
        if stats.paused {
            title.push_str(" | PAUSED |");
        }
        title.push_str(&format!(" FPS: {} TPS: {}", stats.frames_per_second, stats.ticks_per_second));

        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}
