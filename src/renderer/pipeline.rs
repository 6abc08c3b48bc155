//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in the fragment shader using signed distance
//! fields over a single fullscreen triangle. All per-entity data is streamed
//! into storage buffers each frame.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::sim::{GamePhase, GameState, ParticleKind};

/// Maximum number of interceptors in flight
const MAX_INTERCEPTORS: usize = 32;
/// Maximum number of live blast zones
const MAX_BLASTS: usize = 32;
/// Maximum number of raiders on screen
const MAX_RAIDERS: usize = 64;
/// Maximum particles, matching the simulation cap
const MAX_PARTICLES: usize = crate::sim::MAX_PARTICLES;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],   // offset 0
    time: f32,              // offset 8
    screen_shake: f32,      // offset 12
    aim: [f32; 2],          // offset 16 (8-byte aligned for WGSL vec2)
    interceptor_count: u32, // offset 24
    blast_count: u32,       // offset 28
    raider_count: u32,      // offset 32
    particle_count: u32,    // offset 36
    integrity: f32,         // offset 40 - 0..1 for the floor glow
    playing: u32,           // offset 44 - 1 while the run is live
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InterceptorData {
    pos: [f32; 2],
    vel: [f32; 2], // For the motion streak
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BlastData {
    center: [f32; 2],
    radius: f32,
    expansion: f32, // 0-1 growth progress, drives fade-out
    massive: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct RaiderData {
    pos: [f32; 2],
    heading: [f32; 2], // For orienting the dart
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ParticleData {
    pos: [f32; 2],
    life: f32,
    kind: u32, // 0=trail, 1=soot, 2=debris
}

// ============================================================================
// RENDER STATE
// ============================================================================

pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    interceptors_buffer: wgpu::Buffer,
    blasts_buffer: wgpu::Buffer,
    raiders_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ashfall-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                time: 0.0,
                screen_shake: 0.0,
                aim: [0.0, 0.0],
                interceptor_count: 0,
                blast_count: 0,
                raider_count: 0,
                particle_count: 0,
                integrity: 1.0,
                playing: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let interceptors_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("interceptors"),
            size: (std::mem::size_of::<InterceptorData>() * MAX_INTERCEPTORS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let blasts_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blasts"),
            size: (std::mem::size_of::<BlastData>() * MAX_BLASTS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let raiders_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raiders"),
            size: (std::mem::size_of::<RaiderData>() * MAX_RAIDERS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let particles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles"),
            size: (std::mem::size_of::<ParticleData>() * MAX_PARTICLES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: interceptors_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: blasts_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: raiders_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: particles_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            interceptors_buffer,
            blasts_buffer,
            raiders_buffer,
            particles_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        aim: glam::Vec2,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let interceptor_count = state.interceptors.len().min(MAX_INTERCEPTORS) as u32;
        let blast_count = state.blasts.len().min(MAX_BLASTS) as u32;
        let raider_count = state.raiders.len().min(MAX_RAIDERS) as u32;
        let particle_count = state.particles.len().min(MAX_PARTICLES) as u32;

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            time: elapsed,
            screen_shake: state.screen_shake,
            aim: [aim.x, aim.y],
            interceptor_count,
            blast_count,
            raider_count,
            particle_count,
            integrity: state.integrity as f32 / state.tuning.integrity_max as f32,
            playing: if state.phase == GamePhase::Playing { 1 } else { 0 },
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut interceptors_data = vec![
            InterceptorData {
                pos: [0.0; 2],
                vel: [0.0; 2],
            };
            MAX_INTERCEPTORS
        ];
        for (i, shot) in state.interceptors.iter().take(MAX_INTERCEPTORS).enumerate() {
            interceptors_data[i] = InterceptorData {
                pos: [shot.pos.x, shot.pos.y],
                vel: [shot.vel.x, shot.vel.y],
            };
        }
        self.queue.write_buffer(
            &self.interceptors_buffer,
            0,
            bytemuck::cast_slice(&interceptors_data),
        );

        let mut blasts_data = vec![
            BlastData {
                center: [0.0; 2],
                radius: 0.0,
                expansion: 0.0,
                massive: 0,
                _pad: [0; 3],
            };
            MAX_BLASTS
        ];
        for (i, blast) in state.blasts.iter().take(MAX_BLASTS).enumerate() {
            blasts_data[i] = BlastData {
                center: [blast.center.x, blast.center.y],
                radius: blast.radius,
                expansion: blast.expansion(),
                massive: if blast.massive { 1 } else { 0 },
                _pad: [0; 3],
            };
        }
        self.queue
            .write_buffer(&self.blasts_buffer, 0, bytemuck::cast_slice(&blasts_data));

        let mut raiders_data = vec![
            RaiderData {
                pos: [0.0; 2],
                heading: [0.0; 2],
            };
            MAX_RAIDERS
        ];
        for (i, raider) in state.raiders.iter().take(MAX_RAIDERS).enumerate() {
            raiders_data[i] = RaiderData {
                pos: [raider.pos.x, raider.pos.y],
                heading: [raider.heading.x, raider.heading.y],
            };
        }
        self.queue
            .write_buffer(&self.raiders_buffer, 0, bytemuck::cast_slice(&raiders_data));

        let mut particles_data = vec![
            ParticleData {
                pos: [0.0; 2],
                life: 0.0,
                kind: 0,
            };
            MAX_PARTICLES
        ];
        for (i, particle) in state.particles.iter().take(MAX_PARTICLES).enumerate() {
            particles_data[i] = ParticleData {
                pos: [particle.pos.x, particle.pos.y],
                life: particle.life,
                kind: match particle.kind {
                    ParticleKind::Trail => 0,
                    ParticleKind::Soot => 1,
                    ParticleKind::Debris => 2,
                },
            };
        }
        self.queue.write_buffer(
            &self.particles_buffer,
            0,
            bytemuck::cast_slice(&particles_data),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
