//! WebGPU presenter
//!
//! Uploads the foreground layer and runs the post passes from `post.wgsl`:
//!
//! 1. scene: ground gradient and lights under the layer (full res)
//! 2. bloom: horizontal then vertical gaussian into half-res targets
//! 3. post: feedback + shaken/split scene + bloom + overlays, written into
//!    one of two ping-pong targets; the other holds the previous frame
//! 4. blit: the post target onto the surface

use thiserror::Error;
use wgpu::util::DeviceExt;

use super::pipeline::Frame;
use super::post::{BlurParams, PostGlobals};
use crate::assets::{Assets, Sprite, SpriteKey};

/// Format of every offscreen target; values are display-space like a 2D canvas
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoFormat,
}

/// Size-dependent textures and the bind groups that read them
struct Targets {
    size: (u32, u32),
    layer: wgpu::Texture,
    scene: wgpu::TextureView,
    bloom_a: wgpu::TextureView,
    bloom_b: wgpu::TextureView,
    present: [wgpu::TextureView; 2],
    scene_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    /// `post_groups[i]` writes `present[i]` and reads the other as feedback
    post_groups: [wgpu::BindGroup; 2],
    blit_groups: [wgpu::BindGroup; 2],
}

/// Textures bound for one pass
struct PassInputs<'a> {
    blur: &'a wgpu::Buffer,
    src: &'a wgpu::TextureView,
    bloom: &'a wgpu::TextureView,
    feedback: &'a wgpu::TextureView,
}

pub struct Presenter {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    scene_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    post_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,

    // Uniform buffers
    globals_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,

    clamp_sampler: wgpu::Sampler,
    repeat_sampler: wgpu::Sampler,
    noise: wgpu::TextureView,
    screamer: wgpu::TextureView,
    /// 1x1 transparent stand-in for bindings a pass does not read
    blank: wgpu::TextureView,

    targets: Option<Targets>,
    /// Which ping-pong target the next frame writes
    current: usize,
    /// Reused RGBA8 upload buffer
    staging: Vec<u8>,
}

impl Presenter {
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        assets: &Assets,
    ) -> Result<Self, PresentError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("mole-rush-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        // The frame is already display-space; a linear surface shows it as is
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(PresentError::NoFormat)?;
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("post.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post_globals"),
            contents: bytemuck::bytes_of(&<PostGlobals as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blur_buffer = |label| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&BlurParams::new([0.0, 0.0], 0.0, 1.0, 1.0)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let blur_h_buffer = blur_buffer("blur_h");
        let blur_v_buffer = blur_buffer("blur_v");

        let uniform = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let sampler = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bind_group_layout"),
            entries: &[
                uniform(0),
                uniform(1),
                sampler(2),
                sampler(3),
                texture(4), // src
                texture(5), // bloom
                texture(6), // feedback
                texture(7), // noise
                texture(8), // screamer
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |label, entry_point, format| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[], // Fullscreen triangle
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
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
            })
        };
        let scene_pipeline = make_pipeline("scene_pipeline", "fs_scene", TARGET_FORMAT);
        let blur_pipeline = make_pipeline("blur_pipeline", "fs_blur", TARGET_FORMAT);
        let post_pipeline = make_pipeline("post_pipeline", "fs_post", TARGET_FORMAT);
        let blit_entry = if surface_format.is_srgb() {
            "fs_blit_srgb"
        } else {
            "fs_blit"
        };
        let blit_pipeline = make_pipeline("blit_pipeline", blit_entry, surface_format);

        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("clamp_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("repeat_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut staging = Vec::new();
        let blank = upload_sprite(&device, &queue, "blank", None, &mut staging);
        let noise = upload_sprite(&device, &queue, "noise", assets.get(SpriteKey::Noise), &mut staging);
        let screamer = upload_sprite(
            &device,
            &queue,
            "screamer",
            assets.get(SpriteKey::Screamer),
            &mut staging,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene_pipeline,
            blur_pipeline,
            post_pipeline,
            blit_pipeline,
            bind_group_layout,
            globals_buffer,
            blur_h_buffer,
            blur_v_buffer,
            clamp_sampler,
            repeat_sampler,
            noise,
            screamer,
            blank,
            targets: None,
            current: 0,
            staging,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure after the surface was lost or became outdated
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the layer, run the post passes and present
    pub fn present(&mut self, frame: &Frame<'_>) -> Result<(), wgpu::SurfaceError> {
        let (w, h) = (frame.layer.width() as u32, frame.layer.height() as u32);
        if w == 0 || h == 0 {
            return Ok(());
        }
        if self.targets.as_ref().map(|t| t.size) != Some((w, h)) {
            // New targets start blank, so motion-blur history resets
            let targets = self.create_targets(w, h);
            self.targets = Some(targets);
            self.current = 0;
            log::debug!("Post targets {}x{}", w, h);
        }
        let Some(targets) = &self.targets else {
            return Ok(());
        };

        frame.layer.write_rgba8(&mut self.staging);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.layer,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.staging,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            extent(w, h),
        );

        let sigma = frame.post.bloom[1];
        let (fw, fh) = (w as f32, h as f32);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&frame.post));
        self.queue.write_buffer(
            &self.blur_h_buffer,
            0,
            bytemuck::bytes_of(&BlurParams::new([1.0, 0.0], sigma, fw, fh)),
        );
        self.queue.write_buffer(
            &self.blur_v_buffer,
            0,
            bytemuck::bytes_of(&BlurParams::new([0.0, 1.0], sigma, fw, fh)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("post_encoder"),
            });

        let cur = self.current;
        fullscreen_pass(&mut encoder, "scene_pass", &targets.scene, &self.scene_pipeline, &targets.scene_group);
        fullscreen_pass(&mut encoder, "bloom_h_pass", &targets.bloom_a, &self.blur_pipeline, &targets.blur_h_group);
        fullscreen_pass(&mut encoder, "bloom_v_pass", &targets.bloom_b, &self.blur_pipeline, &targets.blur_v_group);
        fullscreen_pass(
            &mut encoder,
            "post_pass",
            &targets.present[cur],
            &self.post_pipeline,
            &targets.post_groups[cur],
        );
        fullscreen_pass(&mut encoder, "blit_pass", &view, &self.blit_pipeline, &targets.blit_groups[cur]);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.current = 1 - cur;

        Ok(())
    }

    fn create_targets(&self, width: u32, height: u32) -> Targets {
        let half = ((width / 2).max(1), (height / 2).max(1));
        let layer = create_texture(
            &self.device,
            "layer",
            width,
            height,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let layer_view = layer.create_view(&wgpu::TextureViewDescriptor::default());
        let target = |label, (w, h): (u32, u32)| {
            create_texture(
                &self.device,
                label,
                w,
                h,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
            .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let scene = target("scene_target", (width, height));
        let bloom_a = target("bloom_a", half);
        let bloom_b = target("bloom_b", half);
        let present = [
            target("present_0", (width, height)),
            target("present_1", (width, height)),
        ];

        let blank = &self.blank;
        let scene_group = self.bind(
            "scene_group",
            PassInputs {
                blur: &self.blur_h_buffer,
                src: &layer_view,
                bloom: blank,
                feedback: blank,
            },
        );
        let blur_h_group = self.bind(
            "blur_h_group",
            PassInputs {
                blur: &self.blur_h_buffer,
                src: &scene,
                bloom: blank,
                feedback: blank,
            },
        );
        let blur_v_group = self.bind(
            "blur_v_group",
            PassInputs {
                blur: &self.blur_v_buffer,
                src: &bloom_a,
                bloom: blank,
                feedback: blank,
            },
        );
        let post_groups = [0usize, 1].map(|i| {
            self.bind(
                "post_group",
                PassInputs {
                    blur: &self.blur_h_buffer,
                    src: &scene,
                    bloom: &bloom_b,
                    feedback: &present[1 - i],
                },
            )
        });
        let blit_groups = [0usize, 1].map(|i| {
            self.bind(
                "blit_group",
                PassInputs {
                    blur: &self.blur_h_buffer,
                    src: &present[i],
                    bloom: blank,
                    feedback: blank,
                },
            )
        });

        Targets {
            size: (width, height),
            layer,
            scene,
            bloom_a,
            bloom_b,
            present,
            scene_group,
            blur_h_group,
            blur_v_group,
            post_groups,
            blit_groups,
        }
    }

    fn bind(&self, label: &str, inputs: PassInputs<'_>) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: inputs.blur.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.clamp_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(inputs.src),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(inputs.bloom),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(inputs.feedback),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::TextureView(&self.noise),
                },
                wgpu::BindGroupEntry {
                    binding: 8,
                    resource: wgpu::BindingResource::TextureView(&self.screamer),
                },
            ],
        })
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage,
        view_formats: &[],
    })
}

/// Sprite as a sampled texture; a missing sprite becomes 1x1 transparent
fn upload_sprite(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    sprite: Option<&Sprite>,
    staging: &mut Vec<u8>,
) -> wgpu::TextureView {
    let (w, h) = match sprite {
        Some(sprite) if !sprite.is_empty() => {
            sprite.write_rgba8(staging);
            (sprite.width() as u32, sprite.height() as u32)
        }
        _ => {
            staging.clear();
            staging.extend_from_slice(&[0; 4]);
            (1, 1)
        }
    };
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(w, h),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        staging.as_slice(),
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, bind_group, &[]);
    render_pass.draw(0..3, 0..1);
}
