//! Rendererモジュール
//!
//! wgpuでプレビュー状態を描画する（影マップ→シーンの2パス）

mod depth;
mod gpu_context;
mod scene_pipeline;
mod shadow_pipeline;

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use preview_core::SurfaceSize;
use preview_renderer::{glam::Vec3, PreviewState, Scene, SceneOptions};

use gpu_context::GpuContext;
use scene_pipeline::{GpuMesh, ScenePipeline};
use shadow_pipeline::ShadowPipeline;

/// Renderer構造体
pub struct Renderer {
    ctx: GpuContext,
    scene_pipeline: ScenePipeline,
    shadow: ShadowPipeline,
    shadow_bind_group: wgpu::BindGroup,

    sample_count: u32,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,

    /// Scene::drawables() と同じ順序
    meshes: Vec<GpuMesh>,
    /// アップロード済みのシーン番号
    uploaded_revision: Option<u64>,
}

impl Renderer {
    /// 新しいRendererを作成（非同期）
    pub async fn create(canvas: HtmlCanvasElement, options: &SceneOptions) -> Result<Renderer, JsValue> {
        let ctx = GpuContext::new(canvas).await?;
        let sample_count = options.sample_count();

        let scene_pipeline = ScenePipeline::new(&ctx, sample_count);
        let shadow = ShadowPipeline::new(&ctx, &scene_pipeline.frame_layout, &scene_pipeline.model_layout);
        let shadow_bind_group =
            scene_pipeline.create_shadow_bind_group(&ctx, &shadow.sampled_view, &shadow.sampler);

        let depth_view = depth::create_texture(&ctx.device, ctx.width(), ctx.height(), sample_count);
        let msaa_view = depth::create_msaa_target(
            &ctx.device,
            ctx.config.format,
            ctx.width(),
            ctx.height(),
            sample_count,
        );

        log::debug!("Renderer initialized ({}x MSAA)", sample_count);

        Ok(Self {
            ctx,
            scene_pipeline,
            shadow,
            shadow_bind_group,
            sample_count,
            depth_view,
            msaa_view,
            meshes: Vec::new(),
            uploaded_revision: None,
        })
    }

    /// プレビュー状態を1フレーム描画
    pub fn render(&mut self, state: &PreviewState) -> Result<(), JsValue> {
        let scene = state.scene();
        self.sync_meshes(scene);

        let frame = state.frame_uniform().with_srgb_encode(self.ctx.needs_srgb_encode());
        self.ctx
            .queue
            .write_buffer(&self.scene_pipeline.frame_buffer, 0, bytemuck::bytes_of(&frame));

        // メッシュ回転を反映
        for (gpu, scene_mesh) in self.meshes.iter().zip(scene.drawables()) {
            self.ctx.queue.write_buffer(
                &gpu.model_buffer,
                0,
                bytemuck::bytes_of(&scene_mesh.model_uniform()),
            );
        }

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // 次のフレームで描画する
                self.ctx.resize(self.ctx.size);
                return Ok(());
            }
            Err(e) => {
                return Err(JsValue::from_str(&format!("Failed to get surface texture: {:?}", e)));
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Preview Encoder"),
            });

        if frame.flags[1] != 0 {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(&self.shadow.pipeline);
            shadow_pass.set_bind_group(0, &self.scene_pipeline.frame_bind_group, &[]);
            for mesh in self.meshes.iter().filter(|m| m.cast_shadow) {
                mesh.draw(&mut shadow_pass);
            }
        }

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color(scene)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.scene_pipeline.pipeline);
            render_pass.set_bind_group(0, &self.scene_pipeline.frame_bind_group, &[]);
            render_pass.set_bind_group(2, &self.shadow_bind_group, &[]);
            for mesh in &self.meshes {
                mesh.draw(&mut render_pass);
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Canvas サイズ変更
    pub fn resize(&mut self, size: SurfaceSize) {
        if size.validate().is_err() || size == self.ctx.size {
            return;
        }
        self.ctx.resize(size);
        self.depth_view = depth::create_texture(&self.ctx.device, size.width, size.height, self.sample_count);
        self.msaa_view = depth::create_msaa_target(
            &self.ctx.device,
            self.ctx.config.format,
            size.width,
            size.height,
            self.sample_count,
        );
        log::debug!("Renderer resized to {}", size);
    }

    /// シーンのジオメトリが変わっていればバッファを作り直す
    fn sync_meshes(&mut self, scene: &Scene) {
        if self.uploaded_revision == Some(scene.revision()) {
            return;
        }
        self.meshes = scene
            .drawables()
            .map(|m| self.scene_pipeline.upload_mesh(&self.ctx, m))
            .collect();
        self.uploaded_revision = Some(scene.revision());
    }

    /// 背景色（サーフェスがsRGBでなければエンコード済みの値）
    fn clear_color(&self, scene: &Scene) -> wgpu::Color {
        let mut color = scene.backdrop.color;
        if self.ctx.needs_srgb_encode() {
            color = srgb_encode(color);
        }
        wgpu::Color {
            r: color.x as f64,
            g: color.y as f64,
            b: color.z as f64,
            a: 1.0,
        }
    }
}

/// リニア→sRGB
fn srgb_encode(linear: Vec3) -> Vec3 {
    let encode = |c: f32| {
        let c = c.clamp(0.0, 1.0);
        if c <= 0.003_130_8 {
            c * 12.92
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    };
    Vec3::new(encode(linear.x), encode(linear.y), encode(linear.z))
}
