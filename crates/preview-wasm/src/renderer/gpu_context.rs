//! GPUコンテキストモジュール
//!
//! Device, Queue, Surfaceを管理

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use preview_core::SurfaceSize;

use crate::utils::console_log;

/// GPUコンテキスト
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceSize,
}

impl GpuContext {
    /// 新しいGPUコンテキストを作成（非同期）
    /// WebGPUが使えなければWebGL2で動かす
    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables, unreachable_code))]
    pub async fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let size = SurfaceSize::new(canvas.width(), canvas.height())
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        console_log!("Initializing GPU for {} canvas", size);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        // Surface 作成（wasm32ターゲット用）
        #[cfg(target_arch = "wasm32")]
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("Failed to create surface: {:?}", e)))?;

        #[cfg(not(target_arch = "wasm32"))]
        let surface: wgpu::Surface<'static> = {
            return Err(JsValue::from_str("canvas surfaces require the wasm32 target"));
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to find suitable adapter: {:?}", e)))?;

        log::debug!("Adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Preview Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to create device: {:?}", e)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(JsValue::from_str("Surface reports no supported formats"));
        };

        // sRGB形式を優先（なければシェーダーでエンコード）
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(first_format);

        // alpha_modeを選択（Opaqueを優先）
        let alpha_mode = if surface_caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!("GPU ready ({:?}, {:?})", adapter.get_info().backend, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    /// リサイズ（サイズ0は無視）
    pub fn resize(&mut self, size: SurfaceSize) {
        if size.validate().is_ok() {
            self.size = size;
            self.config.width = size.width;
            self.config.height = size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// サーフェスがsRGBでない場合はシェーダーでガンマ補正する
    pub fn needs_srgb_encode(&self) -> bool {
        !self.config.format.is_srgb()
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }
}
