//! プレビュー状態
//!
//! 1セッション分のシーン・カメラ・コントロール・入力をまとめる。
//! GPUには依存しないため、ブラウザ外でもテストできる

use glam::Vec2;
use thiserror::Error;

use preview_core::{decode, DecodeError, DecodedMesh, FileFormat, SurfaceError, SurfaceSize};

use crate::camera::Camera;
use crate::controls::OrbitControls;
use crate::framing;
use crate::gestures::{Gesture, GestureMap, Interaction, PointerButton};
use crate::options::{OptionsError, PreviewConfig};
use crate::scene::Scene;
use crate::uniforms::FrameUniform;

/// プレビュー構築エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// 1セッション分のプレビュー状態
#[derive(Debug, Clone)]
pub struct PreviewState {
    config: PreviewConfig,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    interaction: Interaction,
    surface: SurfaceSize,
}

impl PreviewState {
    /// 設定と表示領域サイズから作成（メッシュなし）
    pub fn new(config: &PreviewConfig, surface: SurfaceSize) -> Result<Self, PreviewError> {
        config.validate()?;
        let surface = surface.validate()?;

        let options = &config.scene;
        let camera = Camera::with_fov_degrees(surface.aspect(), options.fov_degrees).map_err(OptionsError::from)?;
        let mut controls = OrbitControls::with_damping(options.damping_factor);
        controls.set_target(camera.target);

        Ok(Self {
            config: config.clone(),
            scene: Scene::compose(options),
            camera,
            controls,
            interaction: Interaction::new(GestureMap::for_options(options.object_rotation)),
            surface,
        })
    }

    /// バイト列をデコードしてシーンに追加し、カメラを合わせる
    /// 失敗時はシーンを変更しない
    pub fn load(&mut self, name: &str, format: FileFormat, bytes: &[u8]) -> Result<f32, DecodeError> {
        let decoded = decode(format, bytes).inspect_err(|e| {
            log::warn!("Failed to decode {}: {}", name, e);
        })?;
        self.insert_mesh(name, &decoded).ok_or(DecodeError::Empty)
    }

    /// デコード済みメッシュを追加してフレーミング
    /// 追加できればフレーミング距離を返す
    pub fn insert_mesh(&mut self, name: &str, decoded: &DecodedMesh) -> Option<f32> {
        self.scene.add_mesh(name, decoded)?;
        log::info!("Loaded {} ({} triangles)", name, decoded.triangle_count());
        self.reset_view()
    }

    /// カメラを現在のメッシュ全体に合わせ直す
    pub fn reset_view(&mut self) -> Option<f32> {
        let bounds = self.scene.world_bounds()?;
        Some(framing::frame(
            &bounds,
            &mut self.camera,
            &mut self.controls,
            &self.config.framing,
        ))
    }

    /// 1フレーム進める。カメラが動いた場合 true
    pub fn tick(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    /// 表示領域のサイズ変更（サイズ0はエラー、状態は変わらない）
    pub fn resize(&mut self, size: SurfaceSize) -> Result<(), SurfaceError> {
        self.surface = size.validate()?;
        self.camera.set_aspect(size.aspect());
        Ok(())
    }

    pub fn pointer_down(&mut self, button: PointerButton, shift: bool, position: Vec2) -> Option<Gesture> {
        self.interaction.pointer_down(button, shift, position)
    }

    /// ドラッグ量をジェスチャーに応じてコントロールかメッシュに渡す
    pub fn pointer_move(&mut self, position: Vec2) -> Option<Gesture> {
        let (gesture, delta) = self.interaction.pointer_move(position)?;
        let height = self.surface.height as f32;

        match gesture {
            Gesture::Orbit => self.controls.rotate(delta, height),
            Gesture::Pan => self.controls.pan(delta, &self.camera, height),
            Gesture::Zoom => self.controls.zoom(delta.y),
            Gesture::RotateObject => self.scene.rotate_models(delta),
        }
        Some(gesture)
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    /// ホイール入力（正で遠ざかる）
    pub fn wheel(&mut self, delta_y: f32) {
        if self.interaction.wheel_zoom() {
            self.controls.zoom(delta_y);
        }
    }

    /// メッシュを破棄して入力状態を戻す
    pub fn release(&mut self) {
        self.scene.clear();
        self.interaction.pointer_up();
        self.controls.reset_motion();
    }

    /// 現在の状態からフレームUniformを作成
    pub fn frame_uniform(&self) -> FrameUniform {
        self.scene.frame_uniform(&self.camera)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }
}
