use std::f32::consts::PI;

use glam::{Mat4, Vec3};
use thiserror::Error;

/// カメラ設定エラー
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraError {
    /// 垂直画角は 0 と π の間（両端を含まない）でなければならない
    #[error("vertical field of view must lie strictly between 0 and π radians, got {0}")]
    InvalidFov(f32),
}

/// 画角が (0, π) の範囲内かを検証
pub fn validate_fov(fov: f32) -> Result<f32, CameraError> {
    if fov.is_finite() && fov > 0.0 && fov < PI {
        Ok(fov)
    } else {
        Err(CameraError::InvalidFov(fov))
    }
}

/// 3Dカメラ
/// 位置、注視点、上方向ベクトルを持つ透視投影カメラ
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// 既定の位置
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(7.0, 7.0, 7.0);
    /// 既定の遠クリップ面
    pub const DEFAULT_FAR: f32 = 1000.0;

    /// デフォルト値で新しいカメラを作成（画角45度）
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Self::DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: Self::DEFAULT_FAR,
        }
    }

    /// 画角（度）を指定して作成
    pub fn with_fov_degrees(aspect: f32, degrees: f32) -> Result<Self, CameraError> {
        let mut camera = Self::new(aspect);
        camera.set_fov(degrees.to_radians())?;
        Ok(camera)
    }

    /// View行列を構築
    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// 投影行列を構築
    pub fn build_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// View-Projection行列を構築
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.build_projection_matrix() * self.build_view_matrix()
    }

    /// 垂直画角（ラジアン）を取得
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// 垂直画角（ラジアン）を設定
    pub fn set_fov(&mut self, fov: f32) -> Result<(), CameraError> {
        self.fov = validate_fov(fov)?;
        Ok(())
    }

    /// カメラ位置を設定
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// カメラの注視点を設定
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// アスペクト比を設定
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// 視線方向（単位ベクトル）
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// 画面右方向（単位ベクトル）
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// 注視点までの距離
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}
