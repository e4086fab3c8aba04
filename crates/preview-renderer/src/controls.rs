//! オービットコントロールモジュール
//!
//! 注視点周りの回転・注視点の平行移動・ドリーを減衰付きで適用する

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::camera::Camera;

/// 1ホイールステップあたりのドリー倍率
const ZOOM_STEP: f32 = 0.95;
/// これ未満の残り移動量は停止とみなす
const SETTLE_EPSILON: f32 = 1e-5;

/// オービットコントロール
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    /// 回転・ズームの中心
    pub target: Vec3,
    pub enable_damping: bool,
    /// 1フレームで適用する残り移動量の割合
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// 極角の範囲（真上・真下で反転しないよう端を除く）
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    // 未適用の操作量
    spherical_delta: Vec2,
    pan_offset: Vec3,
    zoom_scale: f32,
}

impl OrbitControls {
    /// デフォルト値で作成
    pub fn new() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.2,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.01,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.001,
            max_polar_angle: PI - 0.001,
            spherical_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            zoom_scale: 1.0,
        }
    }

    /// 減衰係数を指定して作成
    pub fn with_damping(damping_factor: f32) -> Self {
        Self {
            damping_factor,
            ..Self::new()
        }
    }

    /// 画面上のドラッグ量（ピクセル）で注視点周りに回転
    /// 画面の高さ分のドラッグで1周
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.spherical_delta.x -= TAU * delta.x / height * self.rotate_speed;
        self.spherical_delta.y -= TAU * delta.y / height * self.rotate_speed;
    }

    /// 画面上のドラッグ量（ピクセル）で注視点を平行移動（スクリーン空間）
    pub fn pan(&mut self, delta: Vec2, camera: &Camera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        // 注視点の距離で画面1ピクセルに相当するワールド長
        let world_per_pixel = 2.0 * camera.distance() * (camera.fov() * 0.5).tan() / height;

        let right = camera.right();
        let up = right.cross(camera.forward()).normalize_or_zero();
        self.pan_offset += (-right * delta.x + up * delta.y) * world_per_pixel * self.pan_speed;
    }

    /// ホイール量でドリー（正で遠ざかる）
    pub fn zoom(&mut self, wheel_delta: f32) {
        let step = ZOOM_STEP.powf(self.zoom_speed);
        if wheel_delta > 0.0 {
            self.zoom_scale /= step;
        } else if wheel_delta < 0.0 {
            self.zoom_scale *= step;
        }
    }

    /// 注視点を設定
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// 未適用の操作量を破棄
    pub fn reset_motion(&mut self) {
        self.spherical_delta = Vec2::ZERO;
        self.pan_offset = Vec3::ZERO;
        self.zoom_scale = 1.0;
    }

    /// 未適用の操作量がないか
    pub fn is_settled(&self) -> bool {
        self.spherical_delta.length() < SETTLE_EPSILON
            && self.pan_offset.length() < SETTLE_EPSILON
            && (self.zoom_scale - 1.0).abs() < SETTLE_EPSILON
    }

    /// 操作量をカメラに適用（毎フレーム呼び出す）
    /// カメラを動かした場合 true
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.is_settled() {
            self.reset_motion();
            return false;
        }

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        // 注視点からのオフセットを球座標に変換
        let offset = camera.position - self.target;
        let radius = offset.length().max(self.min_distance);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.spherical_delta.x * factor;
        phi += self.spherical_delta.y * factor;
        phi = phi.clamp(self.min_polar_angle, self.max_polar_angle);

        let radius = (radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + new_offset;
        camera.target = self.target;

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.zoom_scale = 1.0;

        true
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}
