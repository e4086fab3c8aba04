//! プレビュー設定モジュール
//!
//! シーン構成・自動フレーミングの設定。JSからはキャメルケースのオブジェクトで渡す。
//! 省略した項目は既定値になる

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{validate_fov, CameraError};

/// トーンマッピング方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMapping {
    /// ACES Filmic
    #[default]
    Realistic,
    Linear,
}

impl ToneMapping {
    /// シェーダーに渡す値
    pub fn shader_id(&self) -> u32 {
        match self {
            ToneMapping::Realistic => 1,
            ToneMapping::Linear => 0,
        }
    }
}

/// 設定エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("fog range must satisfy 0 <= near < far, got ({near}, {far})")]
    FogRange { near: f32, far: f32 },
    #[error("{name} must be a finite non-negative value, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("damping factor must lie in (0, 1], got {0}")]
    DampingFactor(f32),
    #[error("minimum framing distance must be positive, got {0}")]
    MinDistance(f32),
}

/// シーン構成の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneOptions {
    /// マルチサンプルアンチエイリアス
    pub antialias: bool,
    pub shadows_enabled: bool,
    pub tone_mapping: ToneMapping,
    /// 背景色（リニアRGB）
    pub background_color: [f32; 3],
    /// 線形フォグの開始・終了距離
    pub fog_range: (f32, f32),
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    /// 平行光源の位置（原点方向を照らす）
    pub light_position: [f32; 3],
    /// 接地面を表示するか
    pub ground_plane: bool,
    /// メッシュの色（リニアRGB、1を超える値はトーンマッピングで圧縮）
    pub mesh_color: [f32; 3],
    /// 垂直画角（度）
    pub fov_degrees: f32,
    /// 左ドラッグでメッシュ自体を回転させるか
    pub object_rotation: bool,
    pub damping_factor: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            shadows_enabled: true,
            tone_mapping: ToneMapping::Realistic,
            // #f0f0f0
            background_color: [0.871, 0.871, 0.871],
            fog_range: (10.0, 50.0),
            ambient_intensity: 0.8,
            directional_intensity: 1.0,
            light_position: [10.0, 10.0, 10.0],
            ground_plane: false,
            // #0077ff を2.5倍に明るくした色
            mesh_color: [0.0, 0.461, 2.5],
            fov_degrees: 45.0,
            object_rotation: false,
            damping_factor: 0.2,
        }
    }
}

impl SceneOptions {
    /// 値の範囲を検証
    pub fn validate(&self) -> Result<(), OptionsError> {
        validate_fov(self.fov_degrees.to_radians())?;

        let (near, far) = self.fog_range;
        if !(near.is_finite() && far.is_finite() && near >= 0.0 && near < far) {
            return Err(OptionsError::FogRange { near, far });
        }

        non_negative("ambientIntensity", self.ambient_intensity)?;
        non_negative("directionalIntensity", self.directional_intensity)?;
        for value in self.background_color {
            non_negative("backgroundColor", value)?;
        }
        for value in self.mesh_color {
            non_negative("meshColor", value)?;
        }

        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(OptionsError::DampingFactor(self.damping_factor));
        }

        Ok(())
    }

    /// MSAAのサンプル数
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }

    pub fn background(&self) -> Vec3 {
        Vec3::from_array(self.background_color)
    }

    pub fn mesh_color(&self) -> Vec3 {
        Vec3::from_array(self.mesh_color)
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), OptionsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(OptionsError::Negative { name, value })
    }
}

/// フレーミング時にカメラを置く方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FramingAxis {
    /// 中心から +Z 方向
    #[default]
    PosZ,
    PosX,
    PosY,
    /// (1, 1, 1) 方向
    Diagonal,
}

impl FramingAxis {
    /// 中心からカメラへの単位ベクトル
    pub fn direction(&self) -> Vec3 {
        match self {
            FramingAxis::PosZ => Vec3::Z,
            FramingAxis::PosX => Vec3::X,
            FramingAxis::PosY => Vec3::Y,
            FramingAxis::Diagonal => Vec3::ONE.normalize(),
        }
    }
}

/// 自動フレーミングの設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FramingOptions {
    pub axis: FramingAxis,
    /// 大きさゼロのメッシュに対する最小距離
    pub min_distance: f32,
}

impl Default for FramingOptions {
    fn default() -> Self {
        Self {
            axis: FramingAxis::PosZ,
            min_distance: 1.0,
        }
    }
}

impl FramingOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.min_distance.is_finite() && self.min_distance > 0.0 {
            Ok(())
        } else {
            Err(OptionsError::MinDistance(self.min_distance))
        }
    }
}

/// プレビュー全体の設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewConfig {
    pub scene: SceneOptions,
    pub framing: FramingOptions,
}

impl PreviewConfig {
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.scene.validate()?;
        self.framing.validate()
    }
}
