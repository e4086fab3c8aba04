//! GPU用Uniform構造体
//!
//! WGSL側の構造体と同じレイアウト（16バイト境界）を保つ

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// フレーム単位のUniform（カメラ・ライト・フォグ）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz: カメラ位置
    pub camera_position: [f32; 4],
    /// xyz: 光源へ向かう単位ベクトル, w: 強度
    pub light_direction: [f32; 4],
    /// rgb: 光源色
    pub light_color: [f32; 4],
    /// rgb: 環境光色, w: 強度
    pub ambient: [f32; 4],
    /// rgb: フォグ色
    pub fog_color: [f32; 4],
    /// x: near, y: far, z: 有効(1)/無効(0), w: 注視点までの距離
    /// フォグは注視点より奥の距離にかかる
    pub fog_range: [f32; 4],
    /// x: トーンマッピング, y: 影, z: sRGBエンコード
    pub flags: [u32; 4],
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0; 4],
            light_direction: [0.0, 1.0, 0.0, 1.0],
            light_color: [1.0; 4],
            ambient: [1.0, 1.0, 1.0, 0.8],
            fog_color: [1.0; 4],
            fog_range: [0.0; 4],
            flags: [0; 4],
        }
    }
}

impl FrameUniform {
    /// サーフェスがsRGB形式でない場合、シェーダー側でガンマ補正する
    pub fn with_srgb_encode(mut self, encode: bool) -> Self {
        self.flags[2] = encode as u32;
        self
    }
}

/// メッシュ単位のUniform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// 法線変換用（モデル行列の逆転置）
    pub normal_matrix: [[f32; 4]; 4],
    /// x: 影を受ける(1)/受けない(0)
    pub shadow: [u32; 4],
}

impl ModelUniform {
    /// 単位行列で初期化
    pub fn identity() -> Self {
        Self::from_matrix(Mat4::IDENTITY, true)
    }

    /// モデル行列から作成
    pub fn from_matrix(model: Mat4, receive_shadow: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            shadow: [receive_shadow as u32, 0, 0, 0],
        }
    }
}

/// 色ベクトルをvec4に詰める
pub(crate) fn rgb_w(rgb: Vec3, w: f32) -> [f32; 4] {
    [rgb.x, rgb.y, rgb.z, w]
}
