//! シェーダーモジュール
//!
//! WGSLシェーダーを外部ファイルから読み込む

/// メインシェーダー（メッシュ描画用）
pub const MAIN_SHADER: &str = include_str!("main.wgsl");

/// 影マップシェーダー（深度のみ）
pub const SHADOW_SHADER: &str = include_str!("shadow.wgsl");
