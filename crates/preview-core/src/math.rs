//! 数学型モジュール
//!
//! glamの型をクレート全体で共通に使うための再エクスポート

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
