//! デコード済みメッシュモジュール
//!
//! 三角形の列としてのメッシュ。1つのプレビューセッションが所有する

use crate::bounds::BoundingVolume;
use crate::math::Vec3;

/// 三角形
/// 3頂点と、ファイルに記録されていれば面法線を持つ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub normal: Option<Vec3>,
}

impl Triangle {
    /// 法線なしの三角形を作成
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
            normal: None,
        }
    }

    /// 法線付きの三角形を作成
    pub fn with_normal(a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
            normal: Some(normal),
        }
    }

    /// 頂点の巻き順（右手系）から求めた面法線
    /// 面積ゼロの三角形ではゼロベクトル
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// 描画に使う法線
    /// 記録された法線が使えない（ゼロ・非有限）場合は巻き順から計算
    pub fn shading_normal(&self) -> Vec3 {
        self.normal
            .map(Vec3::normalize_or_zero)
            .filter(|n| *n != Vec3::ZERO)
            .unwrap_or_else(|| self.face_normal())
    }

    /// 全頂点座標が有限か
    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(|v| v.is_finite())
    }
}

/// デコード済みメッシュ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedMesh {
    triangles: Vec<Triangle>,
}

impl DecodedMesh {
    /// 三角形列からメッシュを作成
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// 三角形数を取得
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// 頂点数を取得（三角形ごとに3頂点）
    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// 全頂点を順に列挙
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.triangles.iter().flat_map(|t| t.vertices)
    }

    /// ローカル座標での境界ボックス
    pub fn bounds(&self) -> Option<BoundingVolume> {
        BoundingVolume::from_points(self.positions())
    }
}
