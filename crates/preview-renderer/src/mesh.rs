use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

use preview_core::DecodedMesh;

/// 頂点構造体
/// 位置、法線、色を含む
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    /// 新しい頂点を作成
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, normal, color }
    }

    const ATTRIBUTES: [VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x3 // color
    ];

    /// 頂点バッファレイアウト
    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// GPUに送る三角形リスト
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// デコード済みメッシュから描画用メッシュを作成
    /// 三角形ごとに頂点を持つフラットシェーディング
    pub fn from_decoded(decoded: &DecodedMesh, color: Vec3) -> Self {
        let color = color.to_array();
        let mut vertices = Vec::with_capacity(decoded.vertex_count());

        for triangle in decoded.triangles() {
            let normal = triangle.shading_normal().to_array();
            vertices.extend(
                triangle
                    .vertices
                    .iter()
                    .map(|v| Vertex::new(v.to_array(), normal, color)),
            );
        }

        let indices = (0..vertices.len() as u32).collect();
        Self { vertices, indices }
    }

    /// XZ平面上の正方形（上向き法線、原点中心、一辺 `size`）
    pub fn ground_plane(size: f32, color: Vec3) -> Self {
        let h = size * 0.5;
        let normal = [0.0, 1.0, 0.0];
        let color = color.to_array();

        let vertices = vec![
            Vertex::new([-h, 0.0, -h], normal, color),
            Vertex::new([-h, 0.0, h], normal, color),
            Vertex::new([h, 0.0, h], normal, color),
            Vertex::new([h, 0.0, -h], normal, color),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];

        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preview_core::Triangle;

    #[test]
    fn test_layout_matches_vertex() {
        let layout = Vertex::desc();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_from_decoded() {
        let decoded = DecodedMesh::new(vec![
            Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y),
            Triangle::with_normal(Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::NEG_Z),
        ]);
        let mesh = Mesh::from_decoded(&decoded, Vec3::new(0.0, 0.5, 1.0));

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[3].normal, [0.0, 0.0, -1.0]);
        assert_eq!(mesh.vertices[5].color, [0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_ground_plane() {
        let plane = Mesh::ground_plane(4.0, Vec3::ONE);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.index_count(), 6);
        assert!(plane.vertices.iter().all(|v| v.position[1] == 0.0 && v.normal == [0.0, 1.0, 0.0]));
        assert_eq!(plane.vertices[2].position, [2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::default();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.index_count(), 0);
    }
}
