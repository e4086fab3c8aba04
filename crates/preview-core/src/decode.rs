//! メッシュデコーダーモジュール
//!
//! ファイルのバイト列を三角形メッシュに変換する。
//! STL（バイナリ/ASCII）は stl_io、OBJ は tobj を使用

use std::io::Cursor;

use ahash::AHashMap;
use thiserror::Error;

use crate::math::Vec3;
use crate::mesh::{DecodedMesh, Triangle};
use crate::source::FileFormat;

/// デコードエラー
/// プレビューでは致命的ではなく、空のシーンのまま続行する
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {format} data: {reason}")]
    Malformed { format: FileFormat, reason: String },
    #[error("{0} files cannot be previewed as meshes")]
    Unsupported(FileFormat),
    #[error("mesh contains no triangles")]
    Empty,
}

impl DecodeError {
    fn malformed(format: FileFormat, reason: impl ToString) -> Self {
        DecodeError::Malformed {
            format,
            reason: reason.to_string(),
        }
    }
}

/// 形式に応じてバイト列をデコード
pub fn decode(format: FileFormat, bytes: &[u8]) -> Result<DecodedMesh, DecodeError> {
    let triangles = match format {
        FileFormat::Stl => decode_stl(bytes)?,
        FileFormat::Obj => decode_obj(bytes)?,
        FileFormat::Png | FileFormat::Jpg => return Err(DecodeError::Unsupported(format)),
    };

    if triangles.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Some(index) = triangles.iter().position(|t| !t.is_finite()) {
        return Err(DecodeError::malformed(
            format,
            format!("triangle {} has non-finite coordinates", index),
        ));
    }

    log::debug!("Decoded {} mesh: {} triangles", format, triangles.len());
    Ok(DecodedMesh::new(triangles))
}

/// STLをデコード（ASCII/バイナリは stl_io が判別）
fn decode_stl(bytes: &[u8]) -> Result<Vec<Triangle>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let reader = stl_io::create_stl_reader(&mut cursor)
        .map_err(|e| DecodeError::malformed(FileFormat::Stl, e))?;

    let mut triangles = Vec::new();
    for tri in reader {
        let tri = tri.map_err(|e| DecodeError::malformed(FileFormat::Stl, e))?;
        let [a, b, c] = &tri.vertices;
        triangles.push(Triangle::with_normal(
            Vec3::new(a[0], a[1], a[2]),
            Vec3::new(b[0], b[1], b[2]),
            Vec3::new(c[0], c[1], c[2]),
            Vec3::new(tri.normal[0], tri.normal[1], tri.normal[2]),
        ));
    }

    Ok(triangles)
}

/// OBJをデコード（マテリアルは無視、多角形は三角形化）
fn decode_obj(bytes: &[u8]) -> Result<Vec<Triangle>, DecodeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::malformed(FileFormat::Obj, e))?;

    let (models, _materials) = tobj::load_obj_buf(
        &mut Cursor::new(text),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok((Vec::new(), AHashMap::new())),
    )
    .map_err(|e| DecodeError::malformed(FileFormat::Obj, e))?;

    let mut triangles = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let position = |index: u32| read_vec3(&mesh.positions, index);
        let normal = |index: u32| read_vec3(&mesh.normals, index);

        for face in mesh.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (position(face[0]), position(face[1]), position(face[2])) else {
                return Err(DecodeError::malformed(
                    FileFormat::Obj,
                    format!("face index out of range in object `{}`", model.name),
                ));
            };

            // 頂点法線があれば平均を面法線とする
            let averaged = match (normal(face[0]), normal(face[1]), normal(face[2])) {
                (Some(na), Some(nb), Some(nc)) => Some(na + nb + nc),
                _ => None,
            };

            triangles.push(Triangle {
                vertices: [a, b, c],
                normal: averaged,
            });
        }
    }

    Ok(triangles)
}

fn read_vec3(values: &[f32], index: u32) -> Option<Vec3> {
    let start = index as usize * 3;
    values
        .get(start..start + 3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::math::Vec3;

    /// テスト用のバイナリSTLを生成
    pub(crate) fn binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
        let mut out = Vec::with_capacity(84 + triangles.len() * 50);
        out.extend_from_slice(&[0u8; 80]);
        out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            for v in std::iter::once(normal).chain(tri.iter().copied()) {
                out.extend_from_slice(&v.x.to_le_bytes());
                out.extend_from_slice(&v.y.to_le_bytes());
                out.extend_from_slice(&v.z.to_le_bytes());
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    /// 原点中心、一辺 `size` のキューブ（12三角形）
    pub(crate) fn cube_triangles(size: f32) -> Vec<[Vec3; 3]> {
        let h = size * 0.5;
        let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h, y * h, z * h);
        let quads = [
            // +X / -X
            [corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0), corner(1.0, -1.0, 1.0)],
            [corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0), corner(-1.0, -1.0, -1.0)],
            // +Y / -Y
            [corner(-1.0, 1.0, -1.0), corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0)],
            [corner(-1.0, -1.0, 1.0), corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0)],
            // +Z / -Z
            [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
            [corner(1.0, -1.0, -1.0), corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0)],
        ];
        quads
            .iter()
            .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
            .collect()
    }

    #[test]
    fn test_decode_binary_cube() {
        let bytes = binary_stl(&cube_triangles(2.0));
        let mesh = decode(FileFormat::Stl, &bytes).unwrap();

        assert_eq!(mesh.triangle_count(), 12);
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }

    #[test]
    fn test_decode_binary_keeps_normals() {
        let bytes = binary_stl(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]);
        let mesh = decode(FileFormat::Stl, &bytes).unwrap();
        assert_eq!(mesh.triangles()[0].normal, Some(Vec3::Z));
    }

    #[test]
    fn test_decode_ascii_stl() {
        let text = "solid tri\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid tri\n";
        let mesh = decode(FileFormat::Stl, text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangles()[0].vertices[1], Vec3::X);
    }

    #[test]
    fn test_truncated_stl_is_error() {
        let mut bytes = binary_stl(&cube_triangles(2.0));
        bytes.truncate(84 + 50 * 3 + 7);
        assert!(matches!(
            decode(FileFormat::Stl, &bytes),
            Err(DecodeError::Malformed { format: FileFormat::Stl, .. })
        ));
    }

    #[test]
    fn test_tiny_buffer_is_error() {
        assert!(decode(FileFormat::Stl, &[1, 2, 3]).is_err());
        assert!(decode(FileFormat::Stl, &[]).is_err());
    }

    #[test]
    fn test_zero_triangle_stl_is_empty() {
        let bytes = binary_stl(&[]);
        assert!(matches!(decode(FileFormat::Stl, &bytes), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_non_finite_vertex_is_error() {
        let bytes = binary_stl(&[[Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::Y]]);
        assert!(matches!(
            decode(FileFormat::Stl, &bytes),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_obj_quad_is_triangulated() {
        let text = "o plate\n\
            v 0 0 0\n\
            v 2 0 0\n\
            v 2 2 0\n\
            v 0 2 0\n\
            f 1 2 3 4\n";
        let mesh = decode(FileFormat::Obj, text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(mesh.triangles()[0].normal, None);
    }

    #[test]
    fn test_obj_invalid_utf8_is_error() {
        assert!(matches!(
            decode(FileFormat::Obj, &[0xff, 0xfe, 0x00]),
            Err(DecodeError::Malformed { format: FileFormat::Obj, .. })
        ));
    }

    #[test]
    fn test_images_are_unsupported() {
        assert!(matches!(
            decode(FileFormat::Png, &[0x89, b'P', b'N', b'G']),
            Err(DecodeError::Unsupported(FileFormat::Png))
        ));
        assert!(matches!(
            decode(FileFormat::Jpg, &[]),
            Err(DecodeError::Unsupported(FileFormat::Jpg))
        ));
    }
}
