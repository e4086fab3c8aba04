//! シーン構成モジュール
//!
//! 背景・フォグ・環境光・影を落とす平行光源・接地面とメッシュを保持する。
//! GPUリソースは持たず、描画側が `revision` を見てバッファを作り直す

use glam::{Mat4, Vec2, Vec3};

use preview_core::{BoundingVolume, DecodedMesh, Transform};

use crate::camera::Camera;
use crate::mesh::Mesh;
use crate::options::{SceneOptions, ToneMapping};
use crate::uniforms::{rgb_w, FrameUniform, ModelUniform};

/// 接地面の色（リニアRGB）
const GROUND_COLOR: Vec3 = Vec3::new(0.55, 0.55, 0.55);
/// メッシュがない時の接地面の一辺
const DEFAULT_GROUND_SIZE: f32 = 10.0;

/// 線形フォグ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    /// 注視点より奥へこの距離からかかり始める
    pub near: f32,
    /// この距離で完全にフォグ色になる
    pub far: f32,
}

/// 背景
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    pub color: Vec3,
    pub fog: Fog,
}

/// 環境光
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// 平行光源
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// 照らされる面から光源へ向かう単位ベクトル
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }
}

/// シーン内での役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    Model,
    Ground,
}

/// シーンに配置されたメッシュ
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub role: MeshRole,
    pub mesh: Mesh,
    /// ローカル座標での境界ボックス
    pub local_bounds: BoundingVolume,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneMesh {
    /// 回転はローカル境界の中心を軸に行う
    pub fn world_matrix(&self) -> Mat4 {
        let pivot = self.local_bounds.center();
        Mat4::from_translation(pivot) * self.transform.to_matrix() * Mat4::from_translation(-pivot)
    }

    /// ワールド座標での境界ボックス（ローカル境界の8頂点を変換）
    pub fn world_bounds(&self) -> BoundingVolume {
        let matrix = self.world_matrix();
        let BoundingVolume { min, max } = self.local_bounds;
        let corner = |i: usize| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        };
        let first = matrix.transform_point3(corner(0));
        (1..8).fold(BoundingVolume::new(first, first), |mut bounds, i| {
            bounds.expand(matrix.transform_point3(corner(i)));
            bounds
        })
    }

    pub fn model_uniform(&self) -> ModelUniform {
        ModelUniform::from_matrix(self.world_matrix(), self.receive_shadow)
    }
}

/// プレビュー用シーン
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub backdrop: Backdrop,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub tone_mapping: ToneMapping,
    pub shadows_enabled: bool,
    mesh_color: Vec3,
    ground: Option<SceneMesh>,
    models: Vec<SceneMesh>,
    /// ジオメトリ変更のたびに増える番号
    revision: u64,
}

impl Scene {
    /// 設定からシーンを構成（メッシュなし）
    pub fn compose(options: &SceneOptions) -> Self {
        let background = options.background();
        let (fog_near, fog_far) = options.fog_range;

        let ground = options.ground_plane.then(|| SceneMesh {
            name: "ground".to_string(),
            role: MeshRole::Ground,
            mesh: Mesh::ground_plane(1.0, GROUND_COLOR),
            local_bounds: BoundingVolume::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.0, 0.5)),
            transform: Transform::from_scale(Vec3::new(DEFAULT_GROUND_SIZE, 1.0, DEFAULT_GROUND_SIZE)),
            cast_shadow: false,
            receive_shadow: true,
        });

        Self {
            backdrop: Backdrop {
                color: background,
                fog: Fog {
                    color: background,
                    near: fog_near,
                    far: fog_far,
                },
            },
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: options.ambient_intensity,
            },
            directional: DirectionalLight {
                color: Vec3::ONE,
                intensity: options.directional_intensity,
                position: Vec3::from_array(options.light_position),
                target: Vec3::ZERO,
                cast_shadow: true,
            },
            tone_mapping: options.tone_mapping,
            shadows_enabled: options.shadows_enabled,
            mesh_color: options.mesh_color(),
            ground,
            models: Vec::new(),
            revision: 0,
        }
    }

    /// デコード済みメッシュをシーンに追加（影の投影・受影を有効化）
    /// 三角形がなければ何もせず None
    pub fn add_mesh(&mut self, name: impl Into<String>, decoded: &DecodedMesh) -> Option<usize> {
        let local_bounds = decoded.bounds()?;
        self.models.push(SceneMesh {
            name: name.into(),
            role: MeshRole::Model,
            mesh: Mesh::from_decoded(decoded, self.mesh_color),
            local_bounds,
            transform: Transform::identity(),
            cast_shadow: true,
            receive_shadow: true,
        });
        self.fit_ground();
        self.revision += 1;
        Some(self.models.len() - 1)
    }

    /// 全モデルをドラッグ量に応じて回転
    pub fn rotate_models(&mut self, delta: Vec2) {
        for model in &mut self.models {
            model.transform.rotate_by_drag(delta.x, delta.y);
        }
    }

    /// 配置済みモデル
    pub fn models(&self) -> &[SceneMesh] {
        &self.models
    }

    /// モデル数（接地面は含まない）
    pub fn mesh_count(&self) -> usize {
        self.models.len()
    }

    pub fn ground(&self) -> Option<&SceneMesh> {
        self.ground.as_ref()
    }

    /// 描画対象（接地面→モデルの順）
    pub fn drawables(&self) -> impl Iterator<Item = &SceneMesh> {
        self.ground.iter().chain(self.models.iter())
    }

    /// 全モデルのワールド境界
    pub fn world_bounds(&self) -> Option<BoundingVolume> {
        union(self.models.iter().map(SceneMesh::world_bounds))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 全メッシュを取り除く（背景・ライトは残る）
    pub fn clear(&mut self) {
        self.models.clear();
        self.ground = None;
        self.revision += 1;
    }

    /// 影マップ用のライト視点View-Projection行列
    /// 接地面とモデル全体を包む正射影
    pub fn light_view_projection(&self) -> Mat4 {
        let bounds = union(self.drawables().map(SceneMesh::world_bounds))
            .unwrap_or_else(|| BoundingVolume::from_center_extent(Vec3::ZERO, Vec3::ONE));

        let center = bounds.center();
        let radius = (bounds.extent().length() * 0.5).max(0.5);
        let direction = self.directional.direction();
        let up = if direction.abs_diff_eq(Vec3::Y, 1e-3) || direction.abs_diff_eq(Vec3::NEG_Y, 1e-3) {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let eye = center + direction * radius * 2.0;
        let view = Mat4::look_at_rh(eye, center, up);
        let proj = Mat4::orthographic_rh(-radius, radius, -radius, radius, radius * 0.1, radius * 4.0);
        proj * view
    }

    /// フレーム単位のUniformを作成
    pub fn frame_uniform(&self, camera: &Camera) -> FrameUniform {
        let light = &self.directional;
        let fog = &self.backdrop.fog;
        let shadows = self.shadows_enabled && light.cast_shadow;

        FrameUniform {
            view_proj: camera.build_view_projection_matrix().to_cols_array_2d(),
            light_view_proj: self.light_view_projection().to_cols_array_2d(),
            camera_position: rgb_w(camera.position, 1.0),
            light_direction: rgb_w(light.direction(), light.intensity),
            light_color: rgb_w(light.color, 1.0),
            ambient: rgb_w(self.ambient.color, self.ambient.intensity),
            fog_color: rgb_w(fog.color, 1.0),
            fog_range: [fog.near, fog.far, 1.0, camera.distance()],
            flags: [self.tone_mapping.shader_id(), shadows as u32, 0, 0],
        }
    }

    /// 接地面をモデルの真下に、モデルより十分大きく配置
    fn fit_ground(&mut self) {
        let Some(bounds) = self.world_bounds() else {
            return;
        };
        if let Some(ground) = self.ground.as_mut() {
            let center = bounds.center();
            let size = (bounds.max_extent() * 4.0).max(1.0);
            ground.transform.position = Vec3::new(center.x, bounds.min.y, center.z);
            ground.transform.scale = Vec3::new(size, 1.0, size);
        }
    }
}

fn union(mut volumes: impl Iterator<Item = BoundingVolume>) -> Option<BoundingVolume> {
    let first = volumes.next()?;
    Some(volumes.fold(first, |mut acc, v| {
        acc.expand(v.min);
        acc.expand(v.max);
        acc
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use preview_core::Triangle;

    fn cube_mesh(center: Vec3, size: f32) -> DecodedMesh {
        let h = size * 0.5;
        // 対角の2頂点を含む三角形で境界ボックスを作る
        DecodedMesh::new(vec![
            Triangle::new(center - Vec3::splat(h), center + Vec3::new(h, -h, -h), center + Vec3::splat(h)),
        ])
    }

    #[test]
    fn test_compose_defaults() {
        let scene = Scene::compose(&SceneOptions::default());
        assert_eq!(scene.mesh_count(), 0);
        assert!(scene.ground().is_none());
        assert_eq!(scene.ambient.intensity, 0.8);
        assert_eq!(scene.directional.intensity, 1.0);
        assert!(scene.directional.cast_shadow);
        assert_eq!(scene.backdrop.fog.near, 10.0);
        assert_eq!(scene.backdrop.fog.far, 50.0);
        assert_eq!(scene.drawables().count(), 0);
    }

    #[test]
    fn test_compose_with_ground() {
        let options = SceneOptions {
            ground_plane: true,
            ..Default::default()
        };
        let scene = Scene::compose(&options);
        let ground = scene.ground().unwrap();
        assert!(ground.receive_shadow);
        assert!(!ground.cast_shadow);
        assert_eq!(scene.drawables().count(), 1);
    }

    #[test]
    fn test_add_mesh_enables_shadows() {
        let mut scene = Scene::compose(&SceneOptions::default());
        let revision = scene.revision();
        let index = scene.add_mesh("cube", &cube_mesh(Vec3::ZERO, 2.0)).unwrap();

        assert_eq!(index, 0);
        assert_eq!(scene.mesh_count(), 1);
        let model = &scene.models()[0];
        assert!(model.cast_shadow && model.receive_shadow);
        assert_eq!(model.mesh.vertex_count(), 3);
        assert!(scene.revision() > revision);
    }

    #[test]
    fn test_add_empty_mesh_is_ignored() {
        let mut scene = Scene::compose(&SceneOptions::default());
        assert_eq!(scene.add_mesh("empty", &DecodedMesh::default()), None);
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn test_ground_fits_under_model() {
        let options = SceneOptions {
            ground_plane: true,
            ..Default::default()
        };
        let mut scene = Scene::compose(&options);
        scene.add_mesh("cube", &cube_mesh(Vec3::new(5.0, 3.0, 0.0), 2.0));

        let ground = scene.ground().unwrap();
        assert_eq!(ground.transform.position, Vec3::new(5.0, 2.0, 0.0));
        assert_eq!(ground.transform.scale, Vec3::new(8.0, 1.0, 8.0));
    }

    #[test]
    fn test_rotation_pivots_on_model_center() {
        let mut scene = Scene::compose(&SceneOptions::default());
        scene.add_mesh("cube", &cube_mesh(Vec3::new(4.0, 0.0, 0.0), 2.0));
        scene.rotate_models(Vec2::new(100.0, 0.0));

        let bounds = scene.world_bounds().unwrap();
        let center = bounds.center();
        assert_relative_eq!(center.x, 4.0, epsilon = 1e-4);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_clear_keeps_lights() {
        let options = SceneOptions {
            ground_plane: true,
            ..Default::default()
        };
        let mut scene = Scene::compose(&options);
        scene.add_mesh("cube", &cube_mesh(Vec3::ZERO, 2.0));
        scene.clear();

        assert_eq!(scene.mesh_count(), 0);
        assert_eq!(scene.drawables().count(), 0);
        assert_eq!(scene.ambient.intensity, 0.8);
    }

    #[test]
    fn test_frame_uniform_flags() {
        let options = SceneOptions {
            shadows_enabled: false,
            tone_mapping: ToneMapping::Linear,
            ..Default::default()
        };
        let scene = Scene::compose(&options);
        let uniform = scene.frame_uniform(&Camera::new(1.0));
        assert_eq!(uniform.flags[0], 0);
        assert_eq!(uniform.flags[1], 0);
        assert_eq!(uniform.light_direction[3], 1.0);
        assert_eq!(uniform.fog_range[0], 10.0);
    }

    #[test]
    fn test_light_view_projection_contains_model() {
        let mut scene = Scene::compose(&SceneOptions::default());
        scene.add_mesh("cube", &cube_mesh(Vec3::ZERO, 2.0));
        let light = scene.light_view_projection();

        for corner in [Vec3::splat(-1.0), Vec3::splat(1.0), Vec3::new(1.0, -1.0, 1.0)] {
            let clip = light.project_point3(corner);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&clip.z));
        }
    }
}
