//! 自動フレーミング
//!
//! 境界ボックス全体が画角に収まる位置へカメラを置き、注視点を中心に合わせる

use glam::Vec3;

use preview_core::BoundingVolume;

use crate::camera::Camera;
use crate::controls::OrbitControls;
use crate::options::{FramingAxis, FramingOptions};

/// 遠クリップ面はフレーミング距離のこの倍率以上にする
const FAR_PLANE_MARGIN: f32 = 4.0;

/// 最大辺 `max_extent` を垂直画角 `fov`（ラジアン）に収める距離
/// 大きさゼロでも `min_distance` を下回らない
pub fn framing_distance(max_extent: f32, fov: f32, min_distance: f32) -> f32 {
    let distance = max_extent / (fov * 0.5).sin();
    if distance.is_finite() {
        distance.max(min_distance)
    } else {
        min_distance
    }
}

/// カメラとコントロールを境界ボックスに合わせる
///
/// カメラは中心から `options.axis` 方向に置き、カメラとコントロールの注視点を中心にする。
/// 未適用の操作量は破棄するので、同じ境界で何度呼んでも結果は変わらない。
/// 戻り値はカメラから中心までの距離
pub fn frame(
    bounds: &BoundingVolume,
    camera: &mut Camera,
    controls: &mut OrbitControls,
    options: &FramingOptions,
) -> f32 {
    let center = bounds.center();
    let distance = framing_distance(bounds.max_extent(), camera.fov(), options.min_distance);

    controls.reset_motion();
    controls.set_target(center);

    camera.up = match options.axis {
        // 真上から見下ろすときはYを上方向にできない
        FramingAxis::PosY => Vec3::NEG_Z,
        _ => Vec3::Y,
    };
    camera.set_target(center);
    camera.set_position(center + options.axis.direction() * distance);
    camera.far = Camera::DEFAULT_FAR.max(distance * FAR_PLANE_MARGIN);

    log::debug!("Framed {:?} at distance {:.3}", center, distance);
    distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(center: Vec3, size: f32) -> BoundingVolume {
        BoundingVolume::from_center_extent(center, Vec3::splat(size))
    }

    #[test]
    fn test_cube_at_45_degrees() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        let distance = frame(
            &cube(Vec3::ZERO, 2.0),
            &mut camera,
            &mut controls,
            &FramingOptions::default(),
        );

        assert_relative_eq!(distance, 5.2263, epsilon = 1e-3);
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(controls.target, Vec3::ZERO);
        assert_relative_eq!(camera.position.z, distance, epsilon = 1e-5);
        assert_eq!(camera.position.x, 0.0);
        assert_eq!(camera.position.y, 0.0);
    }

    #[test]
    fn test_target_is_bounds_center() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        let bounds = BoundingVolume::new(Vec3::new(10.0, 0.0, -4.0), Vec3::new(14.0, 2.0, 0.0));
        frame(&bounds, &mut camera, &mut controls, &FramingOptions::default());

        assert_eq!(camera.target, Vec3::new(12.0, 1.0, -2.0));
        assert_eq!(controls.target, camera.target);
    }

    #[test]
    fn test_framing_is_idempotent() {
        let bounds = cube(Vec3::new(1.0, 2.0, 3.0), 3.0);
        let options = FramingOptions::default();
        let mut camera = Camera::new(1.5);
        let mut controls = OrbitControls::new();

        frame(&bounds, &mut camera, &mut controls, &options);
        let first = (camera.clone(), controls.clone());
        frame(&bounds, &mut camera, &mut controls, &options);

        assert_eq!(camera, first.0);
        assert_eq!(controls, first.1);
    }

    #[test]
    fn test_discards_pending_motion() {
        let bounds = cube(Vec3::ZERO, 2.0);
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        controls.rotate(glam::Vec2::new(50.0, 20.0), 400.0);
        controls.zoom(1.0);

        frame(&bounds, &mut camera, &mut controls, &FramingOptions::default());
        let framed = camera.clone();

        assert!(controls.is_settled());
        assert!(!controls.update(&mut camera));
        assert_eq!(camera, framed);
    }

    #[test]
    fn test_degenerate_bounds_use_min_distance() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        let point = BoundingVolume::new(Vec3::ONE, Vec3::ONE);
        let distance = frame(&point, &mut camera, &mut controls, &FramingOptions::default());

        assert_eq!(distance, 1.0);
        assert_eq!(camera.position, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_distance_is_positive_for_any_valid_fov() {
        for degrees in [1.0_f32, 10.0, 45.0, 90.0, 150.0, 179.0] {
            for extent in [0.0, 1e-6, 1.0, 1e4] {
                let distance = framing_distance(extent, degrees.to_radians(), 1.0);
                assert!(distance.is_finite() && distance >= 1.0, "{degrees} {extent}");
            }
        }
    }

    #[test]
    fn test_wider_fov_is_closer() {
        let narrow = framing_distance(10.0, 30.0_f32.to_radians(), 1.0);
        let wide = framing_distance(10.0, 90.0_f32.to_radians(), 1.0);
        assert!(wide < narrow);
    }

    #[test]
    fn test_axis_option() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        let options = FramingOptions {
            axis: FramingAxis::PosX,
            ..Default::default()
        };
        let distance = frame(&cube(Vec3::ZERO, 2.0), &mut camera, &mut controls, &options);

        assert_relative_eq!(camera.position.x, distance, epsilon = 1e-5);
        assert_eq!(camera.position.z, 0.0);
    }

    #[test]
    fn test_far_plane_covers_large_meshes() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        let distance = frame(
            &cube(Vec3::ZERO, 1000.0),
            &mut camera,
            &mut controls,
            &FramingOptions::default(),
        );
        assert!(camera.far >= distance * 4.0);

        frame(&cube(Vec3::ZERO, 1.0), &mut camera, &mut controls, &FramingOptions::default());
        assert_eq!(camera.far, Camera::DEFAULT_FAR);
    }
}
