use crate::math::{Mat4, Quat, Vec3};

/// ドラッグ1ピクセルあたりの回転量（ラジアン）
pub const DRAG_ROTATION_PER_PIXEL: f32 = 0.01;

/// シーン内メッシュの姿勢
/// 回転・拡大はメッシュのローカル中心（ピボット）まわりに適用される
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// 拡大のみ（地面の大きさ合わせ用）
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::identity()
        }
    }

    /// ドラッグ量に応じてオブジェクトを回転
    /// 横方向はワールドY軸、縦方向はメッシュのX軸まわり。角度に上限はない
    pub fn rotate_by_drag(&mut self, delta_x: f32, delta_y: f32) {
        let yaw = Quat::from_rotation_y(delta_x * DRAG_ROTATION_PER_PIXEL);
        let pitch = Quat::from_rotation_x(delta_y * DRAG_ROTATION_PER_PIXEL);
        self.rotation = (yaw * self.rotation * pitch).normalize();
    }

    /// ピボットを原点とした変換行列
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
