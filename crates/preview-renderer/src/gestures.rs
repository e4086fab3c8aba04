//! 入力ジェスチャーモジュール
//!
//! ポインターボタン（＋Shift）とジェスチャーの対応表と、ドラッグ状態の管理

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// ポインターボタン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// DOMの `MouseEvent.button` 値から変換
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// ドラッグで行う操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gesture {
    /// 注視点周りにカメラを回転
    Orbit,
    /// 注視点を平行移動
    Pan,
    /// ドリー
    Zoom,
    /// カメラではなくメッシュ自体を回転
    RotateObject,
}

/// 入力の組み合わせ（ボタン＋Shift）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputBinding {
    pub button: PointerButton,
    pub shift: bool,
}

impl InputBinding {
    pub fn new(button: PointerButton, shift: bool) -> Self {
        Self { button, shift }
    }
}

/// 入力とジェスチャーの対応表
/// 1つの入力には常に1つのジェスチャーだけが割り当たるため、
/// メッシュ回転とカメラ回転が同じ入力で同時に起きることはない
#[derive(Debug, Clone, PartialEq)]
pub struct GestureMap {
    bindings: HashMap<InputBinding, Gesture>,
    /// ホイールでズームするか
    pub wheel_zoom: bool,
}

impl GestureMap {
    /// 割り当てなしの対応表
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
            wheel_zoom: true,
        }
    }

    /// カメラ操作用の既定: 左=回転, 中=平行移動, 右=平行移動
    pub fn camera_default() -> Self {
        let mut map = Self::empty();
        map.bind(InputBinding::new(PointerButton::Primary, false), Gesture::Orbit);
        map.bind(InputBinding::new(PointerButton::Middle, false), Gesture::Pan);
        map.bind(InputBinding::new(PointerButton::Secondary, false), Gesture::Pan);
        map
    }

    /// メッシュ回転を有効にした対応表: 左=メッシュ回転, Shift+左=カメラ回転
    pub fn object_rotation() -> Self {
        let mut map = Self::camera_default();
        map.bind(InputBinding::new(PointerButton::Primary, false), Gesture::RotateObject);
        map.bind(InputBinding::new(PointerButton::Primary, true), Gesture::Orbit);
        map
    }

    /// 設定から対応表を選択
    pub fn for_options(object_rotation: bool) -> Self {
        if object_rotation {
            Self::object_rotation()
        } else {
            Self::camera_default()
        }
    }

    /// 入力にジェスチャーを割り当て、以前の割り当てを返す
    pub fn bind(&mut self, binding: InputBinding, gesture: Gesture) -> Option<Gesture> {
        self.bindings.insert(binding, gesture)
    }

    /// 入力の割り当てを解除
    pub fn unbind(&mut self, binding: InputBinding) -> Option<Gesture> {
        self.bindings.remove(&binding)
    }

    /// 入力に対応するジェスチャーを取得
    /// Shift付きの割り当てがなければShiftなしの割り当てを使う
    pub fn resolve(&self, button: PointerButton, shift: bool) -> Option<Gesture> {
        self.bindings
            .get(&InputBinding::new(button, shift))
            .or_else(|| {
                shift
                    .then(|| self.bindings.get(&InputBinding::new(button, false)))
                    .flatten()
            })
            .copied()
    }
}

impl Default for GestureMap {
    fn default() -> Self {
        Self::camera_default()
    }
}

/// ドラッグ中の状態
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    gesture: Gesture,
    last: Vec2,
}

/// ポインター入力をジェスチャーの移動量に変換する
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    map: GestureMap,
    drag: Option<Drag>,
}

impl Interaction {
    pub fn new(map: GestureMap) -> Self {
        Self { map, drag: None }
    }

    pub fn map(&self) -> &GestureMap {
        &self.map
    }

    /// ボタン押下。割り当てがあればドラッグを開始してジェスチャーを返す
    pub fn pointer_down(&mut self, button: PointerButton, shift: bool, position: Vec2) -> Option<Gesture> {
        let gesture = self.map.resolve(button, shift)?;
        self.drag = Some(Drag {
            gesture,
            last: position,
        });
        Some(gesture)
    }

    /// ポインター移動。ドラッグ中ならジェスチャーと前回位置からの移動量を返す
    pub fn pointer_move(&mut self, position: Vec2) -> Option<(Gesture, Vec2)> {
        let drag = self.drag.as_mut()?;
        let delta = position - drag.last;
        drag.last = position;
        Some((drag.gesture, delta))
    }

    /// ボタン解放
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// ドラッグ中のジェスチャー
    pub fn active(&self) -> Option<Gesture> {
        self.drag.map(|d| d.gesture)
    }

    /// ホイールをズームとして扱うか
    pub fn wheel_zoom(&self) -> bool {
        self.map.wheel_zoom
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(GestureMap::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(1), Some(PointerButton::Middle));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(3), None);
    }

    #[test]
    fn test_camera_default() {
        let map = GestureMap::camera_default();
        assert_eq!(map.resolve(PointerButton::Primary, false), Some(Gesture::Orbit));
        assert_eq!(map.resolve(PointerButton::Middle, false), Some(Gesture::Pan));
        assert_eq!(map.resolve(PointerButton::Secondary, false), Some(Gesture::Pan));
        // Shiftの割り当てがなければShiftなしにフォールバック
        assert_eq!(map.resolve(PointerButton::Primary, true), Some(Gesture::Orbit));
    }

    #[test]
    fn test_object_rotation_is_exclusive_with_orbit() {
        let map = GestureMap::object_rotation();
        assert_eq!(map.resolve(PointerButton::Primary, false), Some(Gesture::RotateObject));
        assert_eq!(map.resolve(PointerButton::Primary, true), Some(Gesture::Orbit));
    }

    #[test]
    fn test_bind_replaces_previous() {
        let mut map = GestureMap::camera_default();
        let previous = map.bind(InputBinding::new(PointerButton::Middle, false), Gesture::Zoom);
        assert_eq!(previous, Some(Gesture::Pan));
        assert_eq!(map.resolve(PointerButton::Middle, false), Some(Gesture::Zoom));
    }

    #[test]
    fn test_unbound_button_starts_no_drag() {
        let mut map = GestureMap::camera_default();
        map.unbind(InputBinding::new(PointerButton::Secondary, false));
        let mut interaction = Interaction::new(map);
        assert_eq!(interaction.pointer_down(PointerButton::Secondary, false, Vec2::ZERO), None);
        assert_eq!(interaction.pointer_move(Vec2::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_drag_reports_incremental_deltas() {
        let mut interaction = Interaction::default();
        interaction.pointer_down(PointerButton::Primary, false, Vec2::new(10.0, 10.0));

        assert_eq!(
            interaction.pointer_move(Vec2::new(15.0, 12.0)),
            Some((Gesture::Orbit, Vec2::new(5.0, 2.0)))
        );
        assert_eq!(
            interaction.pointer_move(Vec2::new(15.0, 20.0)),
            Some((Gesture::Orbit, Vec2::new(0.0, 8.0)))
        );

        interaction.pointer_up();
        assert_eq!(interaction.active(), None);
        assert_eq!(interaction.pointer_move(Vec2::new(0.0, 0.0)), None);
    }
}
