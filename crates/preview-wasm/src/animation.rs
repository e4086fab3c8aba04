//! 描画ループモジュール
//!
//! requestAnimationFrame で毎フレームコールバックを呼ぶ。
//! 停止後は次のフレームを予約しない

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// requestAnimationFrame による描画ループ
pub struct AnimationLoop {
    /// 予約中のフレームのハンドル
    handle: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl AnimationLoop {
    /// ループを開始
    pub fn start(mut frame: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let handle = Rc::new(Cell::new(None));
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        let next = callback.clone();
        let next_handle = handle.clone();
        *callback.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            next_handle.set(None);
            frame();
            // frame() の中で停止された場合はコールバックが消えている
            if let Some(cb) = next.borrow().as_ref() {
                match request_frame(cb) {
                    Ok(id) => next_handle.set(Some(id)),
                    Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
                }
            }
        }));

        if let Some(cb) = callback.borrow().as_ref() {
            handle.set(Some(request_frame(cb)?));
        }

        Ok(Self { handle, callback })
    }

    /// ループを停止（何度呼んでもよい）
    pub fn stop(&mut self) {
        if let Some(id) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        // クロージャ自身への参照を切って循環を解消
        self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no global window"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}
