//! イベントリスナー管理モジュール
//!
//! 登録したリスナーをIDで保持し、セッション破棄時にまとめて解除する

use std::collections::HashMap;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

/// 登録済みリスナー
struct Listener {
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// リスナーマネージャー
pub struct ListenerRegistry {
    target: EventTarget,
    listeners: HashMap<u32, Listener>,
    next_id: u32,
}

impl ListenerRegistry {
    pub fn new(target: EventTarget) -> Self {
        Self {
            target,
            listeners: HashMap::new(),
            next_id: 1,
        }
    }

    /// イベントを購読してIDを返す
    /// イベントが `E` に変換できない場合はハンドラを呼ばない
    pub fn listen<E, F>(&mut self, event: &'static str, mut handler: F) -> Result<u32, JsValue>
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
            if let Ok(e) = e.dyn_into::<E>() {
                handler(e);
            }
        });
        self.target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;

        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, Listener { event, callback });
        Ok(id)
    }

    /// 全購読を解除
    pub fn clear(&mut self) {
        for listener in std::mem::take(&mut self.listeners).into_values() {
            self.detach(&listener);
        }
    }

    fn detach(&self, listener: &Listener) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(listener.event, listener.callback.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove {} listener: {:?}", listener.event, e);
        }
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
