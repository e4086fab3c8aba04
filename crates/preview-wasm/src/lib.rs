// crates/preview-wasm/src/lib.rs

mod animation;
mod listeners;
mod renderer;
mod session;
mod shaders;
mod utils;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use preview_core::LifecycleManager;
use preview_renderer::PreviewConfig;

use session::{BrowserFile, SharedManager, WebBackend};

// パニック時のスタックトレース表示とロガー登録
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    utils::init_logger(log::LevelFilter::Info);
}

/// 表示インスタンス番号
static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(0);

/// JSから渡された設定を変換（undefined/null は既定値）
fn parse_config(options: JsValue) -> Result<PreviewConfig, JsValue> {
    let config = if options.is_undefined() || options.is_null() {
        PreviewConfig::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

/// メッシュプレビューのJS API
///
/// ```js
/// const preview = new StlPreview(container, { scene: { groundPlane: true } });
/// input.onchange = () => preview.set_file(input.files[0] ?? null);
/// ```
#[wasm_bindgen]
pub struct StlPreview {
    manager: SharedManager,
    container: HtmlElement,
}

#[wasm_bindgen]
impl StlPreview {
    /// コンテナ要素にプレビューをマウント
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, options: JsValue) -> Result<StlPreview, JsValue> {
        let config = parse_config(options)?;
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);

        let manager: SharedManager = Rc::new_cyclic(|weak| {
            RefCell::new(LifecycleManager::with_instance(
                WebBackend::new(container.clone(), config, weak.clone()),
                instance,
            ))
        });
        manager.borrow_mut().mount(utils::element_size(&container));

        Ok(Self { manager, container })
    }

    /// 選択ファイルを変更（null で解除）
    /// メッシュ形式ならセッションIDを返す
    pub fn set_file(&self, file: Option<web_sys::File>) -> Option<u32> {
        let source = file.and_then(|file| match BrowserFile::new(file) {
            Ok(source) => Some(source),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        });
        self.manager.borrow_mut().set_file(source).map(|id| id.to_u32())
    }

    /// コンテナのサイズに合わせる（サイズ0は無視）
    /// 表示領域が初めて確保されてセッションを構築した場合はIDを返す
    pub fn resize(&self) -> Option<u32> {
        let size = utils::element_size(&self.container);
        self.manager.borrow_mut().resize(size).map(|id| id.to_u32())
    }

    /// 再マウント（選択中のファイルがあればセッションを作り直す）
    pub fn mount(&self) -> Option<u32> {
        let size = utils::element_size(&self.container);
        self.manager.borrow_mut().mount(size).map(|id| id.to_u32())
    }

    /// アンマウント（セッションを破棄）
    pub fn unmount(&self) {
        self.manager.borrow_mut().unmount();
    }

    /// カメラをメッシュ全体に合わせ直す
    pub fn reset_view(&self) {
        if let Some(session) = self.manager.borrow_mut().session_mut() {
            session.reset_view();
        }
    }

    #[wasm_bindgen(getter)]
    pub fn has_session(&self) -> bool {
        self.manager.borrow().session().is_some()
    }

    /// GPUの初期化が完了しているか
    #[wasm_bindgen(getter)]
    pub fn gpu_ready(&self) -> bool {
        self.manager.borrow().session().is_some_and(|s| s.has_renderer())
    }

    #[wasm_bindgen(getter)]
    pub fn mesh_count(&self) -> usize {
        self.manager.borrow().session().map_or(0, |s| s.mesh_count())
    }

    #[wasm_bindgen(getter)]
    pub fn session_id(&self) -> Option<u32> {
        self.manager.borrow().active_id().map(|id| id.to_u32())
    }
}
