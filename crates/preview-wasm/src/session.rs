//! ブラウザ用プレビューセッション
//!
//! canvas・描画ループ・イベントリスナー・GPUリソースを1セッションとして保持し、
//! LifecycleManager から構築・破棄される

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Event, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent};

use preview_core::{
    FileFormat, LifecycleManager, PreviewBackend, PreviewSource, SessionId, SessionResources, SurfaceSize,
    UnknownFormat,
};
use preview_renderer::glam::Vec2;
use preview_renderer::{PointerButton, PreviewConfig, PreviewError, PreviewState};

use crate::animation::AnimationLoop;
use crate::listeners::ListenerRegistry;
use crate::renderer::Renderer;

pub type SharedManager = Rc<RefCell<LifecycleManager<WebBackend>>>;

/// セッション構築エラー
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error("DOM operation failed: {0}")]
    Dom(String),
}

impl From<JsValue> for SessionError {
    fn from(value: JsValue) -> Self {
        SessionError::Dom(format!("{:?}", value))
    }
}

/// `<input type="file">` で選択されたファイル
#[derive(Debug, Clone)]
pub struct BrowserFile {
    file: web_sys::File,
    name: String,
    format: FileFormat,
}

impl BrowserFile {
    /// 拡張子から形式を判定
    pub fn new(file: web_sys::File) -> Result<Self, UnknownFormat> {
        let name = file.name();
        let format = FileFormat::from_file_name(&name).ok_or_else(|| UnknownFormat(name.clone()))?;
        Ok(Self { file, name, format })
    }

    /// 中身を非同期で読み込む
    pub async fn read(&self) -> Result<Vec<u8>, JsValue> {
        let buffer = JsFuture::from(self.file.array_buffer()).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

impl PreviewSource for BrowserFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> FileFormat {
        self.format
    }
}

/// 描画ループとイベントハンドラから共有される状態
struct SessionView {
    state: PreviewState,
    /// GPUの初期化が終わるまでは None
    renderer: Option<Renderer>,
}

impl SessionView {
    fn frame(&mut self) {
        self.state.tick();
        if let Some(renderer) = self.renderer.as_mut() {
            if let Err(e) = renderer.render(&self.state) {
                log::error!("Render failed: {:?}", e);
            }
        }
    }
}

/// ブラウザ上のプレビューセッション
pub struct WebSession {
    id: SessionId,
    canvas: HtmlCanvasElement,
    view: Rc<RefCell<SessionView>>,
    animation: Option<AnimationLoop>,
    listeners: ListenerRegistry,
}

impl WebSession {
    /// 読み込んだバイト列をデコードしてシーンに追加
    pub fn load(&mut self, name: &str, format: FileFormat, bytes: &[u8]) -> bool {
        self.view.borrow_mut().state.load(name, format, bytes).is_ok()
    }

    pub fn attach_renderer(&mut self, renderer: Renderer) {
        log::debug!("Renderer attached to session {}", self.id);
        self.view.borrow_mut().renderer = Some(renderer);
    }

    pub fn has_renderer(&self) -> bool {
        self.view.borrow().renderer.is_some()
    }

    pub fn mesh_count(&self) -> usize {
        self.view.borrow().state.scene().mesh_count()
    }

    pub fn reset_view(&mut self) {
        self.view.borrow_mut().state.reset_view();
    }
}

impl SessionResources for WebSession {
    fn stop_loop(&mut self) {
        if let Some(mut animation) = self.animation.take() {
            animation.stop();
        }
    }

    fn remove_listeners(&mut self) {
        self.listeners.clear();
    }

    fn detach_surface(&mut self) {
        self.canvas.remove();
    }

    fn release(&mut self) {
        let mut view = self.view.borrow_mut();
        view.renderer = None;
        view.state.release();
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);

        let mut view = self.view.borrow_mut();
        if let Err(e) = view.state.resize(size) {
            log::warn!("Ignoring resize: {}", e);
            return;
        }
        if let Some(renderer) = view.renderer.as_mut() {
            renderer.resize(size);
        }
    }
}

/// ブラウザ用のセッション生成
pub struct WebBackend {
    container: HtmlElement,
    config: PreviewConfig,
    /// 非同期処理の完了を届ける先
    manager: Weak<RefCell<LifecycleManager<WebBackend>>>,
}

impl WebBackend {
    pub fn new(
        container: HtmlElement,
        config: PreviewConfig,
        manager: Weak<RefCell<LifecycleManager<WebBackend>>>,
    ) -> Self {
        Self {
            container,
            config,
            manager,
        }
    }

    /// GPUを初期化し、セッションが生きていれば渡す
    fn spawn_renderer(&self, id: SessionId, canvas: HtmlCanvasElement) {
        let manager = self.manager.clone();
        let options = self.config.scene.clone();

        spawn_local(async move {
            let result = Renderer::create(canvas, &options).await;
            let Some(manager) = manager.upgrade() else {
                return;
            };
            match result {
                Ok(renderer) => {
                    // 破棄済みなら renderer はここで解放される
                    manager.borrow_mut().deliver(id, |session| session.attach_renderer(renderer));
                }
                Err(e) => log::error!("GPU initialization failed for session {}: {:?}", id, e),
            }
        });
    }

    /// ファイルを読み込み、セッションが生きていればデコードする
    fn spawn_read(&self, id: SessionId, source: &BrowserFile) {
        let manager = self.manager.clone();
        let file = source.clone();

        spawn_local(async move {
            let bytes = file.read().await;
            let Some(manager) = manager.upgrade() else {
                return;
            };
            match bytes {
                Ok(bytes) => {
                    manager
                        .borrow_mut()
                        .deliver(id, |session| session.load(file.name(), file.format(), &bytes));
                }
                Err(e) => log::warn!("Failed to read {}: {:?}", file.name(), e),
            }
        });
    }
}

impl PreviewBackend for WebBackend {
    type Source = BrowserFile;
    type Session = WebSession;
    type Error = SessionError;

    fn create_session(
        &mut self,
        id: SessionId,
        source: &BrowserFile,
        surface: SurfaceSize,
    ) -> Result<WebSession, SessionError> {
        let state = PreviewState::new(&self.config, surface)?;
        let canvas = create_canvas(surface)?;
        let view = Rc::new(RefCell::new(SessionView { state, renderer: None }));

        let listeners = register_listeners(&canvas, &view)?;
        let animation = {
            let view = view.clone();
            AnimationLoop::start(move || view.borrow_mut().frame())?
        };
        self.container.append_child(&canvas)?;

        self.spawn_renderer(id, canvas.clone());
        self.spawn_read(id, source);

        Ok(WebSession {
            id,
            canvas,
            view,
            animation: Some(animation),
            listeners,
        })
    }
}

fn create_canvas(size: SurfaceSize) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("created element is not a canvas"))?;

    canvas.set_width(size.width);
    canvas.set_height(size.height);
    let style = canvas.style();
    style.set_property("display", "block")?;
    style.set_property("width", "100%")?;
    style.set_property("height", "100%")?;

    Ok(canvas)
}

fn pointer_position(e: &MouseEvent) -> Vec2 {
    Vec2::new(e.offset_x() as f32, e.offset_y() as f32)
}

/// canvasにポインター・ホイールのリスナーを登録
fn register_listeners(
    canvas: &HtmlCanvasElement,
    view: &Rc<RefCell<SessionView>>,
) -> Result<ListenerRegistry, JsValue> {
    let mut listeners = ListenerRegistry::new(canvas.clone().into());

    let v = view.clone();
    listeners.listen("mousedown", move |e: MouseEvent| {
        let Some(button) = PointerButton::from_dom(e.button()) else {
            return;
        };
        if v.borrow_mut()
            .state
            .pointer_down(button, e.shift_key(), pointer_position(&e))
            .is_some()
        {
            e.prevent_default();
        }
    })?;

    let v = view.clone();
    listeners.listen("mousemove", move |e: MouseEvent| {
        v.borrow_mut().state.pointer_move(pointer_position(&e));
    })?;

    for event in ["mouseup", "mouseleave"] {
        let v = view.clone();
        listeners.listen(event, move |_: MouseEvent| {
            v.borrow_mut().state.pointer_up();
        })?;
    }

    let v = view.clone();
    listeners.listen("wheel", move |e: WheelEvent| {
        e.prevent_default();
        v.borrow_mut().state.wheel(e.delta_y() as f32);
    })?;

    // 右ドラッグでパンするのでメニューを出さない
    listeners.listen("contextmenu", |e: Event| e.prevent_default())?;

    Ok(listeners)
}
