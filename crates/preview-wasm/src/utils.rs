//! ユーティリティモジュール
//!
//! console_log マクロ、ブラウザコンソールへのロガー、DOMヘルパー

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use preview_core::SurfaceSize;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    pub fn warn(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn error(s: &str);
}

/// コンソールにログ出力するマクロ
macro_rules! console_log {
    ($($t:tt)*) => (crate::utils::log(&format_args!($($t)*).to_string()))
}
pub(crate) use console_log;

/// `log` クレートの出力をブラウザコンソールに転送する
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            log::Level::Error => error(&line),
            log::Level::Warn => warn(&line),
            _ => console_log!("{}", line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// ロガーを登録（2回目以降は何もしない）
pub fn init_logger(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// 要素の表示サイズ（CSSピクセル）
pub fn element_size(element: &HtmlElement) -> SurfaceSize {
    SurfaceSize::new(
        element.client_width().max(0) as u32,
        element.client_height().max(0) as u32,
    )
}
