//! プレビューセッションのライフサイクル管理
//!
//! 表示領域のマウント/アンマウントと選択ファイルの変更に合わせて
//! セッションを構築・破棄する

mod manager;
mod session_id;

pub use manager::LifecycleManager;
pub use session_id::SessionId;

use std::fmt;

use thiserror::Error;

use crate::source::{FileFormat, SourceFile};

/// プレビュー対象として選択されたファイル
/// ブラウザではバイト列の読み込みが非同期のため、形式と名前だけを要求する
pub trait PreviewSource {
    fn name(&self) -> &str;
    fn format(&self) -> FileFormat;
}

impl PreviewSource for SourceFile {
    fn name(&self) -> &str {
        SourceFile::name(self)
    }

    fn format(&self) -> FileFormat {
        SourceFile::format(self)
    }
}

/// 表示領域のピクセルサイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// 表示領域エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("display surface has zero size ({width}x{height})")]
    ZeroSized { width: u32, height: u32 },
    #[error("no display surface is mounted")]
    Unmounted,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 幅・高さが共に正であることを確認
    pub fn validate(self) -> Result<Self, SurfaceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SurfaceError::ZeroSized {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// アスペクト比を取得
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// セッションが保持するリソースの解放手順
/// LifecycleManager はこの順で呼び出す:
/// stop_loop → remove_listeners → detach_surface → release
pub trait SessionResources {
    /// 描画ループを停止
    fn stop_loop(&mut self);
    /// 登録した入力リスナーを全て解除
    fn remove_listeners(&mut self);
    /// 描画面を表示ツリーから外す
    fn detach_surface(&mut self);
    /// レンダラー・シーンのリソースを解放
    fn release(&mut self);
    /// 表示領域のサイズ変更を反映
    fn resize(&mut self, size: SurfaceSize);
}

/// セッションを構築する実装（ブラウザ、テスト用など）
pub trait PreviewBackend {
    type Source: PreviewSource;
    type Session: SessionResources;
    type Error: fmt::Display;

    /// 新しいセッションを構築し、描画ループを開始する
    fn create_session(
        &mut self,
        id: SessionId,
        source: &Self::Source,
        surface: SurfaceSize,
    ) -> Result<Self::Session, Self::Error>;
}
