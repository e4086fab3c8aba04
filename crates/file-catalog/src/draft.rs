//! アップロードフォームの状態
//!
//! ファイル選択・形式・タグ選択を保持し、送信時に登録リクエストを組み立てる

use thiserror::Error;

use preview_core::{FileFormat, UnknownFormat};

use crate::records::NewFileRecord;
use crate::store::CatalogStore;

/// アップロード先のパス
const UPLOAD_DIR: &str = "/uploads";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error(transparent)]
    UnsupportedType(#[from] UnknownFormat),
    #[error("Please complete all fields.")]
    Incomplete,
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error("an upload is already in progress")]
    AlreadyUploading,
}

/// 選択中のファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct UploadDraft {
    file: Option<SelectedFile>,
    format: Option<FileFormat>,
    tags: Vec<String>,
    available_tags: Vec<String>,
    uploading: bool,
}

impl UploadDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルを選択し、拡張子から形式を設定
    /// 未対応の形式なら選択を解除する
    pub fn select_file(&mut self, name: &str, size: u64) -> Result<FileFormat, DraftError> {
        match FileFormat::from_file_name(name) {
            Some(format) => {
                self.file = Some(SelectedFile {
                    name: name.to_string(),
                    size,
                });
                self.format = Some(format);
                Ok(format)
            }
            None => {
                self.clear_file();
                Err(UnknownFormat(name.to_string()).into())
            }
        }
    }

    pub fn clear_file(&mut self) {
        self.file = None;
        self.format = None;
    }

    /// 形式を手動で変更
    pub fn set_format(&mut self, format: FileFormat) {
        self.format = Some(format);
    }

    /// タグの選択を切り替え、選択後の状態を返す
    pub fn toggle_tag(&mut self, tag: &str) -> Result<bool, DraftError> {
        if let Some(index) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(index);
            return Ok(false);
        }
        if !self.available_tags.iter().any(|t| t == tag) {
            return Err(DraftError::UnknownTag(tag.to_string()));
        }
        self.tags.push(tag.to_string());
        Ok(true)
    }

    pub fn set_available_tags(&mut self, tags: Vec<String>) {
        self.available_tags = tags;
    }

    /// 保存先から選択肢のタグを読み込む（失敗時は現在の一覧を保つ）
    pub fn refresh_tags<S: CatalogStore>(&mut self, store: &S) {
        match store.list_tags() {
            Ok(tags) => self.set_available_tags(tags.into_iter().map(|t| t.name).collect()),
            Err(e) => log::error!("Error fetching tags: {}", e),
        }
    }

    /// 送信を開始して登録リクエストを返す
    /// ファイル・形式・1つ以上のタグが必要
    pub fn begin_submit(&mut self) -> Result<NewFileRecord, DraftError> {
        if self.uploading {
            return Err(DraftError::AlreadyUploading);
        }
        let (Some(file), Some(format)) = (&self.file, self.format) else {
            return Err(DraftError::Incomplete);
        };
        if self.tags.is_empty() {
            return Err(DraftError::Incomplete);
        }

        let record = NewFileRecord {
            name: Some(file.name.clone()),
            path: Some(format!("{}/{}", UPLOAD_DIR, file.name)),
            size: Some(file.size),
            file_type: Some(format.as_str().to_string()),
            preview_url: None,
            tags: self.tags.clone(),
        };
        self.uploading = true;
        Ok(record)
    }

    /// 送信完了。成功時はフォームを空にする
    pub fn finish_submit(&mut self, ok: bool) {
        self.uploading = false;
        if ok {
            self.clear_file();
            self.tags.clear();
        }
    }

    /// 3Dプレビューを表示するか
    pub fn wants_preview(&self) -> bool {
        self.file.is_some() && self.format.is_some_and(|f| f.is_mesh())
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn format(&self) -> Option<FileFormat> {
        self.format
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn available_tags(&self) -> &[String] {
        &self.available_tags
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }
}
