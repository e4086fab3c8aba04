//! 入力ファイルモジュール
//!
//! ユーザーが選択したファイル（バイト列・名前・形式）を表す

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 受け付けるファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Stl,
    Obj,
    Png,
    Jpg,
}

/// 未対応の拡張子・形式名
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported file type `{0}` (expected STL, OBJ, PNG or JPG)")]
pub struct UnknownFormat(pub String);

impl FileFormat {
    /// 全形式（UIの選択肢順）
    pub const ALL: [FileFormat; 4] = [FileFormat::Stl, FileFormat::Obj, FileFormat::Png, FileFormat::Jpg];

    /// 拡張子から形式を判定（大文字小文字は区別しない）
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(extension))
    }

    /// ファイル名の最後の拡張子から形式を判定
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.rsplit_once('.')
            .and_then(|(_, extension)| Self::from_extension(extension))
    }

    /// 形式名（大文字）
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Stl => "STL",
            FileFormat::Obj => "OBJ",
            FileFormat::Png => "PNG",
            FileFormat::Jpg => "JPG",
        }
    }

    /// 3Dプレビュー可能なメッシュ形式か
    pub fn is_mesh(&self) -> bool {
        matches!(self, FileFormat::Stl | FileFormat::Obj)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// 選択されたファイル
/// 選択後は不変。バイト列は複数の所有者で共有できる
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    format: FileFormat,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// 名前・形式・内容からファイルを作成
    pub fn new(name: impl Into<String>, format: FileFormat, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes: bytes.into(),
        }
    }

    /// ファイル名の拡張子から形式を判定して作成
    pub fn from_name(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, UnknownFormat> {
        let name = name.into();
        let format = FileFormat::from_file_name(&name).ok_or_else(|| UnknownFormat(name.clone()))?;
        Ok(Self::new(name, format, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// バイト数
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
