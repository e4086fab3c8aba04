//! カタログの行データ

use serde::{Deserialize, Deserializer, Serialize};

pub type FileId = u64;
pub type TagId = u64;

/// 登録リクエスト
///
/// `name` と `path` は必須だが、欠落は登録時にバリデーションエラーとして扱うため
/// ここでは省略可能にしている
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    /// 配列以外は無視する
    #[serde(default, deserialize_with = "tag_names")]
    pub tags: Vec<String>,
}

impl NewFileRecord {
    /// 空文字列は未指定とみなす
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref().filter(|s| !s.is_empty())
    }

    /// 必須項目が揃っていれば挿入用の値を返す
    pub fn file_fields(&self) -> Option<NewFile<'_>> {
        Some(NewFile {
            name: self.name()?,
            path: self.path()?,
            size: self.size,
            file_type: self.file_type.as_deref(),
            preview_url: self.preview_url.as_deref(),
        })
    }

    /// 重複と空文字列を除いたタグ名（出現順）
    pub fn unique_tags(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.as_str();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen
    }
}

/// 検証済みのファイル行の値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewFile<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub size: Option<u64>,
    pub file_type: Option<&'a str>,
    pub preview_url: Option<&'a str>,
}

fn tag_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let names = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(names)
}

/// `files` テーブルの行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRow {
    pub id: FileId,
    pub name: String,
    pub path: String,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub preview_url: Option<String>,
}

/// `tags` テーブルの行（name は一意）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub id: TagId,
    pub name: String,
}

/// `file_tags` 結合テーブルの行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTagRow {
    pub file_id: FileId,
    pub tag_id: TagId,
}
