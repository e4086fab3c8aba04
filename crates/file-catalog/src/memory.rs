//! メモリ上のカタログ
//!
//! テストやローカル実行用。tags.name の一意制約と、
//! ファイル削除時の結合行の連鎖削除を再現する

use std::collections::BTreeMap;

use crate::records::{FileId, FileRow, FileTagRow, NewFile, TagId, TagRow};
use crate::store::{CatalogStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    files: BTreeMap<FileId, FileRow>,
    tags: BTreeMap<TagId, TagRow>,
    file_tags: Vec<FileTagRow>,
    next_file_id: FileId,
    next_tag_id: TagId,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存タグを登録した状態で作成
    pub fn with_tags<I, S>(names: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::new();
        for name in names {
            catalog.insert_tag(name.as_ref())?;
        }
        Ok(catalog)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRow> {
        self.files.values()
    }

    pub fn file(&self, id: FileId) -> Option<&FileRow> {
        self.files.get(&id)
    }

    pub fn tags(&self) -> impl Iterator<Item = &TagRow> {
        self.tags.values()
    }

    pub fn file_tags(&self) -> &[FileTagRow] {
        &self.file_tags
    }

    /// ファイルに付いたタグ名
    pub fn tags_of(&self, file_id: FileId) -> Vec<&str> {
        self.file_tags
            .iter()
            .filter(|row| row.file_id == file_id)
            .filter_map(|row| self.tags.get(&row.tag_id))
            .map(|tag| tag.name.as_str())
            .collect()
    }
}

impl CatalogStore for MemoryCatalog {
    fn insert_file(&mut self, file: NewFile<'_>) -> Result<FileRow, StoreError> {
        self.next_file_id += 1;
        let row = FileRow {
            id: self.next_file_id,
            name: file.name.to_string(),
            path: file.path.to_string(),
            size: file.size,
            file_type: file.file_type.map(str::to_string),
            preview_url: file.preview_url.map(str::to_string),
        };
        self.files.insert(row.id, row.clone());
        Ok(row)
    }

    fn delete_file(&mut self, id: FileId) -> Result<(), StoreError> {
        if self.files.remove(&id).is_none() {
            return Err(StoreError::NotFound { table: "files", id });
        }
        self.file_tags.retain(|row| row.file_id != id);
        Ok(())
    }

    fn find_tag(&self, name: &str) -> Result<Option<TagRow>, StoreError> {
        Ok(self.tags.values().find(|tag| tag.name == name).cloned())
    }

    fn insert_tag(&mut self, name: &str) -> Result<TagRow, StoreError> {
        if self.tags.values().any(|tag| tag.name == name) {
            return Err(StoreError::Conflict {
                table: "tags",
                detail: format!("name `{}` already exists", name),
            });
        }
        self.next_tag_id += 1;
        let row = TagRow {
            id: self.next_tag_id,
            name: name.to_string(),
        };
        self.tags.insert(row.id, row.clone());
        Ok(row)
    }

    fn link(&mut self, file_id: FileId, tag_id: TagId) -> Result<FileTagRow, StoreError> {
        if !self.files.contains_key(&file_id) {
            return Err(StoreError::NotFound { table: "files", id: file_id });
        }
        if !self.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound { table: "tags", id: tag_id });
        }
        let row = FileTagRow { file_id, tag_id };
        if self.file_tags.contains(&row) {
            return Err(StoreError::Conflict {
                table: "file_tags",
                detail: format!("file {} already has tag {}", file_id, tag_id),
            });
        }
        self.file_tags.push(row);
        Ok(row)
    }

    fn list_tags(&self) -> Result<Vec<TagRow>, StoreError> {
        Ok(self.tags.values().cloned().collect())
    }
}
