//! ファイル登録
//!
//! ファイル行を追加し、タグを既存のidに解決（無ければ作成）して結びつける。
//! 途中で失敗した場合は追加したファイル行を削除する

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::records::{FileId, FileRow, NewFileRecord, TagRow};
use crate::store::{CatalogStore, StoreError};

/// 登録処理の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InsertFile,
    FindTag,
    InsertTag,
    LinkTag,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::InsertFile => "insert_file",
            Stage::FindTag => "find_tag",
            Stage::InsertTag => "insert_tag",
            Stage::LinkTag => "link_tag",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 登録エラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StoreError,
    },
    /// 取り消しにも失敗し、ファイル行が残っている
    #[error("{stage} failed ({source}) and file {file_id} could not be removed: {rollback}")]
    Inconsistent {
        file_id: FileId,
        stage: Stage,
        source: StoreError,
        rollback: StoreError,
    },
}

impl CatalogError {
    pub const MISSING_NAME_OR_PATH: &'static str = "Name and path are required.";

    /// 保存先で失敗した段階
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CatalogError::Validation(_) => None,
            CatalogError::Stage { stage, .. } | CatalogError::Inconsistent { stage, .. } => Some(*stage),
        }
    }
}

/// ファイルを登録してタグを結びつける
///
/// 同じタグ名が複数あっても結合行は1つ
pub fn register_file<S: CatalogStore>(store: &mut S, record: &NewFileRecord) -> Result<FileRow, CatalogError> {
    let fields = record
        .file_fields()
        .ok_or(CatalogError::Validation(CatalogError::MISSING_NAME_OR_PATH))?;

    let file = store.insert_file(fields).map_err(|source| {
        log::error!("File insert failed: {}", source);
        CatalogError::Stage {
            stage: Stage::InsertFile,
            source,
        }
    })?;

    let tags = record.unique_tags();
    if let Err((stage, source)) = attach_tags(store, file.id, &tags) {
        log::error!("{} failed for file {}: {}", stage, file.id, source);
        return Err(match store.delete_file(file.id) {
            Ok(()) => CatalogError::Stage { stage, source },
            Err(rollback) => {
                log::error!("Rollback of file {} failed: {}", file.id, rollback);
                CatalogError::Inconsistent {
                    file_id: file.id,
                    stage,
                    source,
                    rollback,
                }
            }
        });
    }

    log::info!("Registered {} (id {}) with {} tag(s)", file.name, file.id, tags.len());
    Ok(file)
}

fn attach_tags<S: CatalogStore>(store: &mut S, file_id: FileId, names: &[&str]) -> Result<(), (Stage, StoreError)> {
    for name in names {
        let tag = resolve_tag(store, name)?;
        store
            .link(file_id, tag.id)
            .map_err(|e| (Stage::LinkTag, e))?;
    }
    Ok(())
}

/// 既存タグを返し、無ければ作成
fn resolve_tag<S: CatalogStore>(store: &mut S, name: &str) -> Result<TagRow, (Stage, StoreError)> {
    match store.find_tag(name).map_err(|e| (Stage::FindTag, e))? {
        Some(tag) => Ok(tag),
        None => {
            log::debug!("Creating tag `{}`", name);
            store.insert_tag(name).map_err(|e| (Stage::InsertTag, e))
        }
    }
}
