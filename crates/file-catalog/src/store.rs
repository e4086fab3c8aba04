//! 保存先の抽象化

use thiserror::Error;

use crate::records::{FileId, FileRow, FileTagRow, NewFile, TagId, TagRow};

/// 保存先のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate row in {table}: {detail}")]
    Conflict { table: &'static str, detail: String },
    #[error("no row {id} in {table}")]
    NotFound { table: &'static str, id: u64 },
}

/// カタログの保存先
///
/// 各操作は単独で成功または失敗する。複数操作にまたがる整合性は
/// 呼び出し側（`register_file`）が取り消し操作で保つ
pub trait CatalogStore {
    /// ファイル行を追加してidを採番
    fn insert_file(&mut self, file: NewFile<'_>) -> Result<FileRow, StoreError>;

    /// ファイル行と、それを参照する結合行を削除
    fn delete_file(&mut self, id: FileId) -> Result<(), StoreError>;

    /// 名前でタグを検索
    fn find_tag(&self, name: &str) -> Result<Option<TagRow>, StoreError>;

    /// タグを追加（同名があれば `Conflict`）
    fn insert_tag(&mut self, name: &str) -> Result<TagRow, StoreError>;

    /// ファイルとタグを結びつける
    fn link(&mut self, file_id: FileId, tag_id: TagId) -> Result<FileTagRow, StoreError>;

    /// 全タグ（id順）
    fn list_tags(&self) -> Result<Vec<TagRow>, StoreError>;
}
