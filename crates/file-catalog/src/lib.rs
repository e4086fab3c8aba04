//! ファイルカタログ
//!
//! アップロードされたファイルのメタデータとタグを保存する。
//! 保存先は `CatalogStore` で抽象化し、HTTPハンドラはトランスポートに依存しない

pub mod records;
pub mod store;
pub mod memory;
pub mod register;
pub mod api;
pub mod draft;

// Re-exports
pub use api::{handle_files_request, ApiResponse};
pub use draft::{DraftError, SelectedFile, UploadDraft};
pub use memory::MemoryCatalog;
pub use records::{FileId, FileRow, FileTagRow, NewFile, NewFileRecord, TagId, TagRow};
pub use register::{register_file, CatalogError, Stage};
pub use store::{CatalogStore, StoreError};
