//! `/api/files` ハンドラ
//!
//! メソッド名とリクエストボディを受け取り、ステータス・Allowヘッダ・JSON本文を返す。
//! HTTPサーバーは持たない

use serde_json::{json, Value};

use crate::records::NewFileRecord;
use crate::register::{register_file, CatalogError};
use crate::store::CatalogStore;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";
const ALLOWED_METHODS: &[&str] = &["POST"];

/// ハンドラの応答
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// 405 のときの Allow ヘッダ
    pub allow: Option<&'static [&'static str]>,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            allow: None,
            body,
        }
    }

    /// Allow ヘッダの値（カンマ区切り）
    pub fn allow_header(&self) -> Option<String> {
        self.allow.map(|methods| methods.join(", "))
    }
}

/// ファイル登録リクエストを処理（POSTのみ）
pub fn handle_files_request<S: CatalogStore>(method: &str, body: &[u8], store: &mut S) -> ApiResponse {
    if method != "POST" {
        return ApiResponse {
            status: 405,
            allow: Some(ALLOWED_METHODS),
            body: json!({ "error": format!("Method {} not allowed", method) }),
        };
    }

    let record: NewFileRecord = match serde_json::from_slice(body) {
        Ok(record) => record,
        Err(e) => {
            log::error!("Invalid request body: {}", e);
            return ApiResponse::json(500, json!({ "error": UNEXPECTED_ERROR }));
        }
    };

    match register_file(store, &record) {
        Ok(file) => ApiResponse::json(
            200,
            json!({ "message": "File added successfully", "file": file }),
        ),
        Err(CatalogError::Validation(message)) => ApiResponse::json(400, json!({ "error": message })),
        Err(e) => {
            log::error!("API error: {}", e);
            let mut body = json!({ "error": UNEXPECTED_ERROR });
            if let Some(stage) = e.stage() {
                body["stage"] = json!(stage);
            }
            ApiResponse::json(500, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;
    use crate::records::{FileId, FileRow, FileTagRow, NewFile, TagId, TagRow};
    use crate::store::StoreError;

    /// 結合行の追加だけ失敗する保存先
    struct BrokenLinks(MemoryCatalog);

    impl CatalogStore for BrokenLinks {
        fn insert_file(&mut self, file: NewFile<'_>) -> Result<FileRow, StoreError> {
            self.0.insert_file(file)
        }
        fn delete_file(&mut self, id: FileId) -> Result<(), StoreError> {
            self.0.delete_file(id)
        }
        fn find_tag(&self, name: &str) -> Result<Option<TagRow>, StoreError> {
            self.0.find_tag(name)
        }
        fn insert_tag(&mut self, name: &str) -> Result<TagRow, StoreError> {
            self.0.insert_tag(name)
        }
        fn link(&mut self, _file_id: FileId, _tag_id: TagId) -> Result<FileTagRow, StoreError> {
            Err(StoreError::Unavailable("file_tags locked".into()))
        }
        fn list_tags(&self) -> Result<Vec<TagRow>, StoreError> {
            self.0.list_tags()
        }
    }

    #[test]
    fn test_post_success() {
        let mut catalog = MemoryCatalog::with_tags(["bracket"]).unwrap();
        let body = br#"{"name":"part.stl","path":"/uploads/part.stl","size":2048,"type":"STL","tags":["bracket","prototype"]}"#;

        let response = handle_files_request("POST", body, &mut catalog);
        assert_eq!(response.status, 200);
        assert_eq!(response.allow, None);
        assert_eq!(response.body["message"], "File added successfully");
        assert_eq!(response.body["file"]["id"], 1);
        assert_eq!(response.body["file"]["name"], "part.stl");
        assert_eq!(response.body["file"]["type"], "STL");
        assert_eq!(response.body["file"]["preview_url"], Value::Null);

        assert_eq!(catalog.tags().count(), 2);
        assert_eq!(catalog.file_tags().len(), 2);
    }

    #[test]
    fn test_other_methods_not_allowed() {
        let mut catalog = MemoryCatalog::new();
        for method in ["GET", "PUT", "DELETE", "post"] {
            let response = handle_files_request(method, b"", &mut catalog);
            assert_eq!(response.status, 405);
            assert_eq!(response.allow_header().as_deref(), Some("POST"));
            assert_eq!(response.body["error"], format!("Method {} not allowed", method));
        }
        assert_eq!(catalog.files().count(), 0);
    }

    #[test]
    fn test_missing_path_is_bad_request() {
        let mut catalog = MemoryCatalog::new();
        let response = handle_files_request("POST", br#"{"name":"a.stl"}"#, &mut catalog);
        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({ "error": "Name and path are required." }));
    }

    #[test]
    fn test_malformed_json_is_server_error() {
        let mut catalog = MemoryCatalog::new();
        let response = handle_files_request("POST", b"{not json", &mut catalog);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], UNEXPECTED_ERROR);
        assert!(response.body.get("stage").is_none());
    }

    #[test]
    fn test_storage_failure_names_stage() {
        let mut store = BrokenLinks(MemoryCatalog::new());
        let body = br#"{"name":"a.stl","path":"/uploads/a.stl","tags":["x"]}"#;

        let response = handle_files_request("POST", body, &mut store);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], UNEXPECTED_ERROR);
        assert_eq!(response.body["stage"], "link_tag");
        // ファイル行は取り消されている
        assert_eq!(store.0.files().count(), 0);
    }
}
