//! Hands a selected character to the host application's import pipeline

use std::sync::Arc;

use crate::catalog::author_of;
use crate::error::SearchError;
use crate::http::{HttpResponse, Transport};

/// The only content kind the host knows how to import
pub const CHARACTER_KIND: &str = "character";

const IMPORT_PATH: &str = "/api/content/import";
const ALTERNATE_IMPORT_PATH: &str = "/import_custom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// User-visible message raised by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: &str) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

/// Capabilities the host application lends to the dispatcher
pub trait ImportHost: Send + Sync {
    /// Headers (auth, CSRF) attached to import requests
    fn request_headers(&self) -> Vec<(String, String)>;

    fn import_file(
        &self,
        file: ImportedFile,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub file_name: String,
    pub size: usize,
}

pub struct DownloadDispatcher {
    transport: Arc<dyn Transport>,
    host: Arc<dyn ImportHost>,
    host_url: String,
}

impl DownloadDispatcher {
    pub fn new(transport: Arc<dyn Transport>, host: Arc<dyn ImportHost>, host_url: &str) -> Self {
        Self {
            transport,
            host,
            host_url: host_url.trim_end_matches('/').to_string(),
        }
    }

    fn post_import(&self, path: &str, identifier: &str) -> Result<HttpResponse, u16> {
        let url = format!("{}{}", self.host_url, path);
        let body = serde_json::json!({ "url": identifier });
        match self
            .transport
            .post_json(&url, &body, &self.host.request_headers())
        {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(response.status),
            Err(e) => {
                log::warn!("{}", e);
                Err(0)
            }
        }
    }

    fn fail(&self, error: SearchError) -> SearchError {
        log::error!("Error downloading character: {}", error);
        self.host.notify(Notice::error(
            "Failed to download character. Check console for details.",
        ));
        error
    }

    /// Import `identifier` through the host, trying the alternate route once
    pub fn download(&self, identifier: &str) -> Result<DownloadOutcome, SearchError> {
        log::debug!("Custom content import started {}", identifier);

        let response = match self.post_import(IMPORT_PATH, identifier) {
            Ok(response) => response,
            Err(status) => {
                log::info!(
                    "Import of {} failed (HTTP {}), trying {}",
                    identifier,
                    status,
                    ALTERNATE_IMPORT_PATH
                );
                self.post_import(ALTERNATE_IMPORT_PATH, identifier)
                    .map_err(|status| {
                        self.fail(SearchError::DownloadFailed {
                            identifier: identifier.to_string(),
                            status,
                        })
                    })?
            }
        };

        let kind = response
            .header("x-custom-content-type")
            .unwrap_or_default()
            .to_string();
        if kind != CHARACTER_KIND {
            log::error!("Unknown content type {:?}", kind);
            self.host.notify(Notice::warning("Unknown content type"));
            return Err(SearchError::UnrecognizedContentKind { kind });
        }

        let file_name = response
            .header("content-disposition")
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| default_file_name(identifier));
        let file = ImportedFile {
            name: file_name.clone(),
            mime: response.header("content-type").map(str::to_string),
            bytes: response.body,
        };
        let size = file.bytes.len();

        self.host.import_file(file).map_err(|source| {
            self.fail(SearchError::ImportRejected {
                file_name: file_name.clone(),
                source,
            })
        })?;

        log::info!("Imported {} ({} bytes)", file_name, size);
        Ok(DownloadOutcome { file_name, size })
    }
}

/// `attachment; filename="x.png"` -> `x.png`
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest.split(';').next().unwrap_or_default().replace('"', "");
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn default_file_name(identifier: &str) -> String {
    let slug = identifier
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| author_of(identifier));
    format!("{}.png", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::{unreachable, FakeTransport};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        imported: Mutex<Vec<ImportedFile>>,
        notices: Mutex<Vec<Notice>>,
        reject: bool,
    }

    impl ImportHost for RecordingHost {
        fn request_headers(&self) -> Vec<(String, String)> {
            vec![("X-CSRF-Token".to_string(), "token".to_string())]
        }

        fn import_file(
            &self,
            file: ImportedFile,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if self.reject {
                return Err("unsupported card".into());
            }
            self.imported.lock().unwrap().push(file);
            Ok(())
        }

        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn character_response() -> HttpResponse {
        HttpResponse::new(200, b"card".to_vec())
            .with_header("Content-Disposition", "attachment; filename=\"Elf Ranger.png\"")
            .with_header("X-Custom-Content-Type", "character")
            .with_header("Content-Type", "image/png")
    }

    fn dispatcher(transport: Arc<FakeTransport>, host: Arc<RecordingHost>) -> DownloadDispatcher {
        DownloadDispatcher::new(transport, host, "http://host.test/")
    }

    #[test]
    fn test_character_is_imported() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(character_response())));
        let host = Arc::new(RecordingHost::default());

        let downloaded = dispatcher(transport.clone(), host.clone())
            .download("alice/elf-ranger")
            .unwrap();
        assert_eq!(downloaded.file_name, "Elf Ranger.png");
        assert_eq!(downloaded.size, 4);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://host.test/api/content/import");
        assert_eq!(
            calls[0].body,
            Some(serde_json::json!({ "url": "alice/elf-ranger" }))
        );
        assert_eq!(calls[0].headers[0].0, "X-CSRF-Token");

        let imported = host.imported.lock().unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].mime.as_deref(), Some("image/png"));
        assert!(host.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn test_alternate_route_after_primary_failure() {
        let transport = Arc::new(FakeTransport::new(|call| {
            if call.url.ends_with(IMPORT_PATH) {
                Ok(HttpResponse::new(404, ""))
            } else {
                Ok(character_response())
            }
        }));
        let host = Arc::new(RecordingHost::default());

        dispatcher(transport.clone(), host.clone())
            .download("alice/elf-ranger")
            .unwrap();
        let urls: Vec<_> = transport.calls().into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            [
                "http://host.test/api/content/import",
                "http://host.test/import_custom"
            ]
        );
        assert_eq!(host.imported.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_both_routes_failing() {
        let transport = Arc::new(FakeTransport::new(|call| {
            if call.url.ends_with(IMPORT_PATH) {
                Err(unreachable(&call.url))
            } else {
                Ok(HttpResponse::new(502, ""))
            }
        }));
        let host = Arc::new(RecordingHost::default());

        let result = dispatcher(transport.clone(), host.clone()).download("a/b");
        assert!(matches!(
            result,
            Err(SearchError::DownloadFailed { status: 502, .. })
        ));
        assert_eq!(transport.calls().len(), 2);
        assert!(host.imported.lock().unwrap().is_empty());
        assert_eq!(
            host.notices.lock().unwrap()[0],
            Notice::error("Failed to download character. Check console for details.")
        );
    }

    #[test]
    fn test_unknown_kind_is_discarded() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Ok(HttpResponse::new(200, "lore")
                .with_header("X-Custom-Content-Type", "lorebook")
                .with_header("Content-Disposition", "attachment; filename=book.json"))
        }));
        let host = Arc::new(RecordingHost::default());

        let result = dispatcher(transport, host.clone()).download("a/book");
        match result {
            Err(SearchError::UnrecognizedContentKind { kind }) => assert_eq!(kind, "lorebook"),
            other => panic!("expected UnrecognizedContentKind, got {:?}", other),
        }
        assert!(host.imported.lock().unwrap().is_empty());
        assert_eq!(
            host.notices.lock().unwrap()[0],
            Notice::warning("Unknown content type")
        );
    }

    #[test]
    fn test_host_rejection_is_surfaced() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(character_response())));
        let host = Arc::new(RecordingHost {
            reject: true,
            ..RecordingHost::default()
        });

        let result = dispatcher(transport, host.clone()).download("a/b");
        assert!(matches!(result, Err(SearchError::ImportRejected { .. })));
        assert_eq!(host.notices.lock().unwrap()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"a b.png\"").as_deref(),
            Some("a b.png")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=card.png; size=10").as_deref(),
            Some("card.png")
        );
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_missing_disposition_uses_slug() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Ok(HttpResponse::new(200, "x").with_header("X-Custom-Content-Type", "character"))
        }));
        let host = Arc::new(RecordingHost::default());
        let downloaded = dispatcher(transport, host).download("alice/elf").unwrap();
        assert_eq!(downloaded.file_name, "elf.png");
    }
}
