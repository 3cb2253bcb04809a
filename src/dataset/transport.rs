//! Byte transports for dataset files.
//!
//! The browser build fetches over HTTP. Native builds read the same relative
//! paths from a local directory, which keeps the loader logic identical.

use std::future::Future;

/// A dataset file could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Fetching {url} failed with status {status}")]
    Status { url: String, status: u16 },
    /// The request could not be made or its body could not be read.
    #[error("Fetching {url} failed: {message}")]
    Unavailable { url: String, message: String },
}

/// Retrieves raw bytes for a URL.
///
/// Like [`crate::storage::KeyValueStore`], futures are not required to be
/// `Send` so browser implementations can hold JS values across awaits.
pub trait Transport {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// HTTP transport backed by the browser's `fetch`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[cfg(target_arch = "wasm32")]
impl Transport for FetchTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        use js_sys::Uint8Array;
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;
        use web_sys::Response;

        let unavailable = |message: String| FetchError::Unavailable {
            url: url.to_string(),
            message,
        };

        let window = web_sys::window().ok_or_else(|| unavailable("No window object".into()))?;

        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| unavailable(format!("{:?}", e)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| unavailable("Expected a Response".into()))?;

        if !response.ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let buffer = response
            .array_buffer()
            .map_err(|e| unavailable(format!("{:?}", e)))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| unavailable(format!("{:?}", e)))?;

        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

/// Reads dataset files from a local directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileTransport {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Transport for FileTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(url);
        std::fs::read(&path).map_err(|e| match e.kind() {
            // Report a missing file the way a web server would
            std::io::ErrorKind::NotFound => FetchError::Status {
                url: url.to_string(),
                status: 404,
            },
            _ => FetchError::Unavailable {
                url: url.to_string(),
                message: e.to_string(),
            },
        })
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_file_transport_reads_relative_path() {
        let dir = std::env::temp_dir().join(format!("lcz-transport-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("LCZ2015_4326.geojson.gz"), b"bytes").unwrap();

        let transport = FileTransport::new(&dir);
        let bytes = block_on(transport.fetch("LCZ2015_4326.geojson.gz")).unwrap();
        assert_eq!(bytes, b"bytes");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_404() {
        let transport = FileTransport::new(std::env::temp_dir());
        let err = block_on(transport.fetch("definitely-not-here.geojson.gz")).unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                url: "definitely-not-here.geojson.gz".to_string(),
                status: 404,
            }
        );
    }
}
