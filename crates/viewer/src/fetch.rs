//! Loading layer data.
//!
//! Each descriptor's data lives at `<base>/<sourceLayerName>.geojson`, either
//! behind HTTP or in a local directory with the same file names.

use formats::FeatureCollection;
use foundation::LayerId;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use layers::LayerRegistry;

use crate::error::FetchError;

pub fn source_url(base: &str, id: &LayerId) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        format!("{id}.geojson")
    } else {
        format!("{base}/{id}.geojson")
    }
}

#[allow(async_fn_in_trait)]
pub trait SourceFetcher {
    async fn fetch(&self, id: &LayerId) -> Result<FeatureCollection, FetchError>;
}

/// Fetches every registry source concurrently and yields results in
/// completion order, tagged with the layer id.
pub async fn fetch_all<F: SourceFetcher>(
    fetcher: &F,
    registry: &LayerRegistry,
) -> Vec<(LayerId, Result<FeatureCollection, FetchError>)> {
    let mut pending: FuturesUnordered<_> = registry
        .iter()
        .map(|d| async move {
            let id = d.id().clone();
            let result = fetcher.fetch(&id).await;
            (id, result)
        })
        .collect();
    let mut done = Vec::with_capacity(registry.len());
    while let Some(item) = pending.next().await {
        done.push(item);
    }
    done
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{DirFetcher, HttpFetcher};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use formats::FeatureCollection;
    use foundation::LayerId;
    use tracing::debug;

    use super::{SourceFetcher, source_url};
    use crate::error::FetchError;

    pub struct HttpFetcher {
        base_url: String,
        client: reqwest::Client,
    }

    impl HttpFetcher {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
                client: reqwest::Client::new(),
            }
        }
    }

    impl SourceFetcher for HttpFetcher {
        async fn fetch(&self, id: &LayerId) -> Result<FeatureCollection, FetchError> {
            let url = source_url(&self.base_url, id);
            debug!("GET {url}");
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url));
            }
            if !response.status().is_success() {
                return Err(FetchError::Status {
                    status: response.status().as_u16(),
                    url,
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            Ok(FeatureCollection::from_geojson_str(&body)?)
        }
    }

    pub struct DirFetcher {
        root: PathBuf,
    }

    impl DirFetcher {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }
    }

    impl SourceFetcher for DirFetcher {
        async fn fetch(&self, id: &LayerId) -> Result<FeatureCollection, FetchError> {
            let path = self.root.join(format!("{id}.geojson"));
            debug!("reading {path:?}");
            let body = match tokio::fs::read_to_string(&path).await {
                Ok(body) => body,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(FetchError::NotFound(path.display().to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            Ok(FeatureCollection::from_geojson_str(&body)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DirFetcher, SourceFetcher, fetch_all, source_url};
    use crate::error::FetchError;
    use foundation::LayerId;
    use layers::barcelona;

    #[test]
    fn urls_join_base_and_id() {
        let id = LayerId::new("IMPD_width");
        assert_eq!(source_url("data/", &id), "data/IMPD_width.geojson");
        assert_eq!(
            source_url("https://example.org/impd", &id),
            "https://example.org/impd/IMPD_width.geojson"
        );
        assert_eq!(source_url("", &id), "IMPD_width.geojson");
    }

    #[tokio::test]
    async fn dir_fetcher_reads_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("IMPD_width.geojson"),
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("IMPD_obstacles.geojson"), "{ nope").unwrap();

        let fetcher = DirFetcher::new(dir.path());
        let fc = fetcher.fetch(&LayerId::new("IMPD_width")).await.unwrap();
        assert!(fc.is_empty());

        let err = fetcher.fetch(&LayerId::new("IMPD_obstacles")).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidData(_)));
        let err = fetcher.fetch(&LayerId::new("missing")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn fetch_all_returns_one_result_per_layer() {
        let dir = tempfile::tempdir().unwrap();
        let registry = barcelona::registry().unwrap();
        let results = fetch_all(&DirFetcher::new(dir.path()), &registry).await;
        assert_eq!(results.len(), registry.len());
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }
}
