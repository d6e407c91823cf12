use formats::FeatureCollection;
use foundation::LayerId;
use gloo_net::http::Request;
use viewer::FetchError;
use viewer::fetch::{SourceFetcher, source_url};

/// Layer data over the browser's `fetch`.
#[derive(Debug, Clone)]
pub struct GlooFetcher {
    base: String,
}

impl GlooFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl SourceFetcher for GlooFetcher {
    async fn fetch(&self, id: &LayerId) -> Result<FeatureCollection, FetchError> {
        let url = source_url(&self.base, id);
        let resp = Request::get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        match resp.status() {
            404 => return Err(FetchError::NotFound(url)),
            status if !resp.ok() => return Err(FetchError::Status { url, status }),
            _ => {}
        }
        let text = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(FeatureCollection::from_geojson_str(&text)?)
    }
}
