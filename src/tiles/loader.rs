//! Tile loading with `204 No Content` treated as an empty tile.
//!
//! HTTP outcomes are reclassified into three cases: features were read, the
//! tile is legitimately empty, or the fetch failed. Callers using the callback
//! form see empty and failed tiles the same way (through `failure`), which is
//! what tells a tile layer to keep showing its interim tile.

use std::sync::Arc;

use crate::{
    core::{config::TileLoaderConfig, geo::Projection},
    layers::vector::Feature,
    tiles::{
        format::{FeatureFormat, ReadOptions, ResponseBody},
        source::PreparedTile,
        transport::{ReqwestTransport, TileRequest, TileResponse, TileTransport},
    },
    Result,
};

/// HTTP status meaning "nothing in this tile"
pub const STATUS_NO_CONTENT: u16 = 204;

/// Result of loading one tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileLoadOutcome {
    Loaded {
        features: Vec<Feature>,
        projection: Option<Projection>,
    },
    /// The server answered 204
    Empty,
    /// Network error, non-success status, or a body that could not be read
    Failed(String),
}

impl TileLoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TileLoadOutcome::Loaded { .. })
    }
}

/// `0` covers transports without HTTP status (local files).
fn is_success_status(status: u16) -> bool {
    status == 0 || (200..300).contains(&status)
}

/// Classifies a completed response and reads its body with `format`.
pub fn classify_response(
    response: &TileResponse,
    format: &dyn FeatureFormat,
    options: &ReadOptions,
) -> TileLoadOutcome {
    if !is_success_status(response.status) {
        return TileLoadOutcome::Failed(format!("HTTP {}", response.status));
    }
    if response.status == STATUS_NO_CONTENT {
        return TileLoadOutcome::Empty;
    }

    let Some(body) = ResponseBody::parse(format.format_type(), &response.body) else {
        return TileLoadOutcome::Failed("response body could not be read".to_string());
    };

    match format.read_features(&body, options) {
        Ok(features) => TileLoadOutcome::Loaded {
            features,
            projection: format.read_projection(&body),
        },
        Err(e) => TileLoadOutcome::Failed(e.to_string()),
    }
}

/// Sends `request` and classifies the outcome. Never returns an error: a
/// transport error becomes [`TileLoadOutcome::Failed`].
pub async fn fetch_features(
    transport: &dyn TileTransport,
    request: &TileRequest,
    format: &dyn FeatureFormat,
    options: &ReadOptions,
) -> TileLoadOutcome {
    let outcome = match transport.send(request).await {
        Ok(response) => classify_response(&response, format, options),
        Err(e) => TileLoadOutcome::Failed(e.to_string()),
    };

    #[cfg(feature = "debug")]
    match &outcome {
        TileLoadOutcome::Loaded { features, .. } => {
            log::debug!("{} -> {} features", request.url, features.len())
        }
        TileLoadOutcome::Empty => log::debug!("{} -> no content", request.url),
        TileLoadOutcome::Failed(reason) => log::warn!("{} failed: {}", request.url, reason),
    }

    outcome
}

/// Callback form of the loader: `success` runs only when features were read,
/// `failure` runs for empty (204) and failed tiles alike. Exactly one of the
/// two is called.
pub async fn load_features_with_204<S, F>(
    transport: &dyn TileTransport,
    request: &TileRequest,
    format: &dyn FeatureFormat,
    options: &ReadOptions,
    success: S,
    failure: F,
) where
    S: FnOnce(Vec<Feature>, Option<Projection>),
    F: FnOnce(),
{
    match fetch_features(transport, request, format, options).await {
        TileLoadOutcome::Loaded {
            features,
            projection,
        } => success(features, projection),
        TileLoadOutcome::Empty | TileLoadOutcome::Failed(_) => failure(),
    }
}

/// Loads prepared tiles through a shared transport
#[derive(Clone)]
pub struct TileLoader {
    transport: Arc<dyn TileTransport>,
    config: TileLoaderConfig,
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TileLoader {
    /// Loader over a `reqwest` client built from `config`
    pub fn new(config: TileLoaderConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn TileTransport>, config: TileLoaderConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &TileLoaderConfig {
        &self.config
    }

    pub async fn fetch(&self, tile: &PreparedTile, format: &dyn FeatureFormat) -> TileLoadOutcome {
        fetch_features(self.transport.as_ref(), &tile.request, format, &tile.options).await
    }

    pub async fn load<S, F>(&self, tile: &PreparedTile, format: &dyn FeatureFormat, success: S, failure: F)
    where
        S: FnOnce(Vec<Feature>, Option<Projection>),
        F: FnOnce(),
    {
        load_features_with_204(
            self.transport.as_ref(),
            &tile.request,
            format,
            &tile.options,
            success,
            failure,
        )
        .await
    }

    /// Fetches on the tokio runtime; the handle yields the tile back with its
    /// outcome so the caller can check the generation before applying it.
    #[cfg(feature = "tokio-runtime")]
    pub fn spawn_fetch(
        &self,
        tile: PreparedTile,
        format: Arc<dyn FeatureFormat>,
    ) -> tokio::task::JoinHandle<(PreparedTile, TileLoadOutcome)> {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let outcome =
                fetch_features(transport.as_ref(), &tile.request, format.as_ref(), &tile.options).await;
            (tile, outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::Extent,
        tiles::format::{GeoJsonFormat, MvtFormat},
    };

    fn options() -> ReadOptions {
        ReadOptions {
            extent: Extent::web_mercator(),
            resolution: 1.0,
            feature_projection: Projection::Wgs84,
        }
    }

    #[test]
    fn test_status_classes() {
        let format = MvtFormat::new();
        let outcome = |status| classify_response(&TileResponse::new(status, Vec::new()), &format, &options());

        assert_eq!(outcome(204), TileLoadOutcome::Empty);
        assert!(outcome(200).is_loaded());
        assert!(outcome(0).is_loaded());
        assert!(matches!(outcome(299), TileLoadOutcome::Loaded { .. }));
        assert!(matches!(outcome(300), TileLoadOutcome::Failed(_)));
        assert!(matches!(outcome(404), TileLoadOutcome::Failed(_)));
        assert!(matches!(outcome(500), TileLoadOutcome::Failed(_)));
    }

    #[test]
    fn test_unreadable_json_body_fails() {
        let response = TileResponse::new(200, "");
        let outcome = classify_response(&response, &GeoJsonFormat::default(), &options());
        assert!(matches!(outcome, TileLoadOutcome::Failed(_)));
    }

    #[test]
    fn test_geojson_body_loaded_with_projection() {
        let response = TileResponse::new(
            200,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[126.5,33.4]}}]}"#,
        );
        let outcome = classify_response(&response, &GeoJsonFormat::default(), &options());

        let TileLoadOutcome::Loaded { features, projection } = outcome else {
            panic!("expected features");
        };
        assert_eq!(features.len(), 1);
        assert_eq!(projection, Some(Projection::Wgs84));
    }
}
