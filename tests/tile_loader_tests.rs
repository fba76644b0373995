use agrimap::prelude::*;
use async_trait::async_trait;
use geozero::mvt::{tile, Message, Tile};
use serde_json::json;
use std::cell::Cell;
use std::sync::Mutex;

/// Tile loading against a scripted transport: status classification, request
/// shape and stale-result handling
#[cfg(test)]
mod tile_loader_tests {
    use super::*;

    const BASE: &str = "https://gis.example.kr";

    enum Reply {
        Status(u16, Vec<u8>),
        Unreachable,
    }

    /// Answers every request with the same reply and records what was sent
    struct ScriptedTransport {
        reply: Reply,
        sent: Mutex<Vec<TileRequest>>,
    }

    impl ScriptedTransport {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<TileRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TileTransport for ScriptedTransport {
        async fn send(&self, request: &TileRequest) -> Result<TileResponse> {
            self.sent.lock().unwrap().push(request.clone());
            match &self.reply {
                Reply::Status(status, body) => Ok(TileResponse::new(*status, body.clone())),
                Reply::Unreachable => Err(MapError::Transport("connection refused".to_string())),
            }
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// One MVT layer "farmfield" with a single point in the tile center
    fn mvt_tile() -> Vec<u8> {
        Tile {
            layers: vec![tile::Layer {
                version: 2,
                name: "farmfield".to_string(),
                features: vec![tile::Feature {
                    id: Some(1),
                    tags: vec![0, 0],
                    r#type: Some(tile::GeomType::Point as i32),
                    geometry: vec![9, 4096, 4096],
                }],
                keys: vec!["pummok".to_string()],
                values: vec![tile::Value {
                    string_value: Some("월동무".to_string()),
                    ..Default::default()
                }],
                extent: Some(4096),
            }],
        }
        .encode_to_vec()
    }

    fn loader(transport: Arc<ScriptedTransport>) -> TileLoader {
        init_logging();
        TileLoader::with_transport(transport, TileLoaderConfig::for_testing())
    }

    /// Runs the callback loader and reports (success calls, failure calls)
    async fn run_callbacks(loader: &TileLoader, tile: &PreparedTile, format: &dyn FeatureFormat) -> (usize, usize) {
        let successes = Cell::new(0);
        let failures = Cell::new(0);
        loader
            .load(
                tile,
                format,
                |_, _| successes.set(successes.get() + 1),
                || failures.set(failures.get() + 1),
            )
            .await;
        (successes.get(), failures.get())
    }

    /// 204 goes to failure, never success, in both request modes
    #[tokio::test]
    async fn test_no_content_calls_failure_only() {
        let get_source = VectorTileSource::generic(BASE, "jeju_emd").unwrap();
        let post_source =
            VectorTileSource::farmfield_post(BASE, QueryParams::new().with("year", 2024)).unwrap();

        for source in [get_source, post_source] {
            let transport = ScriptedTransport::new(Reply::Status(204, Vec::new()));
            let loader = loader(transport.clone());
            let tile = source.prepare_tile(TileCoord::new(1746, 801, 11)).unwrap();

            let outcome = run_callbacks(&loader, &tile, source.format().as_ref()).await;

            assert_eq!(outcome, (0, 1));
            assert_eq!(transport.sent().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_mvt_success() {
        let transport = ScriptedTransport::new(Reply::Status(200, mvt_tile()));
        let loader = loader(transport.clone());
        let source = VectorTileSource::farmfield(BASE, QueryParams::new().with("pummok", json!(["월동무"]))).unwrap();
        let tile = source.prepare_tile(TileCoord::new(0, 0, 0)).unwrap();

        let mut received = None;
        loader
            .load(
                &tile,
                source.format().as_ref(),
                |features, projection| received = Some((features, projection)),
                || panic!("failure must not be called"),
            )
            .await;

        let (features, projection) = received.unwrap();
        assert_eq!(projection, Some(Projection::WebMercator));
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].property("pummok").unwrap(), "월동무");

        // center of the world tile is the origin of EPSG:3857
        let Some(geo_types::Geometry::Point(p)) = &features[0].geometry else {
            panic!("expected a point");
        };
        assert!(p.x().abs() < 1e-6 && p.y().abs() < 1e-6);

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert!(sent[0].binary);
        assert!(sent[0].url.ends_with("/api/common/v0/gis/farmfield/mvt/0/0/0?pummok=%EC%9B%94%EB%8F%99%EB%AC%B4"));
    }

    #[tokio::test]
    async fn test_errors_call_failure() {
        let source = VectorTileSource::generic(BASE, "jeju_emd").unwrap();
        let tile = source.prepare_tile(TileCoord::new(0, 0, 0)).unwrap();

        for reply in [
            Reply::Status(500, b"oops".to_vec()),
            Reply::Status(404, Vec::new()),
            Reply::Unreachable,
            Reply::Status(200, b"not a tile".to_vec()),
        ] {
            let loader = loader(ScriptedTransport::new(reply));
            assert_eq!(run_callbacks(&loader, &tile, source.format().as_ref()).await, (0, 1));
        }
    }

    /// Status 0 (no HTTP, e.g. local files) counts as success
    #[tokio::test]
    async fn test_status_zero_is_success() {
        let loader = loader(ScriptedTransport::new(Reply::Status(0, mvt_tile())));
        let source = VectorTileSource::generic(BASE, "jeju_emd").unwrap();
        let tile = source.prepare_tile(TileCoord::new(0, 0, 0)).unwrap();

        let outcome = loader.fetch(&tile, source.format().as_ref()).await;
        assert!(outcome.is_loaded());
    }

    #[tokio::test]
    async fn test_geojson_over_post() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "id": "f-1", "properties": {"area": 1320.5},
                          "geometry": {"type": "Point", "coordinates": [126.5312, 33.4996]}}]
        });
        let transport = ScriptedTransport::new(Reply::Status(200, body.to_string().into_bytes()));
        let loader = loader(transport.clone());
        let source = VectorTileSource::farmfield_post(BASE, QueryParams::new().with("pummok", json!(["감귤", "양배추"])))
            .unwrap()
            .with_format(Arc::new(GeoJsonFormat::default()));
        let tile = source.prepare_tile(TileCoord::new(0, 0, 0)).unwrap();

        let outcome = loader.fetch(&tile, source.format().as_ref()).await;

        let TileLoadOutcome::Loaded { features, projection } = outcome else {
            panic!("expected features");
        };
        assert_eq!(projection, Some(Projection::Wgs84));
        assert_eq!(features[0].id, Some(FeatureId::from("f-1")));

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert!(!sent[0].binary);
        assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
        assert_eq!(sent[0].body, Some(json!({"pummok": ["감귤", "양배추"]})));
    }

    /// A tile requested before a filter change is not applied after it
    #[tokio::test]
    async fn test_stale_tile_discarded_after_param_update() {
        let transport = ScriptedTransport::new(Reply::Status(200, mvt_tile()));
        let loader = loader(transport.clone());
        let source = VectorTileSource::farmfield(BASE, QueryParams::new().with("year", 2023)).unwrap();
        let mut layer = VectorTileLayer::from_config(source, loader.config());
        let coord = TileCoord::new(1, 0, 1);

        let in_flight = layer.prepare_load(coord).unwrap();
        let handle = loader.spawn_fetch(in_flight, layer.source().format().clone());
        layer.update_query_params(QueryParams::new().with("year", 2024));

        let (tile, outcome) = handle.await.unwrap();
        assert!(outcome.is_loaded());
        assert!(!layer.apply_result(&tile, outcome));
        assert!(layer.needs_load(coord));

        let state = layer.load_tile(&loader, coord).await.cloned();
        assert!(matches!(state, Some(TileState::Loaded(ref features)) if features.len() == 1));

        let urls: Vec<String> = transport.sent().into_iter().map(|r| r.url).collect();
        assert!(urls[0].ends_with("?year=2023"));
        assert!(urls[1].ends_with("?year=2024"));
    }

    /// Wrapped vector-tile layers accept new filters without re-registration
    #[tokio::test]
    async fn test_update_params_through_manager() {
        init_logging();
        let mut manager = LayerManager::new(Map::default());
        let source = VectorTileSource::farmfield(BASE, QueryParams::new().with("pummok", "감귤")).unwrap();
        manager
            .add_layer(LayerWrapper::vector_tile(VectorTileLayer::new(source), Some("farmfield")), None, Some(3))
            .await
            .unwrap();

        let wrapper = manager.get_layer("farmfield").unwrap();
        wrapper
            .update_query_params(QueryParams::new().with("pummok", json!(["a", "b"])))
            .unwrap();

        let layer = wrapper.layer().read();
        let LayerKind::VectorTile(vector_tile) = &layer.kind else {
            panic!("expected a vector tile layer");
        };
        assert!(vector_tile.source().url_template().ends_with("{z}/{x}/{y}?pummok=a&pummok=b"));
        assert_eq!(vector_tile.source().generation(), 1);
    }
}
