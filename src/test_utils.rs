#[cfg(test)]
pub mod test_utils {
    use crate::config::AppConfig;
    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        routing::{get, post},
    };
    use common::{Datasets, EntityRecord, HistoricalPoint, Period, PredictionPoint, TrainRequest};
    use serde::Deserialize;
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TRAIN_CONFIDENCE: f64 = 90.0;
    pub const PREDICT_CONFIDENCE: f64 = 88.0;
    const FORECAST_MONTHS: usize = 3;

    /// In-memory stand-in for the forecasting backend, recording what it was asked.
    #[derive(Debug, Default)]
    pub struct MockBackend {
        pub datasets: Option<Datasets>,
        pub saved: Vec<Datasets>,
        pub train_calls: Vec<String>,
        pub predict_calls: Vec<(String, String)>,
        pub fail_train: bool,
        pub fail_predict: bool,
    }

    pub type SharedBackend = Arc<Mutex<MockBackend>>;

    type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

    #[derive(Debug, Deserialize)]
    struct PredictQuery {
        #[serde(rename = "lastDate")]
        last_date: Option<String>,
    }

    fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
        (status, Json(json!({ "error": message })))
    }

    /// Forecast for the months after `last`, drifting upwards from `base`.
    fn forecast(last: Period, base: f64, confidence: f64) -> Reply {
        let months = last
            .following(FORECAST_MONTHS)
            .map_err(|err| reject(StatusCode::BAD_REQUEST, &err.to_string()))?;
        let predictions: Vec<PredictionPoint> = months
            .into_iter()
            .enumerate()
            .map(|(step, month)| PredictionPoint {
                month,
                prediction: base + step as f64 + 1.5,
            })
            .collect();
        Ok(Json(json!({ "predictions": predictions, "confidence": confidence })))
    }

    // Serialized straight from the IndexMap; going through `Value` would sort the keys.
    async fn get_datasets(
        State(backend): State<SharedBackend>,
    ) -> Result<Json<Datasets>, (StatusCode, Json<Value>)> {
        let backend = backend.lock().unwrap();
        match &backend.datasets {
            Some(datasets) => Ok(Json(datasets.clone())),
            None => Err(reject(StatusCode::NOT_FOUND, "Dataset not found")),
        }
    }

    async fn save_datasets(State(backend): State<SharedBackend>, Json(datasets): Json<Datasets>) -> Reply {
        let mut backend = backend.lock().unwrap();
        backend.saved.push(datasets.clone());
        backend.datasets = Some(datasets);
        Ok(Json(json!({ "message": "Data updated successfully" })))
    }

    async fn train(State(backend): State<SharedBackend>, Json(request): Json<TrainRequest>) -> Reply {
        let mut backend = backend.lock().unwrap();
        backend.train_calls.push(request.part_number.clone());
        if backend.fail_train {
            return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Model training failed"));
        }
        let Some(last) = request.historical_data.last() else {
            return Err(reject(StatusCode::BAD_REQUEST, "Historical data is required"));
        };
        forecast(last.month, last.demand, TRAIN_CONFIDENCE)
    }

    async fn predict(
        State(backend): State<SharedBackend>,
        Path(part_number): Path<String>,
        Query(query): Query<PredictQuery>,
    ) -> Reply {
        let mut backend = backend.lock().unwrap();
        let Some(last_date) = query.last_date else {
            return Err(reject(StatusCode::BAD_REQUEST, "Last date is required"));
        };
        backend.predict_calls.push((part_number.clone(), last_date.clone()));
        if backend.fail_predict {
            return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed"));
        }

        let Some(record) = backend.datasets.as_ref().and_then(|all| all.get(&part_number)) else {
            return Err(reject(StatusCode::NOT_FOUND, "Part number not found"));
        };
        let base = record.last_observed().map_or(0.0, |point| point.demand);
        let last: Period = last_date
            .parse()
            .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid lastDate"))?;
        forecast(last, base, PREDICT_CONFIDENCE)
    }

    pub fn mock_router(backend: SharedBackend) -> Router {
        Router::new()
            .route("/api/datasets", get(get_datasets).post(save_datasets))
            .route("/api/train", post(train))
            .route("/api/predict/:part_number", get(predict))
            .with_state(backend)
    }

    /// Serves the mock backend on an ephemeral local port.
    pub async fn spawn_backend(backend: MockBackend) -> (SocketAddr, SharedBackend) {
        let shared = Arc::new(Mutex::new(backend));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let app = mock_router(shared.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend stopped");
        });
        (addr, shared)
    }

    fn series(start: &str, demands: &[f64]) -> Vec<HistoricalPoint> {
        let first: Period = start.parse().unwrap();
        std::iter::once(first)
            .chain(first.following(demands.len() - 1).unwrap())
            .zip(demands)
            .map(|(month, demand)| HistoricalPoint::observed(month, *demand))
            .collect()
    }

    /// Two part numbers, `PN-200` first so key order is observable.
    pub fn sample_datasets() -> Datasets {
        let mut datasets = Datasets::new();
        datasets.insert(
            "PN-200".to_string(),
            EntityRecord::new(
                series("2024-07", &[120.0, 125.0, 131.0, 128.0, 140.0, 152.0]),
                vec![],
            ),
        );
        datasets.insert(
            "PN-100".to_string(),
            EntityRecord::new(series("2024-01", &[90.0, 88.0, 95.0]), vec![]),
        );
        datasets
    }

    pub fn test_config(addr: SocketAddr) -> AppConfig {
        AppConfig::new(&format!("http://{addr}"), 5_000)
            .expect("Mock backend URL is valid")
            .with_seed(Some(7))
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level comes from RUST_LOG and defaults to WARN.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}
