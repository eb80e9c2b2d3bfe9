//! Client side of the forecasting backend's HTTP API.

use async_trait::async_trait;
use common::{Datasets, ErrorResponse, ForecastResponse, Period, SaveResponse, TrainRequest};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::ApiError;
use crate::settings::ApiSettings;

/// Operations the dashboard needs from the backend.
#[async_trait]
pub trait DemandApi: Send + Sync {
    /// `GET /api/datasets`
    async fn fetch_datasets(&self) -> Result<Datasets, ApiError>;

    /// `POST /api/datasets` with the full mapping
    async fn save_datasets(&self, datasets: &Datasets) -> Result<SaveResponse, ApiError>;

    /// `POST /api/train`
    async fn train(&self, request: &TrainRequest) -> Result<ForecastResponse, ApiError>;

    /// `GET /api/predict/{part_number}?lastDate={period}`
    async fn predict(&self, part_number: &str, last_date: Period) -> Result<ForecastResponse, ApiError>;
}

/// [`DemandApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpDemandApi {
    settings: ApiSettings,
    http: Client,
}

impl HttpDemandApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, http })
    }

    /// Sends `request` and decodes a JSON body, turning non-2xx statuses into
    /// [`ApiError::Status`] carrying the backend's `error` message when present.
    async fn execute<T>(&self, label: &str, request: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            error!("{} - Request failed: {}", label, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} - Non-OK response: {}", label, status);
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => err.error,
                Err(_) => status.canonical_reason().unwrap_or("Unknown status").to_string(),
            };
            error!("{} - API error: {}", label, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        trace!("{} - Response received, parsing JSON", label);
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!("{} - Failed to parse response: {}", label, e);
            ApiError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl DemandApi for HttpDemandApi {
    #[instrument(skip(self))]
    async fn fetch_datasets(&self) -> Result<Datasets, ApiError> {
        let url = self.settings.endpoint(&["api", "datasets"])?;
        debug!("GET request to: {}", url);

        let datasets: Datasets = self.execute("GET /api/datasets", self.http.get(url)).await?;
        info!(entities = datasets.len(), "Fetched datasets");
        Ok(datasets)
    }

    #[instrument(skip(self, datasets), fields(entities = datasets.len()))]
    async fn save_datasets(&self, datasets: &Datasets) -> Result<SaveResponse, ApiError> {
        let url = self.settings.endpoint(&["api", "datasets"])?;
        debug!("POST request to: {}", url);

        let ack: SaveResponse = self
            .execute("POST /api/datasets", self.http.post(url).json(datasets))
            .await?;
        info!(message = %ack.message, "Saved datasets");
        Ok(ack)
    }

    #[instrument(skip(self, request), fields(part_number = %request.part_number, points = request.historical_data.len()))]
    async fn train(&self, request: &TrainRequest) -> Result<ForecastResponse, ApiError> {
        let url = self.settings.endpoint(&["api", "train"])?;
        debug!("POST request to: {}", url);

        let forecast: ForecastResponse = self
            .execute("POST /api/train", self.http.post(url).json(request))
            .await?;
        info!(confidence = forecast.confidence, "Model trained");
        Ok(forecast)
    }

    #[instrument(skip(self))]
    async fn predict(&self, part_number: &str, last_date: Period) -> Result<ForecastResponse, ApiError> {
        let url = self.settings.endpoint(&["api", "predict", part_number])?;
        debug!("GET request to: {} (lastDate={})", url, last_date);

        let request = self
            .http
            .get(url)
            .query(&[("lastDate", last_date.to_string())]);
        let forecast: ForecastResponse = self.execute("GET /api/predict", request).await?;
        info!(confidence = forecast.confidence, "Prediction received");
        Ok(forecast)
    }
}
