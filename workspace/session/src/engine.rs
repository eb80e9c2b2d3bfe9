//! Async driver around [`Dashboard`].
//!
//! All dashboard state lives on the task that owns the engine. Backend calls
//! run on a [`JoinSet`] and only their results travel back, one at a time, so
//! the store needs no locking.
//!
//! Every spawned call is remembered by task id together with the [`Flow`] it
//! belongs to. A task that dies without answering (panic, abort) is turned
//! into a failed completion of that flow, so the dashboard still settles its
//! generation and shows the matching error.

use std::collections::HashMap;
use std::sync::Arc;

use common::TrainRequest;
use compute::DemandSampler;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, AbortHandle, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::api_client::DemandApi;
use crate::dashboard::Dashboard;
use crate::error::{ApiError, Result};
use crate::events::{Completion, Flow, Request};
use crate::view::DashboardView;

/// User actions accepted by [`SyncEngine::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(String),
    AddData,
    Retrain,
}

pub struct SyncEngine {
    dashboard: Dashboard,
    api: Arc<dyn DemandApi>,
    sampler: DemandSampler,
    in_flight: JoinSet<Completion>,
    flows: HashMap<task::Id, Flow>,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn DemandApi>, sampler: DemandSampler) -> Self {
        Self {
            dashboard: Dashboard::new(),
            api,
            sampler,
            in_flight: JoinSet::new(),
            flows: HashMap::new(),
        }
    }

    /// Kicks off the initial dataset load.
    pub fn start(&mut self) {
        let requests = self.dashboard.start();
        self.dispatch(requests);
    }

    pub fn select(&mut self, key: impl Into<String>) {
        let requests = self.dashboard.select(key);
        self.dispatch(requests);
    }

    pub fn retrain(&mut self) {
        let requests = self.dashboard.retrain();
        self.dispatch(requests);
    }

    /// Appends one synthetic observation to the active part number.
    pub fn add_data(&mut self) -> Result<()> {
        let demand = self.sampler.sample();
        let requests = self.dashboard.add_data(demand)?;
        self.dispatch(requests);
        Ok(())
    }

    pub fn handle(&mut self, command: Command) {
        debug!(?command, "Handling command");
        match command {
            Command::Select(key) => self.select(key),
            Command::Retrain => self.retrain(),
            Command::AddData => {
                if let Err(err) = self.add_data() {
                    warn!(%err, "Add data rejected");
                }
            }
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn view(&self) -> DashboardView {
        self.dashboard.view()
    }

    /// Number of backend calls still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Waits for the next backend call to finish and applies it.
    ///
    /// Returns `false` when nothing was in flight.
    pub async fn next_completion(&mut self) -> bool {
        match self.in_flight.join_next_with_id().await {
            Some(joined) => {
                self.absorb(joined);
                true
            }
            None => false,
        }
    }

    /// Applies completions until no backend call is left running, including
    /// any follow-up calls they trigger.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Loads the datasets, then processes commands until the channel closes and
    /// in-flight work has drained. A fresh view is published after every step.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        views: watch::Sender<DashboardView>,
    ) -> Dashboard {
        info!("Dashboard session started");
        self.start();

        let mut commands_open = true;
        loop {
            views.send_replace(self.view());
            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                joined = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    if let Some(joined) = joined {
                        self.absorb(joined);
                    }
                },
                else => break,
            }
        }

        views.send_replace(self.view());
        info!("Dashboard session finished");
        self.dashboard
    }

    fn absorb(&mut self, joined: std::result::Result<(task::Id, Completion), JoinError>) {
        let completion = match joined {
            Ok((id, completion)) => {
                self.flows.remove(&id);
                completion
            }
            Err(err) => {
                let Some(flow) = self.flows.remove(&err.id()) else {
                    error!(%err, "Untracked backend task did not complete");
                    return;
                };
                error!(%err, ?flow, "Backend task did not complete");
                flow.fail(ApiError::Task(err.to_string()))
            }
        };
        let requests = self.dashboard.apply(completion);
        self.dispatch(requests);
    }

    fn dispatch(&mut self, requests: Vec<Request>) {
        for request in requests {
            self.spawn(request);
        }
    }

    fn spawn(&mut self, request: Request) {
        let flow = request.flow();
        let handle = self.spawn_call(request);
        self.flows.insert(handle.id(), flow);
    }

    fn spawn_call(&mut self, request: Request) -> AbortHandle {
        let api = Arc::clone(&self.api);
        match request {
            Request::LoadDatasets => self
                .in_flight
                .spawn(async move { Completion::Loaded(api.fetch_datasets().await) }),
            Request::Train {
                key,
                generation,
                historical,
            } => {
                let body = TrainRequest {
                    part_number: key.clone(),
                    historical_data: historical,
                };
                self.in_flight.spawn(async move {
                    let result = api.train(&body).await;
                    Completion::Trained {
                        key,
                        generation,
                        result,
                    }
                })
            }
            Request::Predict {
                key,
                generation,
                last_date,
            } => self.in_flight.spawn(async move {
                let result = api.predict(&key, last_date).await;
                Completion::Predicted {
                    key,
                    generation,
                    result,
                }
            }),
            Request::Save {
                key,
                sequence,
                datasets,
            } => self.in_flight.spawn(async move {
                let result = api.save_datasets(&datasets).await.map(|ack| {
                    debug!(message = %ack.message, sequence, "Save acknowledged");
                });
                Completion::Saved {
                    key,
                    sequence,
                    result,
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use common::{Datasets, EntityRecord, ForecastResponse, HistoricalPoint, Period, PredictionPoint, SaveResponse};
    use compute::{DEFAULT_MAX_DEMAND, DEFAULT_MIN_DEMAND};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Reply = std::result::Result<ForecastResponse, ApiError>;

    /// Backend whose train calls block until the test answers them.
    #[derive(Default)]
    struct ScriptedApi {
        datasets: Datasets,
        trains: Mutex<VecDeque<oneshot::Sender<Reply>>>,
        predictions: Mutex<Vec<Period>>,
        saves: Mutex<Vec<Datasets>>,
    }

    impl ScriptedApi {
        fn with_datasets(datasets: Datasets) -> Arc<Self> {
            Arc::new(Self {
                datasets,
                ..Default::default()
            })
        }

        fn waiting_trains(&self) -> usize {
            self.trains.lock().unwrap().len()
        }

        fn answer_train(&self, index: usize, reply: Reply) {
            let sender = self.trains.lock().unwrap().remove(index).unwrap();
            sender.send(reply).unwrap();
        }
    }

    #[async_trait]
    impl DemandApi for ScriptedApi {
        async fn fetch_datasets(&self) -> std::result::Result<Datasets, ApiError> {
            Ok(self.datasets.clone())
        }

        async fn save_datasets(&self, datasets: &Datasets) -> std::result::Result<SaveResponse, ApiError> {
            self.saves.lock().unwrap().push(datasets.clone());
            Ok(SaveResponse {
                message: "Dataset saved successfully".to_string(),
            })
        }

        async fn train(&self, _request: &TrainRequest) -> Reply {
            let (sender, receiver) = oneshot::channel();
            self.trains.lock().unwrap().push_back(sender);
            receiver.await.unwrap_or_else(|_| {
                Err(ApiError::Status {
                    status: 499,
                    message: "abandoned".to_string(),
                })
            })
        }

        async fn predict(&self, _part_number: &str, last_date: Period) -> Reply {
            self.predictions.lock().unwrap().push(last_date);
            Ok(forecast(last_date.next().unwrap(), 140.0, 77.0))
        }
    }

    /// Backend whose calls crash instead of answering. Without datasets the
    /// initial load crashes too.
    struct CrashingApi {
        datasets: Option<Datasets>,
    }

    #[async_trait]
    impl DemandApi for CrashingApi {
        async fn fetch_datasets(&self) -> std::result::Result<Datasets, ApiError> {
            match &self.datasets {
                Some(datasets) => Ok(datasets.clone()),
                None => panic!("dataset fetch crashed"),
            }
        }

        async fn save_datasets(&self, _datasets: &Datasets) -> std::result::Result<SaveResponse, ApiError> {
            panic!("save crashed")
        }

        async fn train(&self, _request: &TrainRequest) -> Reply {
            panic!("training crashed")
        }

        async fn predict(&self, _part_number: &str, _last_date: Period) -> Reply {
            panic!("prediction crashed")
        }
    }

    fn forecast(month: Period, prediction: f64, confidence: f64) -> ForecastResponse {
        ForecastResponse {
            predictions: vec![PredictionPoint { month, prediction }],
            confidence,
        }
    }

    fn datasets() -> Datasets {
        let january: Period = "2024-01".parse().unwrap();
        let mut datasets = Datasets::new();
        datasets.insert(
            "PN-1".to_string(),
            EntityRecord::new(
                vec![
                    HistoricalPoint::observed(january, 100.0),
                    HistoricalPoint::observed(january.next().unwrap(), 105.0),
                ],
                vec![],
            ),
        );
        datasets
    }

    async fn wait_for_trains(api: &ScriptedApi, count: usize) {
        while api.waiting_trains() < count {
            tokio::task::yield_now().await;
        }
    }

    fn sampler() -> DemandSampler {
        DemandSampler::seeded(DEFAULT_MIN_DEMAND, DEFAULT_MAX_DEMAND, 1).unwrap()
    }

    fn engine(api: Arc<ScriptedApi>) -> SyncEngine {
        SyncEngine::new(api, sampler())
    }

    #[tokio::test]
    async fn test_late_response_from_older_training_is_discarded() {
        let api = ScriptedApi::with_datasets(datasets());
        let mut engine = engine(api.clone());

        engine.start();
        assert!(engine.next_completion().await, "load completes");
        wait_for_trains(&api, 1).await;
        engine.retrain();
        wait_for_trains(&api, 2).await;

        let march: Period = "2024-03".parse().unwrap();
        // Newer request (B) answers first, the older one (A) afterwards
        api.answer_train(1, Ok(forecast(march, 222.0, 66.0)));
        assert!(engine.next_completion().await);
        api.answer_train(0, Ok(forecast(march, 111.0, 11.0)));
        assert!(engine.next_completion().await);

        let record = engine.dashboard().store().get("PN-1").unwrap();
        assert_eq!(record.predictions[0].prediction, 222.0);
        assert_eq!(engine.dashboard().confidence(), 66.0);
        assert!(!engine.dashboard().is_loading());
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_add_data_predicts_and_saves() {
        let api = ScriptedApi::with_datasets(datasets());
        let mut engine = engine(api.clone());

        engine.start();
        engine.next_completion().await;
        engine.add_data().unwrap();

        // The retrain for the appended point blocks; everything else runs through
        wait_for_trains(&api, 2).await;
        while engine.dashboard().store().get("PN-1").unwrap().predictions.is_empty() {
            engine.next_completion().await;
        }
        while api.saves.lock().unwrap().is_empty() {
            engine.next_completion().await;
        }

        let history = &engine.dashboard().store().get("PN-1").unwrap().historical_data;
        assert_eq!(history.len(), 3);
        let appended = history[2].demand;
        assert!((110.0..160.0).contains(&appended));
        assert_eq!(*api.predictions.lock().unwrap(), vec!["2024-03".parse::<Period>().unwrap()]);

        let saved = api.saves.lock().unwrap()[0].clone();
        assert_eq!(saved["PN-1"].historical_data[2].demand, appended);
        assert_eq!(engine.dashboard().confidence(), 77.0);
        assert!(!engine.view().pending_prediction);

        // Unblock the superseded trainings so the engine can settle
        api.answer_train(0, Ok(forecast("2024-04".parse().unwrap(), 1.0, 1.0)));
        api.answer_train(0, Ok(forecast("2024-04".parse().unwrap(), 1.0, 1.0)));
        engine.settle().await;
        assert_eq!(engine.dashboard().confidence(), 77.0);
    }

    #[tokio::test]
    async fn test_crashed_training_settles_with_error() {
        let api = Arc::new(CrashingApi {
            datasets: Some(datasets()),
        });
        let mut engine = SyncEngine::new(api, sampler());

        engine.start();
        engine.settle().await;

        let dashboard = engine.dashboard();
        assert_eq!(engine.in_flight(), 0);
        assert!(!dashboard.is_loading());
        let error = dashboard.error().unwrap();
        assert!(error.starts_with("Failed to train model: Backend task failed"), "{error}");
        assert!(engine.view().combined.iter().all(|point| point.prediction.is_none()));
    }

    #[tokio::test]
    async fn test_crashed_load_settles_with_error() {
        let mut engine = SyncEngine::new(Arc::new(CrashingApi { datasets: None }), sampler());

        engine.start();
        engine.settle().await;

        let dashboard = engine.dashboard();
        assert!(!dashboard.is_loading());
        assert!(dashboard.store().is_empty());
        let error = dashboard.error().unwrap();
        assert!(error.starts_with("Failed to load initial data: Backend task failed"), "{error}");
    }

    #[tokio::test]
    async fn test_crashed_prediction_keeps_point_pending() {
        let api = Arc::new(CrashingApi {
            datasets: Some(datasets()),
        });
        let mut engine = SyncEngine::new(api, sampler());
        engine.start();
        engine.settle().await;

        engine.add_data().unwrap();
        engine.settle().await;

        let dashboard = engine.dashboard();
        assert!(!dashboard.is_loading());
        assert!(dashboard.is_pending_prediction("PN-1"));
        assert_eq!(dashboard.store().get("PN-1").unwrap().historical_data.len(), 3);
        let error = dashboard.error().unwrap();
        assert!(error.starts_with("Failed to update data: Backend task failed"), "{error}");
    }

    #[tokio::test]
    async fn test_run_processes_commands_until_channel_closes() {
        let api = ScriptedApi::with_datasets(datasets());
        let (commands, receiver) = mpsc::channel(8);
        let (views, mut view_rx) = watch::channel(Dashboard::new().view());

        let handle = tokio::spawn(engine(api.clone()).run(receiver, views));

        wait_for_trains(&api, 1).await;
        api.answer_train(0, Ok(forecast("2024-03".parse().unwrap(), 150.0, 91.0)));

        view_rx
            .wait_for(|view| view.confidence == 91.0)
            .await
            .unwrap();

        commands.send(Command::Select("missing".to_string())).await.unwrap();
        drop(commands);

        let dashboard = handle.await.unwrap();
        assert_eq!(dashboard.active(), Some("missing"));
        assert_eq!(dashboard.confidence(), 91.0);
        assert!(!dashboard.is_loading());
    }
}
