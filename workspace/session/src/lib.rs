//! Dashboard session for the demand forecasting backend.
//!
//! [`Dashboard`] is the synchronous core (store, selection, ordering of
//! backend responses), [`SyncEngine`] drives it against a [`DemandApi`], and
//! [`DashboardView`] is what a renderer consumes.

pub mod api_client;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod events;
pub mod selection;
pub mod settings;
pub mod store;
pub mod view;

pub use api_client::{DemandApi, HttpDemandApi};
pub use dashboard::{Dashboard, DEFAULT_CONFIDENCE};
pub use engine::{Command, SyncEngine};
pub use error::{ApiError, StoreError, SyncError};
pub use events::{Completion, Event, Flow, Generation, Request, SaveSequence};
pub use selection::{Projection, SelectionController};
pub use settings::{ApiSettings, DEFAULT_API_URL, DEFAULT_TIMEOUT_MS};
pub use store::{DatasetStore, EntityPatch};
pub use view::DashboardView;
