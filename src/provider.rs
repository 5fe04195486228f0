//! Owned city state and the data-access functions that mutate it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

use crate::action::Action;
use crate::api::{CitySource, SourceConfig, SourceError};
use crate::reducer::reduce;
use crate::state::{AppState, CityRecord, NewCity};

/// Fixed failure messages, one per operation
pub const LOAD_CITIES_FAILED: &str = "Error while loading the cities";
pub const GET_CITY_FAILED: &str = "Error while getting the city";
pub const CREATE_CITY_FAILED: &str = "Error while creating the city";
pub const DELETE_CITY_FAILED: &str = "Error while deleting the city";

const LOCK_POISONED: &str = "city state lock poisoned";
const OUT_OF_SCOPE: &str = "CitiesHandle used after its provider was dropped";

/// What a data-access function reports back to its caller, over and above
/// the transition it dispatched into shared state.
#[derive(Debug)]
pub enum DataError {
    /// The underlying request or decode failed; the operation's fixed
    /// message was dispatched as `FetchDidError`
    Source(SourceError),
    /// Create/delete against a source that does not accept writes;
    /// nothing was dispatched
    ReadOnlySource,
    /// A newer call to the same operation was issued while this one was in
    /// flight; the response was discarded without a dispatch
    Superseded,
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Source(e) => write!(f, "{}", e),
            DataError::ReadOnlySource => {
                write!(f, "The configured city source does not accept writes")
            }
            DataError::Superseded => {
                write!(f, "Response discarded: a newer request superseded it")
            }
        }
    }
}

impl std::error::Error for DataError {}

/// Monotonic ticket counter for one operation kind. A response is applied
/// only if its ticket is still the latest issued.
struct OpSeq(AtomicU64);

impl OpSeq {
    const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

struct Inner {
    source: Arc<dyn CitySource>,
    state: Mutex<AppState>,
    list_seq: OpSeq,
    get_seq: OpSeq,
    create_seq: OpSeq,
    delete_seq: OpSeq,
}

/// The single source of truth for the city collection.
///
/// State is mutated exclusively by dispatching [`Action`]s through the
/// reducer; the lock is held only for the dispatch or a snapshot, never
/// across an await. Clones share the same state.
#[derive(Clone)]
pub struct CitiesProvider {
    inner: Arc<Inner>,
}

impl CitiesProvider {
    /// Provider over the given source with empty initial state; no I/O.
    pub fn new(source: Arc<dyn CitySource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                state: Mutex::new(AppState::default()),
                list_seq: OpSeq::new(),
                get_seq: OpSeq::new(),
                create_seq: OpSeq::new(),
                delete_seq: OpSeq::new(),
            }),
        }
    }

    /// Provider that immediately performs its one automatic list load.
    /// A failed initial load lands in `state.error` like any other failure.
    pub async fn init(source: Arc<dyn CitySource>) -> Self {
        let provider = Self::new(source);
        if let Err(e) = provider.load_cities().await {
            warn!(error = %e, "initial city load failed");
        }
        provider
    }

    /// Build the source described by `config`, then [`init`](Self::init).
    pub async fn connect(config: SourceConfig) -> Self {
        Self::init(config.build()).await
    }

    /// A scope-checked view for consumers. The handle fails fast when used
    /// after every provider clone has been dropped.
    pub fn handle(&self) -> CitiesHandle {
        CitiesHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Read-only copy of `{cities, is_loading, current_city, error}`
    pub fn snapshot(&self) -> AppState {
        self.inner.state.lock().expect(LOCK_POISONED).clone()
    }

    fn dispatch(&self, action: Action) {
        let mut state = self.inner.state.lock().expect(LOCK_POISONED);
        reduce(&mut state, action);
    }

    /// Fetch the full collection and replace the list in state.
    pub async fn load_cities(&self) -> Result<Vec<CityRecord>, DataError> {
        let ticket = self.inner.list_seq.begin();
        debug!(ticket, "loading city list");
        self.dispatch(Action::FetchStarted);

        let outcome = self.inner.source.list().await;
        if !self.inner.list_seq.is_current(ticket) {
            debug!(ticket, "discarding superseded city list response");
            return Err(DataError::Superseded);
        }
        match outcome {
            Ok(cities) => {
                self.dispatch(Action::CitiesDidLoad(cities.clone()));
                Ok(cities)
            }
            Err(e) => {
                warn!(error = %e, "city list load failed");
                self.dispatch(Action::FetchDidError(LOAD_CITIES_FAILED.to_string()));
                Err(DataError::Source(e))
            }
        }
    }

    /// Fetch one city by id and make it the current selection.
    ///
    /// Short-circuits with no dispatch and no request when the selection
    /// already has this id; the cached record may be stale.
    pub async fn get_city(&self, id: i64) -> Result<Option<CityRecord>, DataError> {
        {
            let state = self.inner.state.lock().expect(LOCK_POISONED);
            if state.selected_id() == Some(id) {
                return Ok(state.current_city.clone());
            }
        }

        let ticket = self.inner.get_seq.begin();
        debug!(ticket, id, "loading city");
        self.dispatch(Action::FetchStarted);

        let outcome = self.inner.source.get(id).await;
        if !self.inner.get_seq.is_current(ticket) {
            debug!(ticket, id, "discarding superseded city response");
            return Err(DataError::Superseded);
        }
        match outcome {
            Ok(city) => {
                self.dispatch(Action::CityDidLoad(city.clone()));
                Ok(city)
            }
            Err(e) => {
                warn!(error = %e, id, "city load failed");
                self.dispatch(Action::FetchDidError(GET_CITY_FAILED.to_string()));
                Err(DataError::Source(e))
            }
        }
    }

    /// Submit a new city; on success the created record (with its assigned
    /// id) is appended to the list and becomes the current selection.
    pub async fn create_city(&self, draft: NewCity) -> Result<CityRecord, DataError> {
        if !self.inner.source.writable() {
            return Err(DataError::ReadOnlySource);
        }

        let ticket = self.inner.create_seq.begin();
        debug!(ticket, city = %draft.city_name, "creating city");
        self.dispatch(Action::FetchStarted);

        let outcome = self.inner.source.create(draft).await;
        if !self.inner.create_seq.is_current(ticket) {
            debug!(ticket, "discarding superseded create response");
            return Err(DataError::Superseded);
        }
        match outcome {
            Ok(city) => {
                self.dispatch(Action::CityDidCreate(city.clone()));
                Ok(city)
            }
            Err(e) => {
                warn!(error = %e, "city create failed");
                self.dispatch(Action::FetchDidError(CREATE_CITY_FAILED.to_string()));
                Err(DataError::Source(e))
            }
        }
    }

    /// Remove the city with the given id from the backend and the list.
    /// The deletion is applied locally whatever the response body says.
    pub async fn delete_city(&self, id: i64) -> Result<(), DataError> {
        if !self.inner.source.writable() {
            return Err(DataError::ReadOnlySource);
        }

        let ticket = self.inner.delete_seq.begin();
        debug!(ticket, id, "deleting city");
        self.dispatch(Action::FetchStarted);

        let outcome = self.inner.source.delete(id).await;
        if !self.inner.delete_seq.is_current(ticket) {
            debug!(ticket, id, "discarding superseded delete response");
            return Err(DataError::Superseded);
        }
        match outcome {
            Ok(()) => {
                self.dispatch(Action::CityDidDelete(id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id, "city delete failed");
                self.dispatch(Action::FetchDidError(DELETE_CITY_FAILED.to_string()));
                Err(DataError::Source(e))
            }
        }
    }
}

/// Consumer-facing view of a [`CitiesProvider`].
///
/// Holds no strong reference: dropping the last provider clone is
/// teardown, and every accessor on a surviving handle panics. Using the
/// state outside its provider's lifetime is a programming error, not a
/// recoverable condition.
#[derive(Clone)]
pub struct CitiesHandle {
    inner: Weak<Inner>,
}

impl CitiesHandle {
    fn provider(&self) -> CitiesProvider {
        match self.inner.upgrade() {
            Some(inner) => CitiesProvider { inner },
            None => panic!("{}", OUT_OF_SCOPE),
        }
    }

    pub fn snapshot(&self) -> AppState {
        self.provider().snapshot()
    }

    pub fn cities(&self) -> Vec<CityRecord> {
        self.snapshot().cities
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    pub fn current_city(&self) -> Option<CityRecord> {
        self.snapshot().current_city
    }

    pub fn error(&self) -> String {
        self.snapshot().error
    }

    pub async fn load_cities(&self) -> Result<Vec<CityRecord>, DataError> {
        self.provider().load_cities().await
    }

    pub async fn get_city(&self, id: i64) -> Result<Option<CityRecord>, DataError> {
        self.provider().get_city(id).await
    }

    pub async fn create_city(&self, draft: NewCity) -> Result<CityRecord, DataError> {
        self.provider().create_city(draft).await
    }

    pub async fn delete_city(&self, id: i64) -> Result<(), DataError> {
        self.provider().delete_city(id).await
    }
}
