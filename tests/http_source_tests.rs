//! End-to-end tests for the reqwest sources against an in-process server

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use citylog::api::{CitySource, RestApiSource, SourceConfig, SourceError, StaticJsonSource};
use citylog::provider::CitiesProvider;
use citylog::state::{CityRecord, NewCity, Position};

fn city(id: i64, name: &str) -> CityRecord {
    CityRecord {
        id,
        city_name: name.into(),
        country: "Portugal".into(),
        emoji: "🇵🇹".into(),
        date: "2027-10-31T15:59:59.138Z".parse().unwrap(),
        notes: String::new(),
        position: Position {
            lat: 38.72,
            lng: -9.14,
        },
    }
}

fn draft(name: &str) -> NewCity {
    NewCity {
        city_name: name.into(),
        country: "Spain".into(),
        emoji: "🇪🇸".into(),
        date: "2027-07-15T08:00:00Z".parse().unwrap(),
        notes: String::new(),
        position: Position {
            lat: 40.42,
            lng: -3.70,
        },
    }
}

#[derive(Clone)]
struct Backend {
    cities: Arc<Mutex<Vec<CityRecord>>>,
    next_id: Arc<AtomicI64>,
}

impl Backend {
    fn seeded(cities: Vec<CityRecord>) -> Self {
        let next_id = cities.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            cities: Arc::new(Mutex::new(cities)),
            next_id: Arc::new(AtomicI64::new(next_id)),
        }
    }
}

async fn list_cities(State(backend): State<Backend>) -> Json<Vec<CityRecord>> {
    Json(backend.cities.lock().unwrap().clone())
}

async fn get_city(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
) -> Result<Json<CityRecord>, StatusCode> {
    backend
        .cities
        .lock()
        .unwrap()
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_city(
    State(backend): State<Backend>,
    Json(draft): Json<NewCity>,
) -> (StatusCode, Json<CityRecord>) {
    let created = CityRecord {
        id: backend.next_id.fetch_add(1, Ordering::SeqCst),
        city_name: draft.city_name,
        country: draft.country,
        emoji: draft.emoji,
        date: draft.date,
        notes: draft.notes,
        position: draft.position,
    };
    backend.cities.lock().unwrap().push(created.clone());
    (StatusCode::CREATED, Json(created))
}

async fn delete_city(State(backend): State<Backend>, Path(id): Path<i64>) -> StatusCode {
    backend.cities.lock().unwrap().retain(|c| c.id != id);
    StatusCode::OK
}

fn rest_router(backend: Backend) -> Router {
    Router::new()
        .route("/cities", get(list_cities).post(create_city))
        .route("/cities/:id", get(get_city).delete(delete_city))
        .with_state(backend)
}

fn static_router(backend: Backend) -> Router {
    Router::new()
        .route("/data/cities.json", get(list_cities))
        .with_state(backend)
}

/// Bind an ephemeral port, serve the router, return the base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn rest_source_round_trips_all_four_operations() {
    let backend = Backend::seeded(vec![city(1, "Lisbon"), city(2, "Madrid")]);
    let base = serve(rest_router(backend)).await;
    let source = RestApiSource::new(base);

    let cities = source.list().await.unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].city_name, "Lisbon");

    let found = source.get(2).await.unwrap();
    assert_eq!(found.map(|c| c.city_name), Some("Madrid".to_string()));

    let created = source.create(draft("Barcelona")).await.unwrap();
    assert_eq!(created.id, 3);
    assert_eq!(created.city_name, "Barcelona");

    source.delete(1).await.unwrap();
    let after = source.list().await.unwrap();
    assert_eq!(after.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
}

#[tokio::test]
async fn rest_source_maps_not_found_to_none() {
    let backend = Backend::seeded(vec![city(1, "Lisbon")]);
    let base = serve(rest_router(backend)).await;
    let source = RestApiSource::new(base);

    assert_eq!(source.get(99).await.unwrap(), None);
}

#[tokio::test]
async fn rest_source_surfaces_error_statuses() {
    let router = Router::new().route("/cities", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = serve(router).await;
    let source = RestApiSource::new(base);

    match source.list().await {
        Err(SourceError::Status(status)) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected a status error, got {:?}", other.map(|c| c.len())),
    }
}

#[tokio::test]
async fn rest_source_surfaces_decode_failures() {
    let router = Router::new().route("/cities", get(|| async { "not json" }));
    let base = serve(router).await;
    let source = RestApiSource::new(base);

    assert!(matches!(source.list().await, Err(SourceError::Decode(_))));
}

#[tokio::test]
async fn static_source_reads_the_fixed_path_and_filters_client_side() {
    let backend = Backend::seeded(vec![city(1, "Lisbon"), city(2, "Madrid")]);
    let base = serve(static_router(backend)).await;
    let source = StaticJsonSource::new(format!("{}/data/cities.json", base));

    assert!(!source.writable());

    let cities = source.list().await.unwrap();
    assert_eq!(cities.len(), 2);

    // No per-item endpoint exists; the lookup filters the full array
    let found = source.get(2).await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(2));
    assert_eq!(source.get(99).await.unwrap(), None);

    assert!(matches!(
        source.create(draft("Barcelona")).await,
        Err(SourceError::ReadOnly("create"))
    ));
    assert!(matches!(
        source.delete(1).await,
        Err(SourceError::ReadOnly("delete"))
    ));
}

#[tokio::test]
async fn provider_connects_to_a_rest_backend_end_to_end() {
    let backend = Backend::seeded(vec![city(1, "Lisbon")]);
    let base = serve(rest_router(backend)).await;

    let provider = CitiesProvider::connect(SourceConfig::Rest { base_url: base }).await;
    assert_eq!(provider.snapshot().cities.len(), 1);

    let created = provider.create_city(draft("Barcelona")).await.unwrap();
    assert_eq!(provider.snapshot().selected_id(), Some(created.id));

    provider.delete_city(1).await.unwrap();
    let state = provider.snapshot();
    assert_eq!(state.cities.iter().map(|c| c.id).collect::<Vec<_>>(), vec![created.id]);
    assert_eq!(state.current_city, None);
    assert_eq!(state.error, "");
}

#[tokio::test]
async fn provider_connects_to_a_static_deployment() {
    let backend = Backend::seeded(vec![city(1, "Lisbon"), city(2, "Madrid")]);
    let base = serve(static_router(backend)).await;

    let provider = CitiesProvider::connect(SourceConfig::Static {
        url: format!("{}/data/cities.json", base),
    })
    .await;

    let state = provider.snapshot();
    assert_eq!(state.cities.len(), 2);
    assert_eq!(state.error, "");
}
