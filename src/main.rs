use axum::{
    Router,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{IntoParams, OpenApi, ToSchema};

use fedora_core::config::{
    data_dir_from_env_value, shard_layout_from_env_value, store_dir_from_env_value,
};
use fedora_core::constants::{
    DATA_DIR_ENV, DATASTREAM_STORE_ENV, OBJECT_STORE_ENV, SHARD_LAYOUT_ENV,
};
use fedora_core::paths::{DatastreamStoreDir, ObjectStoreDir};
use fedora_core::{
    CoreConfig, CoreError, DatastreamLocation, DatastreamLookup, FoxmlReader, LocatorService,
    MetadataError, ObjectLocation,
};

/// Environment variable holding the HTTP bind address.
const ADDR_ENV: &str = "FEDORA_LOCATE_ADDR";

/// Application state shared across REST API handlers
///
/// Holds the locator built from startup configuration. The locator is immutable, so handlers
/// share it through an `Arc` without locking.
#[derive(Clone)]
struct AppState {
    locator: Arc<LocatorService<FoxmlReader>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
struct HealthRes {
    status: String,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
struct PidQuery {
    /// Object PID or datastream filename; `+` is kept literally
    pid: String,
}

impl PidQuery {
    fn from_raw(raw: Option<&str>) -> Result<Self, ApiError> {
        Ok(Self {
            pid: query_value(raw, "pid")?,
        })
    }
}

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
struct DatastreamQuery {
    /// Object PID
    pid: String,
    /// Datastream ID, e.g. OBJ
    dsid: String,
}

impl DatastreamQuery {
    fn from_raw(raw: Option<&str>) -> Result<Self, ApiError> {
        Ok(Self {
            pid: query_value(raw, "pid")?,
            dsid: query_value(raw, "dsid")?,
        })
    }
}

/// Looks up `name` in a raw query string.
///
/// Percent escapes are decoded but `+` is not turned into a space: it is the datastream
/// separator in Fedora identifiers, so `pid=test:1+OBJ` means `test:1+OBJ`.
fn query_value(raw: Option<&str>, name: &str) -> Result<String, ApiError> {
    for pair in raw.unwrap_or("").split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(key)? == name {
            return decode_component(value);
        }
    }
    Err(ApiError::bad_request(format!(
        "missing query parameter `{}`",
        name
    )))
}

fn decode_component(component: &str) -> Result<String, ApiError> {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ApiError::bad_request(format!("invalid query encoding: {}", e)))
}

#[derive(Serialize, ToSchema)]
struct ResolveRes {
    identifier: String,
    canonical_uri: String,
    digest: String,
    shard_path: String,
    encoded_uri: String,
    relative_path: String,
    metadata_path: String,
}

#[derive(Serialize, ToSchema)]
struct DatastreamRes {
    datastream_id: String,
    filename: String,
    control_group: String,
    version_id: Option<String>,
    label: Option<String>,
    mime_type: Option<String>,
    size: Option<u64>,
    relative_path: String,
    path: String,
}

impl From<DatastreamLocation> for DatastreamRes {
    fn from(location: DatastreamLocation) -> Self {
        let record = location.record;
        Self {
            datastream_id: record.datastream_id.to_string(),
            filename: record.filename,
            control_group: record.control_group.code().to_owned(),
            version_id: record.version_id,
            label: record.label,
            mime_type: record.mime_type,
            size: record.size,
            relative_path: location.relative_path,
            path: location.path.display().to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ObjectRes {
    pid: String,
    metadata_path: String,
    datastreams: Vec<DatastreamRes>,
}

impl From<ObjectLocation> for ObjectRes {
    fn from(object: ObjectLocation) -> Self {
        Self {
            pid: object.pid,
            metadata_path: object.metadata_path.display().to_string(),
            datastreams: object.datastreams.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
struct ErrorRes {
    /// `bad_request`, `not_found`, `unreadable`, `no_such_datastream` or `internal`
    kind: String,
    error: String,
}

struct ApiError {
    status: StatusCode,
    body: ErrorRes,
}

impl ApiError {
    fn new(status: StatusCode, kind: &str, error: String) -> Self {
        Self {
            status,
            body: ErrorRes {
                kind: kind.to_owned(),
                error,
            },
        }
    }

    fn bad_request(error: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", error)
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            error.to_string(),
        )
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err.as_metadata() {
            Some(MetadataError::NotFound { .. }) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            Some(MetadataError::Unreadable { .. }) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "unreadable",
                err.to_string(),
            ),
            None => Self::internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, resolve, object, datastream),
    components(schemas(HealthRes, ResolveRes, DatastreamRes, ObjectRes, ErrorRes))
)]
struct ApiDoc;

/// Main entry point for the Fedora locate service
///
/// Serves a read-only REST API on port 3000 (configurable via FEDORA_LOCATE_ADDR).
///
/// # Environment Variables
/// - `FEDORA_DATA_DIR`: Repository base directory (required, absolute)
/// - `FEDORA_SHARD_LAYOUT`: `split` (default) or a `#` pattern such as `##`
/// - `FEDORA_OBJECT_STORE`: Object store directory name (default: "objectStore")
/// - `FEDORA_DATASTREAM_STORE`: Datastream store directory name (default: "datastreamStore")
/// - `FEDORA_LOCATE_ADDR`: REST server address (default: "0.0.0.0:3000")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from_env()?;
    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!(
        data_dir = %config.data_dir().display(),
        layout = %config.shard_layout(),
        "++ Starting Fedora locate REST on {}",
        addr
    );

    let state = AppState {
        locator: Arc::new(LocatorService::new(&config, FoxmlReader::new())),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn log_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("fedora_locate_run=info".parse()?)
        .add_directive("fedora_foxml=warn".parse()?))
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    let env = |key: &str| std::env::var(key).ok();

    let data_dir = data_dir_from_env_value(env(DATA_DIR_ENV))?;
    let layout = shard_layout_from_env_value(env(SHARD_LAYOUT_ENV))?;
    let config = CoreConfig::new(data_dir, layout)?.with_store_dirs(
        store_dir_from_env_value(env(OBJECT_STORE_ENV), ObjectStoreDir::NAME),
        store_dir_from_env_value(env(DATASTREAM_STORE_ENV), DatastreamStoreDir::NAME),
    )?;

    Ok(config)
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resolve", get(resolve))
        .route("/objects", get(object))
        .route("/datastreams", get(datastream))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    get,
    path = "/resolve",
    params(PidQuery),
    responses(
        (status = 200, description = "Resolution of the identifier", body = ResolveRes),
        (status = 400, description = "Missing or badly encoded pid", body = ErrorRes)
    )
)]
/// Resolve an identifier to its storage path
///
/// Pure computation: the filesystem is not touched.
async fn resolve(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ResolveRes>, ApiError> {
    let query = PidQuery::from_raw(raw.as_deref())?;
    let resolution = state.locator.explain(&query.pid);
    let metadata_path = state.locator.object_path(&query.pid);

    Ok(Json(ResolveRes {
        identifier: resolution.identifier,
        canonical_uri: resolution.canonical_uri.to_string(),
        digest: resolution.digest.to_string(),
        shard_path: resolution.shard_path,
        encoded_uri: resolution.encoded_uri,
        relative_path: resolution.relative_path,
        metadata_path: metadata_path.display().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/objects",
    params(PidQuery),
    responses(
        (status = 200, description = "Metadata record and datastream locations", body = ObjectRes),
        (status = 400, description = "Missing or badly encoded pid", body = ErrorRes),
        (status = 404, description = "Metadata record not found", body = ErrorRes),
        (status = 422, description = "Metadata record unreadable", body = ErrorRes)
    )
)]
/// Locate an object's metadata record and all of its managed datastreams
async fn object(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ObjectRes>, ApiError> {
    let query = PidQuery::from_raw(raw.as_deref())?;
    let locator = Arc::clone(&state.locator);
    let object = tokio::task::spawn_blocking(move || locator.locate_object(&query.pid))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(object.into()))
}

#[utoipa::path(
    get,
    path = "/datastreams",
    params(DatastreamQuery),
    responses(
        (status = 200, description = "Datastream location", body = DatastreamRes),
        (status = 400, description = "Missing or badly encoded pid or dsid", body = ErrorRes),
        (
            status = 404,
            description = "No such datastream, or metadata record not found",
            body = ErrorRes
        ),
        (status = 422, description = "Metadata record unreadable", body = ErrorRes)
    )
)]
/// Locate one datastream of an object
async fn datastream(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<DatastreamRes>, ApiError> {
    let locator = Arc::clone(&state.locator);
    let DatastreamQuery { pid, dsid } = DatastreamQuery::from_raw(raw.as_deref())?;
    let (pid, dsid, lookup) = tokio::task::spawn_blocking(move || {
        let lookup = locator.locate_datastream(&pid, &dsid);
        (pid, dsid, lookup)
    })
    .await
    .map_err(ApiError::internal)?;

    match lookup? {
        DatastreamLookup::Found(location) => Ok(Json(location.into())),
        DatastreamLookup::NoSuchDatastream => {
            tracing::debug!(%pid, %dsid, "no such datastream");
            Err(ApiError::new(
                StatusCode::NOT_FOUND,
                "no_such_datastream",
                format!("no such datastream {} for object {}", dsid, pid),
            ))
        }
    }
}

/// OpenAPI document for the REST API
async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fedora_core::ShardLayout;
    use http_body_util::BodyExt;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const FOXML: &str = r#"<foxml:digitalObject VERSION="1.1" PID="test:1"
        xmlns:foxml="info:fedora/fedora-system:def/foxml#">
      <foxml:datastream ID="OBJ" CONTROL_GROUP="M">
        <foxml:datastreamVersion ID="OBJ.0" MIMETYPE="image/tiff">
          <foxml:contentLocation TYPE="INTERNAL_ID" REF="test:1+OBJ+OBJ.0"/>
        </foxml:datastreamVersion>
      </foxml:datastream>
    </foxml:digitalObject>"#;

    fn state(data_dir: &Path) -> AppState {
        let config = CoreConfig::new(data_dir.to_path_buf(), ShardLayout::Split).unwrap();
        AppState {
            locator: Arc::new(LocatorService::new(&config, FoxmlReader::new())),
        }
    }

    fn write_record(state: &AppState, pid: &str, contents: &str) {
        let path = state.locator.object_path(pid);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn resolve_returns_golden_path() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/resolve?pid=test%3A1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["canonical_uri"], "info:fedora/test:1");
        assert_eq!(json["digest"], "79da7bd9527b7ce9730d6a112a86755e");
        assert_eq!(
            json["relative_path"],
            "79/da/7bd9527b7ce9730d6a112a86755e/info%3Afedora%2Ftest%3A1"
        );
    }

    #[tokio::test]
    async fn resolve_keeps_plus_as_datastream_separator() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/resolve?pid=test:1+OBJ").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["identifier"], "test:1+OBJ");
        assert_eq!(
            json["relative_path"],
            "51/b3/bc87c922104a896f8cba5cd308b9/info%3Afedora%2Ftest%3A1%2FOBJ"
        );
    }

    #[tokio::test]
    async fn resolve_decodes_percent_escapes() {
        let dir = TempDir::new().unwrap();
        let (status, json) =
            get_json(state(dir.path()), "/resolve?pid=test%3A1%2BPDF%2B1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["relative_path"],
            "af/4d/1f9e7e7395653bc9d94eb8f10819/info%3Afedora%2Ftest%3A1%2FPDF%2F1"
        );
    }

    #[tokio::test]
    async fn resolve_without_pid_is_400() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/resolve?dsid=OBJ").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "bad_request");
    }

    #[tokio::test]
    async fn object_lists_datastreams() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        write_record(&state, "test:1", FOXML);

        let (status, json) = get_json(state, "/objects?pid=test:1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pid"], "test:1");
        assert_eq!(json["datastreams"][0]["datastream_id"], "OBJ");
        assert_eq!(json["datastreams"][0]["filename"], "test:1+OBJ+OBJ.0");
        assert_eq!(json["datastreams"][0]["control_group"], "M");
    }

    #[tokio::test]
    async fn object_missing_record_is_404() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/objects?pid=test:404").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "not_found");
    }

    #[tokio::test]
    async fn object_malformed_record_is_422() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        write_record(&state, "test:1", "<not-closed");

        let (status, json) = get_json(state, "/objects?pid=test:1").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["kind"], "unreadable");
    }

    #[tokio::test]
    async fn datastream_found() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        write_record(&state, "test:1", FOXML);
        let expected = state
            .locator
            .datastream_path("test:1+OBJ+OBJ.0")
            .display()
            .to_string();

        let (status, json) = get_json(state, "/datastreams?pid=test:1&dsid=OBJ").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mime_type"], "image/tiff");
        assert_eq!(json["path"], expected);
    }

    #[tokio::test]
    async fn datastream_absent_is_distinct_from_missing_record() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        write_record(&state, "test:1", FOXML);

        let (status, json) = get_json(state, "/datastreams?pid=test:1&dsid=TEXT").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "no_such_datastream");
    }

    #[tokio::test]
    async fn datastream_pid_with_plus_is_not_split_on_space() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        write_record(&state, "test:1+OBJ", FOXML);

        let (status, json) = get_json(state, "/datastreams?pid=test:1+OBJ&dsid=OBJ").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["filename"], "test:1+OBJ+OBJ.0");
    }

    #[test]
    fn log_filter_reports_reader_warnings() {
        assert!(log_filter().unwrap().to_string().contains("fedora_foxml=warn"));
    }

    #[test]
    fn query_value_keeps_plus_and_decodes_escapes() {
        let raw = Some("dsid=PDF&pid=demo%3A5+OBJ+1");

        assert_eq!(query_value(raw, "pid").ok().unwrap(), "demo:5+OBJ+1");
        assert_eq!(query_value(raw, "dsid").ok().unwrap(), "PDF");
        assert!(query_value(None, "pid").is_err());
    }

    #[tokio::test]
    async fn openapi_document_lists_paths() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(state(dir.path()), "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["paths"]["/resolve"].is_object());
        assert!(json["paths"]["/datastreams"].is_object());
    }
}
