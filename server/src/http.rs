use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use platform_api::{ApiError, ApiResult};
use products_hr::{
    Department, DepartmentDraft, DepartmentOperations, Employee, EmployeeOperations, HrError,
    NativeId,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dto::{DepartmentDocumentView, EmployeeDocumentView, EmployeeView, NewDepartment, NewEmployee},
};

const MIRROR_STATUS: &str = "x-mirror-status";

const RELATIONAL_READ: &str = "Error retrieving data from the database";
const DOCUMENT_READ: &str = "Error retrieving data from MongoDB";
const COMBINED_READ: &str = "Error retrieving data from both the database and MongoDB";
const CREATE_FAILED: &str = "Error creating the record";

#[derive(Clone)]
pub struct AppState {
    pub departments: Arc<dyn DepartmentOperations>,
    pub employees: Arc<dyn EmployeeOperations>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "office server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(AllowOrigin::list(allowed))
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    let cors = cors_layer(&state.config.cors_allowed_origins);
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/departments", department_routes())
        .nest("/api/employees", employee_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn department_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department))
        .route("/from-sql", get(list_departments))
        .route("/from-sql/{id}", get(get_department))
        .route("/from-mongo", get(list_department_documents))
        .route("/from-mongo/{id}", get(get_department_document))
        .route("/combined", get(combined_departments))
        .route("/aggregated", get(aggregated_departments))
}

fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/mongo", get(list_employee_documents))
        .route("/mongo/{id}", get(get_employee_document))
        .route("/from-sql/{id}", get(get_employee))
        .route("/combined", get(combined_employees))
}

/// Maps a core error onto the boundary: absent input is the caller's fault,
/// everything else is masked behind `message`.
fn hr_error(message: &'static str) -> impl FnOnce(HrError) -> ApiError {
    move |err| match err {
        HrError::InvalidArgument(_) => ApiError::InvalidInput(err.to_string()),
        other => ApiError::internal(message, other),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

async fn list_departments(State(state): State<AppState>) -> ApiResult<Json<Vec<Department>>> {
    let rows = state
        .departments
        .list_departments()
        .await
        .map_err(hr_error(RELATIONAL_READ))?;
    Ok(Json(rows))
}

async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Department>> {
    state
        .departments
        .get_department(id)
        .await
        .map_err(hr_error(RELATIONAL_READ))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn list_department_documents(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DepartmentDocumentView>>> {
    let documents = state
        .departments
        .list_department_documents()
        .await
        .map_err(hr_error(DOCUMENT_READ))?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

async fn get_department_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<DepartmentDocumentView>> {
    state
        .departments
        .find_department_document(id)
        .await
        .map_err(hr_error(DOCUMENT_READ))?
        .map(|d| Json(d.into()))
        .ok_or(ApiError::NotFound)
}

async fn combined_departments(State(state): State<AppState>) -> ApiResult<Json<Vec<Department>>> {
    let rows = state
        .departments
        .combined_departments()
        .await
        .map_err(hr_error(COMBINED_READ))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct AggregatedQuery {
    #[serde(default)]
    name: String,
}

async fn aggregated_departments(
    State(state): State<AppState>,
    Query(query): Query<AggregatedQuery>,
) -> ApiResult<Json<Vec<Department>>> {
    let rows = state
        .departments
        .aggregated_departments(&query.name)
        .await
        .map_err(hr_error(COMBINED_READ))?;
    Ok(Json(rows))
}

async fn create_department(
    State(state): State<AppState>,
    payload: Option<Json<NewDepartment>>,
) -> ApiResult<Response> {
    let draft = payload.map(|Json(body)| DepartmentDraft {
        department_name: body.department_name,
    });
    let written = state
        .departments
        .create_department(draft)
        .await
        .map_err(hr_error(CREATE_FAILED))?;
    let consistent = written.is_consistent();
    let mut response = Json(written.record).into_response();
    if !consistent {
        mark_mirror_missing(&mut response);
    }
    Ok(response)
}

async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<EmployeeView>>> {
    let rows = state
        .employees
        .list_employees()
        .await
        .map_err(hr_error(RELATIONAL_READ))?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<EmployeeView>> {
    state
        .employees
        .get_employee(id)
        .await
        .map_err(hr_error(RELATIONAL_READ))?
        .map(|e| Json(e.into()))
        .ok_or(ApiError::NotFound)
}

async fn list_employee_documents(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EmployeeDocumentView>>> {
    let documents = state
        .employees
        .list_employee_documents()
        .await
        .map_err(hr_error(DOCUMENT_READ))?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

async fn get_employee_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmployeeDocumentView>> {
    // A malformed id cannot address any document.
    let Ok(native_id) = id.parse::<NativeId>() else {
        return Err(ApiError::NotFound);
    };
    state
        .employees
        .get_employee_document(&native_id)
        .await
        .map_err(hr_error(DOCUMENT_READ))?
        .map(|d| Json(d.into()))
        .ok_or(ApiError::NotFound)
}

async fn combined_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let rows = state
        .employees
        .combined_employees()
        .await
        .map_err(hr_error(COMBINED_READ))?;
    Ok(Json(rows))
}

async fn create_employee(
    State(state): State<AppState>,
    payload: Option<Json<NewEmployee>>,
) -> ApiResult<Response> {
    let draft = match payload {
        Some(Json(body)) => Some(body.validate().map_err(ApiError::Validation)?),
        None => None,
    };

    if let Some(draft) = &draft {
        let existing = state
            .employees
            .find_employee_by_email(&draft.email)
            .await
            .map_err(hr_error(RELATIONAL_READ))?;
        if existing.is_some() {
            return Err(ApiError::field("email", "Employee email already in use"));
        }
    }

    let written = state
        .employees
        .create_employee(draft)
        .await
        .map_err(hr_error(CREATE_FAILED))?;
    let consistent = written.is_consistent();
    let location = format!("/api/employees/from-sql/{}", written.record.employee_id);

    let mut response = (StatusCode::CREATED, Json(written.record)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    if !consistent {
        mark_mirror_missing(&mut response);
    }
    Ok(response)
}

fn mark_mirror_missing(response: &mut Response) {
    warn!("responding with a record that has no document mirror");
    response.headers_mut().insert(
        HeaderName::from_static(MIRROR_STATUS),
        HeaderValue::from_static("missing"),
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
