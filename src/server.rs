//! HTTP front end for the dashboard: one JSON route per page plus a CSV
//! download of the details page. The data set is shared read-only.
use crate::dashboard::filters::{FilterOptions, Filters};
use crate::dashboard::views::{self, DetailQuery};
use crate::dashboard::Dataset;
use crate::error::{ReportError, Result};
use crate::types::MovieRecord;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub const DOWNLOAD_FILE_NAME: &str = "movies_filtered.csv";

#[derive(Clone)]
pub struct ServerState {
    pub dataset: Arc<Dataset>,
}

/// Query parameters shared by every view. Missing filters mean "All".
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub era: Option<String>,
    pub genre: Option<String>,
    pub budget: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
struct ViewResponse<T> {
    filters: Filters,
    movies: usize,
    view: T,
}

#[derive(Serialize)]
struct HomeResponse {
    movies: usize,
    views: &'static [&'static str],
    filters: FilterOptions,
}

pub struct ApiError(ReportError);

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReportError::InvalidSelection { .. } => StatusCode::BAD_REQUEST,
            other => {
                error!("Request failed: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn select<'a>(state: &'a ServerState, p: &ViewParams) -> ApiResult<(Filters, Vec<&'a MovieRecord>)> {
    let filters = state
        .dataset
        .select(p.era.as_deref(), p.genre.as_deref(), p.budget.as_deref())?;
    let rows = state.dataset.filter(&filters);
    Ok((filters, rows))
}

fn respond<T: Serialize>(filters: Filters, rows: &[&MovieRecord], view: T) -> Json<ViewResponse<T>> {
    Json(ViewResponse {
        filters,
        movies: rows.len(),
        view,
    })
}

fn detail_query(p: &ViewParams) -> Result<DetailQuery> {
    DetailQuery::parse(
        p.search.as_deref(),
        p.sort.as_deref(),
        p.order.as_deref(),
        p.limit.as_deref(),
    )
}

async fn home(State(state): State<ServerState>) -> Json<HomeResponse> {
    Json(HomeResponse {
        movies: state.dataset.movies.len(),
        views: &[
            "/api/overview",
            "/api/financial",
            "/api/genre-people",
            "/api/funnel",
            "/api/details",
            "/api/details.csv",
        ],
        filters: state.dataset.options.clone(),
    })
}

async fn get_overview(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let (filters, rows) = select(&state, &params)?;
    Ok(respond(filters, &rows, views::overview(&rows)))
}

async fn get_financial(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let (filters, rows) = select(&state, &params)?;
    Ok(respond(filters, &rows, views::financial(&rows)))
}

async fn get_genre_people(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let (filters, rows) = select(&state, &params)?;
    let view = views::genre_people(&rows, &state.dataset.min_support);
    Ok(respond(filters, &rows, view))
}

async fn get_funnel(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let (filters, rows) = select(&state, &params)?;
    let view = views::funnel(&rows, &state.dataset.min_support);
    Ok(respond(filters, &rows, view))
}

async fn get_details(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<impl IntoResponse> {
    let (filters, rows) = select(&state, &params)?;
    let query = detail_query(&params)?;
    Ok(respond(filters, &rows, views::details(&rows, &query)))
}

async fn get_details_csv(
    State(state): State<ServerState>,
    Query(params): Query<ViewParams>,
) -> ApiResult<Response> {
    let (_, rows) = select(&state, &params)?;
    let query = detail_query(&params)?;
    let csv = views::details_csv(&views::details(&rows, &query))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    info!(">>> {} {}", method, uri);
    let response = next.run(request).await;
    info!(
        "<<< {} {} {} ({}ms)",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}

pub fn make_app(dataset: Arc<Dataset>) -> Router {
    let state = ServerState { dataset };
    Router::new()
        .route("/", get(home))
        .route("/api/overview", get(get_overview))
        .route("/api/financial", get(get_financial))
        .route("/api/genre-people", get(get_genre_people))
        .route("/api/funnel", get(get_funnel))
        .route("/api/details", get(get_details))
        .route("/api/details.csv", get(get_details_csv))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
}

pub async fn run_server(dataset: Dataset, port: u16) -> Result<()> {
    let app = make_app(Arc::new(dataset));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Dashboard listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinSupport;
    use crate::reports::fixtures::sample;
    use tower::ServiceExt;

    fn app() -> Router {
        make_app(Arc::new(Dataset::from_records(sample(), MinSupport::default())))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn home_lists_views_and_filter_options() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movies"], 4);
        assert_eq!(body["filters"]["genres"][0], "All");
        assert_eq!(body["views"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn every_view_renders() {
        for uri in [
            "/api/overview",
            "/api/financial",
            "/api/genre-people",
            "/api/funnel",
            "/api/details",
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body["movies"], 4, "{}", uri);
        }
    }

    #[tokio::test]
    async fn filters_apply_to_views() {
        let (status, body) = get_json("/api/overview?genre=Drama&era=Modern%20(2010%2B)").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movies"], 1);
        assert_eq!(body["filters"]["genre"], "Drama");
        assert_eq!(body["view"]["kpis"]["total_revenue"], 10_000_000.0);
    }

    #[tokio::test]
    async fn unknown_values_are_bad_requests() {
        for uri in [
            "/api/overview?genre=Western",
            "/api/funnel?era=Future",
            "/api/details?sort=Title",
            "/api/details.csv?limit=7",
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].as_str().unwrap().starts_with("Unknown"));
        }
    }

    #[tokio::test]
    async fn details_csv_is_an_attachment() {
        let request = Request::builder()
            .uri("/api/details.csv?search=a&sort=ROI&order=asc")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"movies_filtered.csv\"");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Title,Primary Genre,Year"));
        assert!(lines[1].starts_with("Beta,"));
    }
}
