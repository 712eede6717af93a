use crate::infra::{AppState, Discovery};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use scheme_mitra::ai::ExplanationGenerator;
use scheme_mitra::error::AppError;
use scheme_mitra::schemes::{
    filter_schemes, match_score, CatalogFacets, SchemeFilter, SchemeRecord, UserProfile,
    MAX_PROFILE_AGE,
};
use scheme_mitra::session::{Language, SessionId, SessionState, SessionStore};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    pub(crate) query: Option<String>,
    pub(crate) ministry: Option<String>,
    pub(crate) beneficiary: Option<String>,
    pub(crate) category: Option<String>,
}

impl ListParams {
    fn into_filter(self) -> SchemeFilter {
        SchemeFilter::from_selections(self.query, self.ministry, self.beneficiary, self.category)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ListResponse {
    pub(crate) total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notice: Option<String>,
    pub(crate) schemes: Vec<SchemeRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchRequest {
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    pub(crate) profile: UserProfile,
    #[serde(default)]
    pub(crate) query: Option<String>,
    #[serde(default)]
    pub(crate) ministry: Option<String>,
    #[serde(default)]
    pub(crate) beneficiary: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SchemeMatch {
    pub(crate) scheme: SchemeRecord,
    pub(crate) match_score: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct MatchResponse {
    pub(crate) profile: String,
    pub(crate) total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notice: Option<String>,
    pub(crate) matches: Vec<SchemeMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExplainRequest {
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    pub(crate) profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExplainResponse {
    pub(crate) scheme_id: String,
    pub(crate) scheme_name: String,
    pub(crate) status: &'static str,
    pub(crate) explanation: String,
    pub(crate) match_score: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeRequest {
    pub(crate) text: String,
    #[serde(default = "default_language")]
    pub(crate) language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreferencesRequest {
    pub(crate) language: Language,
    #[serde(default)]
    pub(crate) accessibility_mode: bool,
}

/// Discovery routes plus the operational endpoints.
pub(crate) fn with_discovery_routes<G, S>(service: Arc<Discovery<G, S>>) -> Router
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    discovery_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) fn discovery_router<G, S>(service: Arc<Discovery<G, S>>) -> Router
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/schemes", get(list_schemes::<G, S>))
        .route("/api/v1/schemes/facets", get(scheme_facets::<G, S>))
        .route("/api/v1/schemes/match", post(match_schemes::<G, S>))
        .route(
            "/api/v1/schemes/:scheme_id/explain",
            post(explain_scheme::<G, S>),
        )
        .route("/api/v1/profile/analyze", post(analyze_profile::<G, S>))
        .route("/api/v1/session/:session_id", get(session_snapshot::<G, S>))
        .route(
            "/api/v1/session/:session_id/bookmarks",
            get(bookmarked_schemes::<G, S>),
        )
        .route(
            "/api/v1/session/:session_id/bookmarks/:scheme_id",
            post(toggle_bookmark::<G, S>),
        )
        .route(
            "/api/v1/session/:session_id/expanded/:scheme_id",
            post(toggle_expanded::<G, S>),
        )
        .route(
            "/api/v1/session/:session_id/preferences",
            put(set_preferences::<G, S>),
        )
        .with_state(service)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn list_schemes<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Query(params): Query<ListParams>,
) -> Json<ListResponse>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let filter = params.into_filter();
    let schemes: Vec<SchemeRecord> =
        filter_schemes(service.catalog.catalog().schemes(), &filter)
            .into_iter()
            .cloned()
            .collect();

    Json(ListResponse {
        total: schemes.len(),
        notice: service.catalog.notice().map(str::to_string),
        schemes,
    })
}

pub(crate) async fn scheme_facets<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
) -> Json<CatalogFacets>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    Json(service.catalog.catalog().facets())
}

pub(crate) async fn match_schemes<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Json(payload): Json<MatchRequest>,
) -> Result<Response, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let MatchRequest {
        session_id,
        profile,
        query,
        ministry,
        beneficiary,
        category,
    } = payload;

    if let Err(response) = validate_age(&profile) {
        return Ok(response);
    }

    let profile_text = profile.composed();
    let filter = SchemeFilter::from_selections(query, ministry, beneficiary, category);

    update_session(service.sessions.as_ref(), session_id.as_deref(), |state| {
        state.remember_profile(profile_text.clone());
        if let Some(query) = filter.query.as_deref() {
            state.record_search(query);
        }
    })?;

    let matches: Vec<SchemeMatch> = filter_schemes(service.catalog.catalog().schemes(), &filter)
        .into_iter()
        .map(|scheme| SchemeMatch {
            match_score: match_score(scheme, &profile_text),
            scheme: scheme.clone(),
        })
        .collect();

    let body = MatchResponse {
        profile: profile_text,
        total: matches.len(),
        notice: service.catalog.notice().map(str::to_string),
        matches,
    };
    Ok(Json(body).into_response())
}

pub(crate) async fn explain_scheme<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path(scheme_id): Path<String>,
    Json(payload): Json<ExplainRequest>,
) -> Result<Response, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let ExplainRequest {
        session_id,
        profile,
    } = payload;

    if let Err(response) = validate_age(&profile) {
        return Ok(response);
    }

    let Some(scheme) = service.catalog.catalog().get(&scheme_id) else {
        return Ok(scheme_not_found(&scheme_id));
    };

    let profile_text = profile.composed();
    update_session(service.sessions.as_ref(), session_id.as_deref(), |state| {
        state.remember_profile(profile_text.clone());
    })?;

    let explanation = service.explainer.explain(scheme, &profile_text).await;
    let body = ExplainResponse {
        scheme_id: explanation.scheme_id,
        scheme_name: scheme.name.clone(),
        status: explanation.text.status_label(),
        explanation: explanation.text.into_inner(),
        match_score: explanation.match_score,
    };
    Ok(Json(body).into_response())
}

pub(crate) async fn analyze_profile<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Json<serde_json::Value>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    match service
        .analytics
        .recognize_entities(&payload.text, &payload.language)
        .await
    {
        Ok(analysis) => Json(json!({
            "status": "analyzed",
            "entities": analysis.entities,
        })),
        Err(err) => {
            tracing::warn!(error = %err, "profile analysis degraded");
            Json(json!({
                "status": "degraded",
                "detail": err.to_string(),
            }))
        }
    }
}

pub(crate) async fn session_snapshot<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionState>, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let state = service.sessions.load(&SessionId(session_id))?;
    Ok(Json(state))
}

pub(crate) async fn bookmarked_schemes<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path(session_id): Path<String>,
) -> Result<Json<ListResponse>, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let state = service.sessions.load(&SessionId(session_id))?;
    let schemes: Vec<SchemeRecord> = service
        .catalog
        .catalog()
        .schemes()
        .iter()
        .filter(|scheme| state.is_bookmarked(&scheme.id))
        .cloned()
        .collect();

    Ok(Json(ListResponse {
        total: schemes.len(),
        notice: service.catalog.notice().map(str::to_string),
        schemes,
    }))
}

pub(crate) async fn toggle_bookmark<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path((session_id, scheme_id)): Path<(String, String)>,
) -> Result<Response, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    if service.catalog.catalog().get(&scheme_id).is_none() {
        return Ok(scheme_not_found(&scheme_id));
    }

    let session_id = SessionId(session_id);
    let mut state = service.sessions.load(&session_id)?;
    let bookmarked = state.toggle_bookmark(&scheme_id);
    let total = state.bookmarks.len();
    service.sessions.save(&session_id, state)?;

    Ok(Json(json!({
        "scheme_id": scheme_id,
        "bookmarked": bookmarked,
        "total_bookmarks": total,
    }))
    .into_response())
}

pub(crate) async fn toggle_expanded<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path((session_id, scheme_id)): Path<(String, String)>,
) -> Result<Response, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    if service.catalog.catalog().get(&scheme_id).is_none() {
        return Ok(scheme_not_found(&scheme_id));
    }

    let session_id = SessionId(session_id);
    let mut state = service.sessions.load(&session_id)?;
    let expanded = state.toggle_expanded(&scheme_id);
    service.sessions.save(&session_id, state)?;

    Ok(Json(json!({
        "scheme_id": scheme_id,
        "expanded": expanded,
    }))
    .into_response())
}

pub(crate) async fn set_preferences<G, S>(
    State(service): State<Arc<Discovery<G, S>>>,
    Path(session_id): Path<String>,
    Json(payload): Json<PreferencesRequest>,
) -> Result<Json<SessionState>, AppError>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    let session_id = SessionId(session_id);
    let mut state = service.sessions.load(&session_id)?;
    state.set_preferences(payload.language, payload.accessibility_mode);
    service.sessions.save(&session_id, state.clone())?;
    Ok(Json(state))
}

fn update_session<S: SessionStore>(
    sessions: &S,
    session_id: Option<&str>,
    apply: impl FnOnce(&mut SessionState),
) -> Result<(), AppError> {
    let Some(session_id) = session_id else {
        return Ok(());
    };
    let session_id = SessionId(session_id.to_string());
    let mut state = sessions.load(&session_id)?;
    apply(&mut state);
    sessions.save(&session_id, state)?;
    Ok(())
}

fn validate_age(profile: &UserProfile) -> Result<(), Response> {
    if profile.age > MAX_PROFILE_AGE {
        let payload = json!({
            "error": format!("age must be between 0 and {MAX_PROFILE_AGE}"),
        });
        return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response());
    }
    Ok(())
}

fn scheme_not_found(scheme_id: &str) -> Response {
    let payload = json!({ "error": format!("unknown scheme '{scheme_id}'") });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use scheme_mitra::ai::{GenerationError, TextAnalyticsClient};
    use scheme_mitra::config::TextAnalyticsConfig;
    use scheme_mitra::schemes::{CatalogHandle, SchemeCatalog};
    use tower::util::ServiceExt;

    const DATASET: &str = r#"{
      "schemes": [
        {
          "id": "farmer-aid",
          "name": "Farmer Aid",
          "ministry": "Ministry of Agriculture",
          "beneficiary": "Farmers",
          "benefit": "Rs 6,000 per year",
          "description": "Income support for farmer families.",
          "category": "Farmers",
          "source_url": "https://example.gov.in/farmer-aid"
        },
        {
          "id": "student-grant",
          "name": "Student Grant",
          "ministry": "Ministry of Education",
          "beneficiary": "Students",
          "benefit": "Scholarship up to Rs 20,000",
          "description": "Merit scholarship for students.",
          "category": "Education",
          "source_url": "https://example.gov.in/student-grant"
        }
      ]
    }"#;

    struct StubGenerator {
        reply: Option<String>,
    }

    #[async_trait::async_trait]
    impl ExplanationGenerator for StubGenerator {
        async fn generate(&self, _: &str, _: &str, _: u32) -> Result<String, GenerationError> {
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(GenerationError::Unconfigured),
            }
        }
    }

    fn test_router(reply: Option<String>, catalog: CatalogHandle) -> Router {
        let analytics = TextAnalyticsClient::new(TextAnalyticsConfig::unconfigured())
            .expect("analytics client builds");
        let service = Arc::new(Discovery::new(
            catalog,
            Arc::new(StubGenerator { reply }),
            analytics,
            Arc::new(InMemorySessionStore::default()),
        ));
        discovery_router(service)
    }

    fn loaded_router(reply: Option<String>) -> Router {
        let catalog =
            CatalogHandle::loaded(SchemeCatalog::from_str(DATASET).expect("dataset parses"));
        test_router(reply, catalog)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collects");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn listing_honors_query_filter() {
        let router = loaded_router(None);
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/schemes?query=farmer")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["schemes"][0]["id"], "farmer-aid");
        assert!(body.get("notice").is_none());
    }

    #[tokio::test]
    async fn degraded_catalog_lists_empty_with_notice() {
        let router = test_router(None, CatalogHandle::degraded("dataset missing".to_string()));
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/schemes")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["notice"], "dataset missing");
    }

    #[tokio::test]
    async fn facets_are_distinct_and_sorted() {
        let router = loaded_router(None);
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/schemes/facets")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        let body = body_json(response).await;
        assert_eq!(
            body["ministries"],
            json!(["Ministry of Agriculture", "Ministry of Education"])
        );
    }

    #[tokio::test]
    async fn matching_scores_each_scheme_against_the_profile() {
        let router = loaded_router(None);
        let request = json_request(
            "POST",
            "/api/v1/schemes/match",
            json!({
                "profile": { "age": 25, "category": "Farmers", "skills": "dairy farmer" }
            }),
        );
        let response = router.oneshot(request).await.expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["profile"],
            "25 years old, Farmers category, skills: dairy farmer"
        );
        assert_eq!(body["total"], 2);
        assert_eq!(body["matches"][0]["scheme"]["id"], "farmer-aid");
        assert_eq!(body["matches"][0]["match_score"], 55);
        assert_eq!(body["matches"][1]["match_score"], 50);
    }

    #[tokio::test]
    async fn out_of_range_age_is_rejected() {
        let router = loaded_router(None);
        let request = json_request(
            "POST",
            "/api/v1/schemes/match",
            json!({ "profile": { "age": 101, "category": "Farmers" } }),
        );
        let response = router.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn explaining_an_unknown_scheme_is_not_found() {
        let router = loaded_router(Some("reply".to_string()));
        let request = json_request(
            "POST",
            "/api/v1/schemes/no-such-scheme/explain",
            json!({ "profile": { "age": 25, "category": "Farmers" } }),
        );
        let response = router.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unconfigured_generator_degrades_the_explanation() {
        let router = loaded_router(None);
        let request = json_request(
            "POST",
            "/api/v1/schemes/farmer-aid/explain",
            json!({ "profile": { "age": 25, "category": "Farmers" } }),
        );
        let response = router.oneshot(request).await.expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["match_score"], 55);
        assert!(body["explanation"]
            .as_str()
            .expect("explanation is text")
            .contains("not configured"));
    }

    #[tokio::test]
    async fn configured_generator_returns_generated_text() {
        let router = loaded_router(Some("You are likely eligible.".to_string()));
        let request = json_request(
            "POST",
            "/api/v1/schemes/farmer-aid/explain",
            json!({ "profile": { "age": 25, "category": "Farmers" } }),
        );
        let response = router.oneshot(request).await.expect("router responds");

        let body = body_json(response).await;
        assert_eq!(body["status"], "generated");
        assert_eq!(body["explanation"], "You are likely eligible.");
    }

    #[tokio::test]
    async fn bookmarks_toggle_and_list_in_catalog_order() {
        let router = loaded_router(None);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session/sess-1/bookmarks/farmer-aid")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = body_json(response).await;
        assert_eq!(body["bookmarked"], true);
        assert_eq!(body["total_bookmarks"], 1);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session/sess-1/bookmarks")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["schemes"][0]["id"], "farmer-aid");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session/sess-1/bookmarks/farmer-aid")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = body_json(response).await;
        assert_eq!(body["bookmarked"], false);
        assert_eq!(body["total_bookmarks"], 0);
    }

    #[tokio::test]
    async fn bookmarking_an_unknown_scheme_is_not_found() {
        let router = loaded_router(None);
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session/sess-1/bookmarks/no-such-scheme")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preferences_persist_in_the_session() {
        let router = loaded_router(None);
        let request = json_request(
            "PUT",
            "/api/v1/session/sess-2/preferences",
            json!({ "language": "hi", "accessibility_mode": true }),
        );
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session/sess-2")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = body_json(response).await;
        assert_eq!(body["language"], "hi");
        assert_eq!(body["accessibility_mode"], true);
    }

    #[tokio::test]
    async fn matching_with_a_session_records_profile_and_search() {
        let router = loaded_router(None);
        let request = json_request(
            "POST",
            "/api/v1/schemes/match",
            json!({
                "session_id": "sess-3",
                "profile": { "age": 25, "category": "Farmers" },
                "query": "farmer"
            }),
        );
        router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session/sess-3")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let body = body_json(response).await;
        assert_eq!(body["last_profile"], "25 years old, Farmers category");
        assert_eq!(body["search_history"][0]["query"], "farmer");
    }

    #[tokio::test]
    async fn unconfigured_analytics_degrades_instead_of_failing() {
        let router = loaded_router(None);
        let request = json_request(
            "POST",
            "/api/v1/profile/analyze",
            json!({ "text": "I am a 25 year old farmer" }),
        );
        let response = router.oneshot(request).await.expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
    }
}
