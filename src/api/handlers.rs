//! JSON handlers for the ladder API

use crate::api::error::ApiError;
use crate::service::app::AppState;
use crate::service::rankings::{CategoryRanking, CompetitorProfile, FaceoffSummary};
use crate::store::{CategoryStore, CompetitorStore, MatchStore, TournamentResultStore};
use crate::types::{
    Category, Competitor, CompetitorId, CompetitorUpdate, MatchOutcome, MatchUpdate,
    NewCompetitor, NewMatch, NewTournamentResult, TournamentResult, TournamentResultUpdate,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_SEARCH_LIMIT: usize = 10;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct NewCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub limit: Option<usize>,
}

/// Optional category filter, given as the category's URL path
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub include_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub keep: CompetitorId,
    pub merge: CompetitorId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub kept: CompetitorId,
    pub reassigned_matches: usize,
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Category>>> {
    state.metrics().record_http_request("list_categories");
    Ok(Json(state.store().list_categories()?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    state.metrics().record_http_request("create_category");

    let category = state.store().add_category(&request.name)?;
    info!("Created category '{}' at /{}", category.name, category.url_path);

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn category_rankings(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ApiResult<Json<CategoryRanking>> {
    state.metrics().record_http_request("rankings");
    debug!("Ranking requested for {}", category);

    let deadline = state.config().rating.computation_timeout();
    let label = category.clone();
    let ranking = state
        .rankings()
        .within_deadline(&label, deadline, move |service| {
            service.rankings_by_path(&category)
        })
        .await?;

    Ok(Json(ranking))
}

pub async fn list_players(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Competitor>>> {
    state.metrics().record_http_request("list_players");
    Ok(Json(state.store().list_competitors()?))
}

pub async fn search_players(
    State(state): State<Arc<AppState>>,
    Query(search): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Competitor>>> {
    state.metrics().record_http_request("search_players");

    let limit = search.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(state.store().search_competitors(&search.query, limit)?))
}

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewCompetitor>,
) -> ApiResult<(StatusCode, Json<Competitor>)> {
    state.metrics().record_http_request("create_player");

    let competitor = state.store().add_competitor(request)?;
    info!(
        "Registered competitor '{}' ({})",
        competitor.nickname, competitor.id
    );

    Ok((StatusCode::CREATED, Json(competitor)))
}

pub async fn player_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompetitorId>,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Json<CompetitorProfile>> {
    state.metrics().record_http_request("player_profile");

    let deadline = state.config().rating.computation_timeout();
    let label = format!("profile {}", id);
    let profile = state
        .rankings()
        .within_deadline(&label, deadline, move |service| {
            service.competitor_profile(&id, query.include_hidden)
        })
        .await?;

    Ok(Json(profile))
}

pub async fn update_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompetitorId>,
    Json(update): Json<CompetitorUpdate>,
) -> ApiResult<Json<Competitor>> {
    state.metrics().record_http_request("update_player");

    let competitor = state.store().update_competitor(&id, update)?;
    info!(
        "Updated competitor '{}' at /{}",
        competitor.nickname, competitor.url_path
    );

    Ok(Json(competitor))
}

pub async fn player_results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompetitorId>,
    Query(filter): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<TournamentResult>>> {
    state.metrics().record_http_request("player_results");

    let rankings = state.rankings();
    let category = match &filter.category {
        Some(path) => Some(rankings.resolve_category_path(path)?),
        None => None,
    };

    let results = rankings.competitor_results(&id, category.as_ref().map(|c| c.id.as_str()))?;
    Ok(Json(results))
}

pub async fn create_result(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTournamentResult>,
) -> ApiResult<(StatusCode, Json<TournamentResult>)> {
    state.metrics().record_http_request("create_result");

    let result = state.store().add_tournament_result(request)?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn update_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<TournamentResultUpdate>,
) -> ApiResult<Json<TournamentResult>> {
    state.metrics().record_http_request("update_result");

    let result = state.store().update_tournament_result(&id, update)?;
    info!("Updated tournament result {}", result.id);

    Ok(Json(result))
}

pub async fn player_matches(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompetitorId>,
    Query(filter): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<MatchOutcome>>> {
    state.metrics().record_http_request("player_matches");

    let rankings = state.rankings();
    let category = match &filter.category {
        Some(path) => Some(rankings.resolve_category_path(path)?),
        None => None,
    };

    let matches = rankings.competitor_matches(&id, category.as_ref().map(|c| c.id.as_str()))?;
    Ok(Json(matches))
}

pub async fn merge_players(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MergeRequest>,
) -> ApiResult<Json<MergeResponse>> {
    state.metrics().record_http_request("merge_players");

    let reassigned = state
        .store()
        .merge_competitors(&request.keep, &request.merge)?;
    info!(
        "Merged competitor {} into {} ({} matches reassigned)",
        request.merge, request.keep, reassigned
    );

    Ok(Json(MergeResponse {
        kept: request.keep,
        reassigned_matches: reassigned,
    }))
}

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewMatch>,
) -> ApiResult<(StatusCode, Json<MatchOutcome>)> {
    state.metrics().record_http_request("create_match");

    let outcome = state.store().add_match(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<MatchUpdate>,
) -> ApiResult<Json<MatchOutcome>> {
    state.metrics().record_http_request("update_match");

    let outcome = state.store().update_match(&id, update)?;
    info!("Updated match {}", outcome.id);

    Ok(Json(outcome))
}

pub async fn faceoff(
    State(state): State<Arc<AppState>>,
    Path((player1, player2)): Path<(CompetitorId, CompetitorId)>,
    Query(filter): Query<CategoryQuery>,
) -> ApiResult<Json<FaceoffSummary>> {
    state.metrics().record_http_request("faceoff");

    let rankings = state.rankings();
    let category = match &filter.category {
        Some(path) => Some(rankings.resolve_category_path(path)?),
        None => None,
    };

    let deadline = state.config().rating.computation_timeout();
    let label = format!("faceoff {} {}", player1, player2);
    let summary = rankings
        .within_deadline(&label, deadline, move |service| {
            service.faceoff(&player1, &player2, category.as_ref().map(|c| c.id.as_str()))
        })
        .await?;

    Ok(Json(summary))
}
