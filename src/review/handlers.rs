use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AdminCertificate, OverviewResponse, ReviewRequest},
    services,
};
use crate::{
    auth::extractors::AdminUser, certificates::dto::CertificateView, db::User, error::AppResult,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/overview", get(overview))
        .route("/admin/pensioners", get(list_pensioners))
        .route("/admin/certificates/:id", get(get_certificate))
        .route("/admin/certificates/:id/review", post(review_certificate))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn overview(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<OverviewResponse>> {
    Ok(Json(services::overview(&state).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_pensioners(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.repo.list_pensioners().await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id, %id))]
pub async fn get_certificate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminCertificate>> {
    Ok(Json(services::certificate_detail(&state, id).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id, %id, status = %body.status))]
pub async fn review_certificate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> AppResult<Json<CertificateView>> {
    let cert = services::review_certificate(&state, &admin, id, body.status, body.notes).await?;
    Ok(Json(cert.into()))
}
