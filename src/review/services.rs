use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{AdminCertificate, OverviewResponse, OverviewStats};
use crate::db::{CertificateStatus, LifeCertificate, Review, User};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

fn stats(certificates: &[LifeCertificate], pensioners: &[User]) -> OverviewStats {
    let count = |s: CertificateStatus| certificates.iter().filter(|c| c.status == s).count();
    OverviewStats {
        total_pensioners: pensioners.len(),
        total_certificates: certificates.len(),
        pending_certificates: count(CertificateStatus::Pending),
        approved_certificates: count(CertificateStatus::Approved),
    }
}

/// All certificates and all pensioners, fetched concurrently.
pub async fn overview(state: &AppState) -> AppResult<OverviewResponse> {
    let (certificates, pensioners) =
        tokio::try_join!(state.repo.list_certificates(), state.repo.list_pensioners())?;

    let stats = stats(&certificates, &pensioners);
    let certificates = certificates
        .into_iter()
        .map(|c| AdminCertificate::new(c, &pensioners))
        .collect();
    Ok(OverviewResponse {
        stats,
        certificates,
        pensioners,
    })
}

pub async fn certificate_detail(state: &AppState, id: Uuid) -> AppResult<AdminCertificate> {
    let cert = state
        .repo
        .get_certificate(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate not found".into()))?;
    let owner: Vec<User> = state.repo.find_user(cert.user_id).await?.into_iter().collect();
    Ok(AdminCertificate::new(cert, &owner))
}

/// Records an admin decision in one update: status, notes, reviewer and time.
///
/// No guard against concurrent or repeated reviews; the last write wins.
pub async fn review_certificate(
    state: &AppState,
    admin: &User,
    id: Uuid,
    status: CertificateStatus,
    notes: Option<String>,
) -> AppResult<LifeCertificate> {
    if status == CertificateStatus::Pending {
        warn!(admin_id = %admin.id, certificate_id = %id, "review to pending rejected");
        return Err(AppError::Validation(
            "status must be one of approved, rejected, needs_review".into(),
        ));
    }

    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let review = Review {
        status,
        notes,
        reviewed_by: admin.id,
        reviewed_at: OffsetDateTime::now_utc(),
    };
    let cert = state
        .repo
        .review_certificate(id, review)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate not found".into()))?;

    info!(admin_id = %admin.id, certificate_id = %cert.id, status = %cert.status, "certificate reviewed");
    Ok(cert)
}
