use tracing::{info, warn};
use uuid::Uuid;

use super::photo::{self, PhotoUpload};
use crate::db::{LifeCertificate, NewCertificate, Period, User, Witness};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Witness details and optional photo from the submission form.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub witness_name: String,
    pub witness_phone: String,
    pub witness_relationship: String,
    pub photo: Option<PhotoUpload>,
}

impl SubmissionForm {
    fn witness(&self) -> AppResult<Witness> {
        let field = |name: &str, v: &str| {
            let v = v.trim();
            if v.is_empty() {
                Err(AppError::Validation(format!("{} is required", name)))
            } else {
                Ok(v.to_string())
            }
        };
        Ok(Witness {
            name: field("witness_name", &self.witness_name)?,
            phone: field("witness_phone", &self.witness_phone)?,
            relationship: field("witness_relationship", &self.witness_relationship)?,
        })
    }
}

pub fn confirmation(period: Period) -> String {
    format!(
        "Your life certificate for {} has been submitted for review.",
        period
    )
}

/// Submits `user`'s certificate for `period`.
///
/// Three separate steps: duplicate pre-check, optional photo upload, insert.
/// The insert itself is guarded by the storage uniqueness on
/// `(user_id, month, year)`, so a concurrent duplicate still fails with
/// `AlreadySubmitted`. If the insert fails after an upload, the photo is
/// removed again.
pub async fn submit_certificate(
    state: &AppState,
    user: &User,
    period: Period,
    form: SubmissionForm,
) -> AppResult<LifeCertificate> {
    let witness = form.witness()?;

    if state
        .repo
        .find_certificate_for_period(user.id, period)
        .await?
        .is_some()
    {
        warn!(user_id = %user.id, month = period.month, year = period.year, "duplicate submission");
        return Err(AppError::AlreadySubmitted);
    }

    let stored = match form.photo.filter(|p| !p.body.is_empty()) {
        Some(p) => Some(photo::upload(state, user.id, period, p).await?),
        None => None,
    };

    let inserted = state
        .repo
        .insert_certificate(NewCertificate {
            user_id: user.id,
            period,
            witness,
            photo_url: stored.as_ref().map(|s| s.url.clone()),
        })
        .await;

    match inserted {
        Ok(cert) => {
            info!(
                user_id = %user.id,
                certificate_id = %cert.id,
                month = period.month,
                year = period.year,
                with_photo = cert.certificate_photo_url.is_some(),
                "certificate submitted"
            );
            Ok(cert)
        }
        Err(e) => {
            if let Some(s) = &stored {
                photo::discard(state, s).await;
            }
            Err(e)
        }
    }
}

/// The user's own certificates, newest first.
pub async fn history(state: &AppState, user_id: Uuid) -> AppResult<Vec<LifeCertificate>> {
    state.repo.list_certificates_by_user(user_id).await
}

/// One certificate, visible only to its owner.
pub async fn own_certificate(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<LifeCertificate> {
    match state.repo.get_certificate(id).await? {
        Some(c) if c.user_id == user_id => Ok(c),
        _ => Err(AppError::NotFound("Certificate not found".into())),
    }
}

pub async fn submitted_for(state: &AppState, user_id: Uuid, period: Period) -> AppResult<bool> {
    Ok(state
        .repo
        .find_certificate_for_period(user_id, period)
        .await?
        .is_some())
}
