use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::certificates::dto::CertificateView;
use crate::db::{CertificateStatus, LifeCertificate, User};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// One of `approved`, `rejected`, `needs_review`.
    pub status: CertificateStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PensionerSummary {
    pub id: Uuid,
    pub full_name: String,
    pub pension_number: String,
    pub email: String,
}

impl From<&User> for PensionerSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name.clone(),
            pension_number: u.pension_number.clone(),
            email: u.email.clone(),
        }
    }
}

/// Certificate row in the admin table, joined with its owner when known.
#[derive(Debug, Serialize)]
pub struct AdminCertificate {
    #[serde(flatten)]
    pub view: CertificateView,
    pub pensioner: Option<PensionerSummary>,
}

impl AdminCertificate {
    pub fn new(certificate: LifeCertificate, pensioners: &[User]) -> Self {
        let pensioner = pensioners
            .iter()
            .find(|u| u.id == certificate.user_id)
            .map(PensionerSummary::from);
        Self {
            view: certificate.into(),
            pensioner,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct OverviewStats {
    pub total_pensioners: usize,
    pub total_certificates: usize,
    pub pending_certificates: usize,
    pub approved_certificates: usize,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub stats: OverviewStats,
    pub certificates: Vec<AdminCertificate>,
    pub pensioners: Vec<User>,
}
