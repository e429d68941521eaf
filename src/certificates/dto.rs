use serde::Serialize;

use super::status::{badge_for, StatusBadge};
use crate::db::{LifeCertificate, Period};

/// Certificate as listed to its owner or an admin.
#[derive(Debug, Serialize)]
pub struct CertificateView {
    #[serde(flatten)]
    pub certificate: LifeCertificate,
    pub month_name: String,
    pub badge: StatusBadge,
}

impl From<LifeCertificate> for CertificateView {
    fn from(certificate: LifeCertificate) -> Self {
        Self {
            month_name: certificate.period().month_name(),
            badge: badge_for(certificate.status.as_str()),
            certificate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub certificate: CertificateView,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    pub month: u8,
    pub year: i32,
    pub month_name: String,
    pub submitted: bool,
}

impl PeriodResponse {
    pub fn new(period: Period, submitted: bool) -> Self {
        Self {
            month: period.month,
            year: period.year,
            month_name: period.month_name(),
            submitted,
        }
    }
}
