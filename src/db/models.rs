use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

/// Role stored on the user row; decides which dashboard the client renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pensioner,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Pensioner => "pensioner",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pensioner" => Ok(Role::Pensioner),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {:?}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Pending,
    Approved,
    Rejected,
    NeedsReview,
}

impl CertificateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CertificateStatus::Pending => "pending",
            CertificateStatus::Approved => "approved",
            CertificateStatus::Rejected => "rejected",
            CertificateStatus::NeedsReview => "needs_review",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CertificateStatus::Pending),
            "approved" => Ok(CertificateStatus::Approved),
            "rejected" => Ok(CertificateStatus::Rejected),
            "needs_review" => Ok(CertificateStatus::NeedsReview),
            other => anyhow::bail!("unknown certificate status {:?}", other),
        }
    }
}

/// User profile without credentials.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub pension_number: String,
    pub phone_number: String,
    pub address: String,
    pub date_of_birth: Option<Date>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub pension_number: String,
    pub phone_number: String,
    pub address: String,
    pub date_of_birth: Option<Date>,
    pub role: Role,
}

/// Calendar month a certificate attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub month: u8,
    pub year: i32,
}

impl Period {
    pub fn new(month: u8, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { month, year })
    }

    pub fn of(at: OffsetDateTime) -> Self {
        Self {
            month: u8::from(at.month()),
            year: at.year(),
        }
    }

    pub fn current() -> Self {
        Self::of(OffsetDateTime::now_utc())
    }

    pub fn month_name(self) -> String {
        Month::try_from(self.month)
            .map(|m| m.to_string())
            .unwrap_or_else(|_| format!("Month {}", self.month))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LifeCertificate {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub submission_date: OffsetDateTime,
    pub month: u8,
    pub year: i32,
    pub witness_name: String,
    pub witness_phone: String,
    pub witness_relationship: String,
    pub certificate_photo_url: Option<String>,
    pub status: CertificateStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl LifeCertificate {
    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Witness {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

/// Insert payload. Status is always `pending` on insert.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub user_id: Uuid,
    pub period: Period,
    pub witness: Witness,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub status: CertificateStatus,
    pub notes: Option<String>,
    pub reviewed_by: Uuid,
    pub reviewed_at: OffsetDateTime,
}
