use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{
    LifeCertificate, NewCertificate, NewUser, Period, Repository, Review, User, UserRecord,
};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, pension_number, phone_number, \
                            address, date_of_birth, role, created_at";

const CERTIFICATE_COLUMNS: &str = "id, user_id, submission_date, month, year, witness_name, \
                                   witness_phone, witness_relationship, certificate_photo_url, \
                                   status, admin_notes, reviewed_by, reviewed_at, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    full_name: String,
    pension_number: String,
    phone_number: String,
    address: String,
    date_of_birth: Option<Date>,
    role: String,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> anyhow::Result<Self> {
        Ok(UserRecord {
            user: User {
                id: r.id,
                email: r.email,
                full_name: r.full_name,
                pension_number: r.pension_number,
                phone_number: r.phone_number,
                address: r.address,
                date_of_birth: r.date_of_birth,
                role: r.role.parse()?,
                created_at: r.created_at,
            },
            password_hash: r.password_hash,
        })
    }
}

#[derive(Debug, FromRow)]
struct CertificateRow {
    id: Uuid,
    user_id: Uuid,
    submission_date: OffsetDateTime,
    month: i16,
    year: i32,
    witness_name: String,
    witness_phone: String,
    witness_relationship: String,
    certificate_photo_url: Option<String>,
    status: String,
    admin_notes: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl TryFrom<CertificateRow> for LifeCertificate {
    type Error = anyhow::Error;

    fn try_from(r: CertificateRow) -> anyhow::Result<Self> {
        let period = u8::try_from(r.month)
            .ok()
            .and_then(|m| Period::new(m, r.year))
            .with_context(|| format!("certificate {} has month {}", r.id, r.month))?;
        Ok(LifeCertificate {
            id: r.id,
            user_id: r.user_id,
            submission_date: r.submission_date,
            month: period.month,
            year: period.year,
            witness_name: r.witness_name,
            witness_phone: r.witness_phone,
            witness_relationship: r.witness_relationship,
            certificate_photo_url: r.certificate_photo_url,
            status: r.status.parse()?,
            admin_notes: r.admin_notes,
            reviewed_by: r.reviewed_by,
            reviewed_at: r.reviewed_at,
            created_at: r.created_at,
        })
    }
}

fn certificates(rows: Vec<CertificateRow>) -> AppResult<Vec<LifeCertificate>> {
    rows.into_iter()
        .map(|r| LifeCertificate::try_from(r).map_err(AppError::from))
        .collect()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::try_from).transpose()?)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::try_from).transpose()?.map(|r| r.user))
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, pension_number,
                               phone_number, address, date_of_birth, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(&new.pension_number)
        .bind(&new.phone_number)
        .bind(&new.address)
        .bind(new.date_of_birth)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already registered".into())
            } else {
                AppError::from(e)
            }
        })?;
        Ok(UserRecord::try_from(row)?.user)
    }

    async fn list_pensioners(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'pensioner' ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| {
                UserRecord::try_from(r)
                    .map(|r| r.user)
                    .map_err(AppError::from)
            })
            .collect()
    }

    async fn find_certificate_for_period(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> AppResult<Option<LifeCertificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM life_certificates
            WHERE user_id = $1 AND month = $2 AND year = $3
            "#
        ))
        .bind(user_id)
        .bind(i16::from(period.month))
        .bind(period.year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LifeCertificate::try_from).transpose()?)
    }

    async fn insert_certificate(&self, new: NewCertificate) -> AppResult<LifeCertificate> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            INSERT INTO life_certificates (user_id, month, year, witness_name, witness_phone,
                                           witness_relationship, certificate_photo_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(i16::from(new.period.month))
        .bind(new.period.year)
        .bind(&new.witness.name)
        .bind(&new.witness.phone)
        .bind(&new.witness.relationship)
        .bind(&new.photo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadySubmitted
            } else {
                AppError::from(e)
            }
        })?;
        Ok(LifeCertificate::try_from(row)?)
    }

    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<LifeCertificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM life_certificates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LifeCertificate::try_from).transpose()?)
    }

    async fn list_certificates_by_user(&self, user_id: Uuid) -> AppResult<Vec<LifeCertificate>> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM life_certificates
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        certificates(rows)
    }

    async fn list_certificates(&self) -> AppResult<Vec<LifeCertificate>> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM life_certificates ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        certificates(rows)
    }

    async fn review_certificate(
        &self,
        id: Uuid,
        review: Review,
    ) -> AppResult<Option<LifeCertificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            UPDATE life_certificates
               SET status = $2, admin_notes = $3, reviewed_by = $4, reviewed_at = $5
             WHERE id = $1
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(review.status.as_str())
        .bind(&review.notes)
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LifeCertificate::try_from).transpose()?)
    }

    async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_sessions (session_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("revoke session")?;
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: Uuid) -> AppResult<bool> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM revoked_sessions WHERE session_id = $1)",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }
}
