//! Row storage for users, certificates and revoked sessions.
//!
//! Every method is a single statement against storage; callers compose
//! them without transactions. The `(user_id, month, year)` uniqueness of
//! certificates is enforced here, not by callers.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
pub use models::{
    CertificateStatus, LifeCertificate, NewCertificate, NewUser, Period, Review, Role, User,
    UserRecord, Witness,
};

#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    /// Users with role `pensioner`, newest first.
    async fn list_pensioners(&self) -> AppResult<Vec<User>>;

    async fn find_certificate_for_period(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> AppResult<Option<LifeCertificate>>;
    /// Fails with `AlreadySubmitted` when the user already has a row for the period.
    async fn insert_certificate(&self, new: NewCertificate) -> AppResult<LifeCertificate>;
    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<LifeCertificate>>;
    /// Certificates owned by `user_id`, newest first.
    async fn list_certificates_by_user(&self, user_id: Uuid) -> AppResult<Vec<LifeCertificate>>;
    /// All certificates, newest first.
    async fn list_certificates(&self) -> AppResult<Vec<LifeCertificate>>;
    /// Overwrites the review fields unconditionally; `None` if no such row.
    async fn review_certificate(
        &self,
        id: Uuid,
        review: Review,
    ) -> AppResult<Option<LifeCertificate>>;

    async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> AppResult<()>;
    async fn is_session_revoked(&self, session_id: Uuid) -> AppResult<bool>;
}
