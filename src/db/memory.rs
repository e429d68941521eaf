use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    CertificateStatus, LifeCertificate, NewCertificate, NewUser, Period, Repository, Review,
    Role, User, UserRecord,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    certificates: Vec<LifeCertificate>,
    revoked_sessions: HashSet<Uuid>,
}

/// Process-local `Repository` with the same constraints as the Postgres schema.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("memory repository poisoned")))
    }
}

/// Newest first; equal timestamps keep the most recent insert first.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> OffsetDateTime,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let t = self.lock()?;
        Ok(t.users.iter().find(|r| r.user.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let t = self.lock()?;
        Ok(t.users.iter().find(|r| r.user.id == id).map(|r| r.user.clone()))
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut t = self.lock()?;
        if t.users.iter().any(|r| r.user.email == new.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            full_name: new.full_name,
            pension_number: new.pension_number,
            phone_number: new.phone_number,
            address: new.address,
            date_of_birth: new.date_of_birth,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(UserRecord {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        Ok(user)
    }

    async fn list_pensioners(&self) -> AppResult<Vec<User>> {
        let t = self.lock()?;
        let pensioners = t
            .users
            .iter()
            .filter(|r| r.user.role == Role::Pensioner)
            .map(|r| r.user.clone());
        Ok(newest_first(pensioners, |u| u.created_at))
    }

    async fn find_certificate_for_period(
        &self,
        user_id: Uuid,
        period: Period,
    ) -> AppResult<Option<LifeCertificate>> {
        let t = self.lock()?;
        Ok(t.certificates
            .iter()
            .find(|c| c.user_id == user_id && c.period() == period)
            .cloned())
    }

    async fn insert_certificate(&self, new: NewCertificate) -> AppResult<LifeCertificate> {
        let mut t = self.lock()?;
        if t.certificates
            .iter()
            .any(|c| c.user_id == new.user_id && c.period() == new.period)
        {
            return Err(AppError::AlreadySubmitted);
        }
        let now = OffsetDateTime::now_utc();
        let cert = LifeCertificate {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            submission_date: now,
            month: new.period.month,
            year: new.period.year,
            witness_name: new.witness.name,
            witness_phone: new.witness.phone,
            witness_relationship: new.witness.relationship,
            certificate_photo_url: new.photo_url,
            status: CertificateStatus::Pending,
            admin_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
        };
        t.certificates.push(cert.clone());
        Ok(cert)
    }

    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<LifeCertificate>> {
        let t = self.lock()?;
        Ok(t.certificates.iter().find(|c| c.id == id).cloned())
    }

    async fn list_certificates_by_user(&self, user_id: Uuid) -> AppResult<Vec<LifeCertificate>> {
        let t = self.lock()?;
        let owned = t
            .certificates
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned();
        Ok(newest_first(owned, |c| c.created_at))
    }

    async fn list_certificates(&self) -> AppResult<Vec<LifeCertificate>> {
        let t = self.lock()?;
        Ok(newest_first(t.certificates.iter().cloned(), |c| c.created_at))
    }

    async fn review_certificate(
        &self,
        id: Uuid,
        review: Review,
    ) -> AppResult<Option<LifeCertificate>> {
        let mut t = self.lock()?;
        let Some(cert) = t.certificates.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        cert.status = review.status;
        cert.admin_notes = review.notes;
        cert.reviewed_by = Some(review.reviewed_by);
        cert.reviewed_at = Some(review.reviewed_at);
        Ok(Some(cert.clone()))
    }

    async fn revoke_session(&self, session_id: Uuid, _user_id: Uuid) -> AppResult<()> {
        self.lock()?.revoked_sessions.insert(session_id);
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: Uuid) -> AppResult<bool> {
        Ok(self.lock()?.revoked_sessions.contains(&session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Witness;

    fn new_cert(user_id: Uuid, month: u8) -> NewCertificate {
        NewCertificate {
            user_id,
            period: Period::new(month, 2024).unwrap(),
            witness: Witness {
                name: "Jane Doe".into(),
                phone: "555-0100".into(),
                relationship: "Neighbor".into(),
            },
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn insert_enforces_one_certificate_per_period() {
        let repo = MemoryRepository::new();
        let user = Uuid::new_v4();
        repo.insert_certificate(new_cert(user, 6)).await.unwrap();

        let err = repo.insert_certificate(new_cert(user, 6)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadySubmitted));

        // other period and other user are fine
        repo.insert_certificate(new_cert(user, 7)).await.unwrap();
        repo.insert_certificate(new_cert(Uuid::new_v4(), 6)).await.unwrap();
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let repo = MemoryRepository::new();
        let user = Uuid::new_v4();
        let first = repo.insert_certificate(new_cert(user, 1)).await.unwrap();
        let second = repo.insert_certificate(new_cert(user, 2)).await.unwrap();

        let ids: Vec<Uuid> = repo
            .list_certificates_by_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn review_of_missing_row_is_none() {
        let repo = MemoryRepository::new();
        let review = Review {
            status: CertificateStatus::Approved,
            notes: None,
            reviewed_by: Uuid::new_v4(),
            reviewed_at: OffsetDateTime::now_utc(),
        };
        assert!(repo
            .review_certificate(Uuid::new_v4(), review)
            .await
            .unwrap()
            .is_none());
    }
}
