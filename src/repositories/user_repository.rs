use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, to_bson},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, IndexModel,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Principal, UserProfile, UserRecord, UserRole},
};

const BOOTSTRAP_KEY: &str = "admin-bootstrap";
const DUPLICATE_KEY: i32 = 11000;

/// Marker written exactly once, when the first administrator is claimed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRecord {
    #[serde(rename = "_id")]
    pub key: String,
    pub principal: Principal,
    pub token_hash: String,
    pub claimed_at: DateTime<Utc>,
}

impl BootstrapRecord {
    pub fn new(principal: Principal, token_hash: &str) -> Self {
        Self {
            key: BOOTSTRAP_KEY.to_string(),
            principal,
            token_hash: token_hash.to_string(),
            claimed_at: Utc::now(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_principal(&self, principal: &Principal) -> AppResult<Option<UserRecord>>;
    /// Creates the record when missing.
    async fn set_role(&self, principal: &Principal, role: UserRole) -> AppResult<UserRecord>;
    /// Creates the record when missing.
    async fn save_profile(
        &self,
        principal: &Principal,
        profile: UserProfile,
    ) -> AppResult<UserRecord>;
    async fn admin_exists(&self) -> AppResult<bool>;
    /// Atomically records the one-time bootstrap and makes `principal` admin.
    /// Every call after the first fails with `AlreadyInitialized`.
    async fn claim_initial_admin(
        &self,
        principal: &Principal,
        token_hash: &str,
    ) -> AppResult<UserRecord>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<UserRecord>,
    bootstrap: Collection<BootstrapRecord>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection("users"),
            bootstrap: db.get_collection("system_bootstrap"),
        }
    }

    async fn load(&self, principal: &Principal) -> AppResult<UserRecord> {
        self.find_by_principal(principal).await?.ok_or_else(|| {
            AppError::DatabaseError(format!("user '{}' missing after upsert", principal))
        })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Runs the second half of a claim. If `promote` fails, `release` undoes the
/// marker so a later claim can succeed, and the promotion error is returned.
async fn promote_or_release<T>(
    promote: impl Future<Output = AppResult<T>>,
    release: impl Future<Output = AppResult<()>>,
) -> AppResult<T> {
    match promote.await {
        Ok(value) => Ok(value),
        Err(err) => {
            log::error!("Admin promotion failed, releasing bootstrap marker: {}", err);
            if let Err(release_err) = release.await {
                log::error!("Failed to release bootstrap marker: {}", release_err);
            }
            Err(err)
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_principal(&self, principal: &Principal) -> AppResult<Option<UserRecord>> {
        let user = self
            .collection
            .find_one(doc! { "principal": principal.as_str() })
            .await?;
        Ok(user)
    }

    async fn set_role(&self, principal: &Principal, role: UserRole) -> AppResult<UserRecord> {
        self.collection
            .update_one(
                doc! { "principal": principal.as_str() },
                doc! { "$set": { "role": to_bson(&role)?, "modifiedAt": to_bson(&Utc::now())? } },
            )
            .upsert(true)
            .await?;

        self.load(principal).await
    }

    async fn save_profile(
        &self,
        principal: &Principal,
        profile: UserProfile,
    ) -> AppResult<UserRecord> {
        self.collection
            .update_one(
                doc! { "principal": principal.as_str() },
                doc! {
                    "$set": { "profile": to_bson(&profile)?, "modifiedAt": to_bson(&Utc::now())? },
                    "$setOnInsert": { "role": to_bson(&UserRole::default())? },
                },
            )
            .upsert(true)
            .await?;

        self.load(principal).await
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        if self.bootstrap.count_documents(doc! {}).await? > 0 {
            return Ok(true);
        }
        let admins = self
            .collection
            .count_documents(doc! { "role": to_bson(&UserRole::Admin)? })
            .await?;
        Ok(admins > 0)
    }

    async fn claim_initial_admin(
        &self,
        principal: &Principal,
        token_hash: &str,
    ) -> AppResult<UserRecord> {
        let record = BootstrapRecord::new(principal.clone(), token_hash);

        // the fixed _id makes the insert the single point of serialization
        if let Err(err) = self.bootstrap.insert_one(&record).await {
            if is_duplicate_key(&err) {
                return Err(AppError::AlreadyInitialized(
                    "an administrator has already been claimed".to_string(),
                ));
            }
            return Err(err.into());
        }

        let promote = self.set_role(principal, UserRole::Admin);
        let release = async {
            self.bootstrap
                .delete_one(doc! { "_id": BOOTSTRAP_KEY })
                .await
                .map(|_| ())
                .map_err(AppError::from)
        };
        promote_or_release(promote, release).await
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let options = IndexOptions::builder().unique(true).build();
        let model = IndexModel::builder()
            .keys(doc! { "principal": 1 })
            .options(options)
            .build();

        self.collection.create_index(model).await?;
        log::info!("Created unique index on users.principal");

        Ok(())
    }
}
