//! Share operations

use tracing::{debug, info};

use super::{
    OpContext, Storage,
    context::Steps,
    errors::{Domain, StorageError},
    locks::LockKey,
};
use crate::{Result, ShareKey, UserKey, share::Share};

impl Storage {
    /// Record a new share for an existing user.
    ///
    /// The owner's lock is held from the existence check through the write,
    /// so a concurrent `delete_user` for the owner either runs entirely
    /// before (and this fails with `DanglingReference`) or entirely after
    /// (and its cascade removes this share).
    ///
    /// An expired share still occupying the key is replaced.
    pub async fn create_share(&self, ctx: &OpContext, mut share: Share) -> Result<ShareKey> {
        let now = self.now_secs();
        share.validate(now)?;

        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "create_share");
        let stores = self.stores();

        let _owner = steps
            .lock(self.locks(), LockKey::User(share.owner.clone()))
            .await?;
        steps.check()?;
        if stores.users.get_user(&share.owner).await?.is_none() {
            return Err(StorageError::dangling(Domain::Share, &share.key, &share.owner).into());
        }

        let _share = steps
            .lock(self.locks(), LockKey::Share(share.key.clone()))
            .await?;
        steps.check()?;
        if let Some(existing) = stores.shares.get_share(&share.key).await? {
            if !existing.is_expired(now) {
                return Err(StorageError::duplicate(Domain::Share, &share.key).into());
            }
            debug!(share = %share.key, "Replacing expired share");
        }

        steps.check()?;
        share.created_at = now;
        let key = share.key.clone();
        let owner = share.owner.clone();
        stores.shares.put_share(share).await?;
        info!(share = %key, owner = %owner, "Created share");
        Ok(key)
    }

    /// Fetch a share. Expired shares are reported as `NotFound`.
    pub async fn get_share(&self, ctx: &OpContext, key: &ShareKey) -> Result<Share> {
        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "get_share");
        steps.check()?;

        let now = self.now_secs();
        match self.stores().shares.get_share(key).await? {
            Some(share) if !share.is_expired(now) => Ok(share),
            Some(_) => {
                if self.config().purge_expired_shares {
                    self.purge_expired(&steps, key).await?;
                }
                Err(StorageError::not_found(Domain::Share, key).into())
            }
            None => Err(StorageError::not_found(Domain::Share, key).into()),
        }
    }

    /// List live shares, optionally only those owned by `owner`.
    pub async fn list_shares(&self, ctx: &OpContext, owner: Option<&UserKey>) -> Result<Vec<Share>> {
        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "list_shares");
        steps.check()?;

        let shares = match owner {
            Some(owner) => self.stores().shares.list_shares_by_owner(owner).await?,
            None => self.stores().shares.list_shares().await?,
        };

        let now = self.now_secs();
        let (expired, live): (Vec<_>, Vec<_>) =
            shares.into_iter().partition(|share| share.is_expired(now));
        if self.config().purge_expired_shares {
            for share in &expired {
                self.purge_expired(&steps, &share.key).await?;
            }
        }
        Ok(live)
    }

    /// Delete a share. Fails with `NotFound` if it does not exist.
    pub async fn delete_share(&self, ctx: &OpContext, key: &ShareKey) -> Result<()> {
        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "delete_share");
        let shares = &self.stores().shares;

        let _guard = steps
            .lock(self.locks(), LockKey::Share(key.clone()))
            .await?;
        steps.check()?;
        if shares.get_share(key).await?.is_none() {
            return Err(StorageError::not_found(Domain::Share, key).into());
        }

        steps.check()?;
        shares.delete_share(key).await?;
        info!(share = %key, "Deleted share");
        Ok(())
    }

    /// Remove a share if it is still expired once its lock is held.
    async fn purge_expired(&self, steps: &Steps<'_>, key: &ShareKey) -> Result<()> {
        let shares = &self.stores().shares;
        let _guard = steps
            .lock(self.locks(), LockKey::Share(key.clone()))
            .await?;
        steps.check()?;

        let now = self.now_secs();
        if let Some(share) = shares.get_share(key).await?
            && share.is_expired(now)
        {
            shares.delete_share(key).await?;
            debug!(share = %key, "Purged expired share");
        }
        Ok(())
    }
}
