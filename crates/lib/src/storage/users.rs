//! User operations, including the deletion cascade.

use std::future::Future;

use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    OpContext, Storage,
    context::Steps,
    errors::{CascadeStep, Domain, StorageError},
    locks::LockKey,
};
use crate::{Error, Result, UserKey, user::User};

impl Storage {
    /// Record a new user.
    ///
    /// Fails with `InvalidRecord` if the record is malformed and with
    /// `DuplicateKey` if the key is taken or was retired by an earlier
    /// deletion. No other domain is touched.
    pub async fn create_user(&self, ctx: &OpContext, mut user: User) -> Result<UserKey> {
        user.validate()?;

        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "create_user");
        let users = &self.stores().users;
        let _guard = steps
            .lock(self.locks(), LockKey::User(user.key.clone()))
            .await?;

        steps.check()?;
        if users.is_retired(&user.key).await? {
            return Err(StorageError::retired(&user.key).into());
        }
        if users.get_user(&user.key).await?.is_some() {
            return Err(StorageError::duplicate(Domain::User, &user.key).into());
        }

        steps.check()?;
        user.created_at = self.now_secs();
        let key = user.key.clone();
        users.put_user(user).await?;
        info!(user = %key, "Created user");
        Ok(key)
    }

    /// Fetch a user by key.
    pub async fn get_user(&self, ctx: &OpContext, key: &UserKey) -> Result<User> {
        let ctx = self.effective(ctx);
        Steps::new(&ctx, "get_user").check()?;
        self.stores()
            .users
            .get_user(key)
            .await?
            .ok_or_else(|| StorageError::not_found(Domain::User, key).into())
    }

    pub async fn list_users(&self, ctx: &OpContext) -> Result<Vec<User>> {
        let ctx = self.effective(ctx);
        Steps::new(&ctx, "list_users").check()?;
        self.stores().users.list_users().await
    }

    /// Replace a user's attributes. The key and creation time are kept.
    pub async fn update_user(&self, ctx: &OpContext, mut user: User) -> Result<()> {
        user.validate()?;

        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "update_user");
        let users = &self.stores().users;
        let _guard = steps
            .lock(self.locks(), LockKey::User(user.key.clone()))
            .await?;

        steps.check()?;
        let existing = users
            .get_user(&user.key)
            .await?
            .ok_or_else(|| StorageError::not_found(Domain::User, &user.key))?;

        steps.check()?;
        user.created_at = existing.created_at;
        users.put_user(user).await
    }

    /// Delete a user and everything that references it.
    ///
    /// Steps, in order: delete every share the user owns, clear the user from
    /// every auth rule that names it (the rule becomes global), then delete
    /// the user record. The user's lock is held throughout, so no share or
    /// rule can be attached to the user while the cascade runs.
    ///
    /// A store failure before any dependent was touched is returned as is.
    /// A failure after that is reported as `CascadeFailed` with the step
    /// and key; the user record still exists and calling `delete_user`
    /// again finishes the job. Cancellation and deadlines stop the cascade
    /// between steps, with the same retry guarantee.
    pub async fn delete_user(&self, ctx: &OpContext, key: &UserKey) -> Result<()> {
        let ctx = self.effective(ctx);
        self.delete_user_cascade(&ctx, key)
            .instrument(info_span!("delete_user", user = %key))
            .await
    }

    async fn delete_user_cascade(&self, ctx: &OpContext, key: &UserKey) -> Result<()> {
        let mut steps = Steps::new(ctx, "delete_user");
        let stores = self.stores();
        let _guard = steps.lock(self.locks(), LockKey::User(key.clone())).await?;

        steps.check()?;
        if stores.users.get_user(key).await?.is_none() {
            return Err(StorageError::not_found(Domain::User, key).into());
        }

        steps.check()?;
        let shares = cascade(
            &steps,
            key,
            CascadeStep::ListShares,
            stores.shares.list_shares_by_owner(key),
        )
        .await?;
        let share_count = shares.len();
        for share in shares {
            steps.check()?;
            cascade(
                &steps,
                key,
                CascadeStep::DeleteShare(share.key.clone()),
                stores.shares.delete_share(&share.key),
            )
            .await?;
            steps.complete();
            debug!(share = %share.key, "Deleted owned share");
        }

        steps.check()?;
        let rules = cascade(
            &steps,
            key,
            CascadeStep::ListRules,
            stores.auth.list_rules_by_subject(key),
        )
        .await?;
        let mut cleared = 0;
        for rule in rules {
            steps.check()?;
            let step = CascadeStep::ClearRule(rule.id.clone());
            let _rule_guard = steps
                .lock(self.locks(), LockKey::Rule(rule.id.clone()))
                .await?;
            // The rule may have been retargeted since it was listed.
            let current = cascade(&steps, key, step.clone(), stores.auth.get_rule(&rule.id)).await?;
            let Some(mut current) = current.filter(|r| r.references(key)) else {
                continue;
            };
            current.clear_subject();
            cascade(&steps, key, step, stores.auth.put_rule(current)).await?;
            steps.complete();
            cleared += 1;
            debug!(rule = %rule.id, "Cleared auth rule subject");
        }

        steps.check()?;
        cascade(
            &steps,
            key,
            CascadeStep::DeleteUser,
            stores.users.delete_user(key),
        )
        .await?;
        info!(shares = share_count, rules = cleared, "Deleted user");
        Ok(())
    }
}

/// Run one cascade step, attributing a failure to it once earlier steps
/// have already written.
async fn cascade<T>(
    steps: &Steps<'_>,
    user: &UserKey,
    step: CascadeStep,
    op: impl Future<Output = Result<T>>,
) -> Result<T> {
    op.await.map_err(|err| -> Error {
        if steps.completed() == 0 {
            return err;
        }
        warn!(%step, completed = steps.completed(), error = %err, "Cascade interrupted");
        StorageError::CascadeFailed {
            user: user.clone(),
            step,
            completed: steps.completed(),
            source: Box::new(err),
        }
        .into()
    })
}
