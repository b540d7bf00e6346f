//! Auth-rule operations

use tracing::info;

use super::{
    OpContext, Storage,
    context::Steps,
    errors::{Domain, StorageError},
    locks::{KeyGuard, LockKey},
};
use crate::{Result, RuleId, auth::AuthRule};

impl Storage {
    /// Insert or replace an auth rule.
    ///
    /// A rule with a subject is only written while the subject exists, under
    /// the subject's lock, so it cannot race with the subject's deletion.
    pub async fn upsert_auth_rule(&self, ctx: &OpContext, rule: AuthRule) -> Result<()> {
        rule.validate()?;

        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "upsert_auth_rule");
        let stores = self.stores();

        let _subject: Option<KeyGuard> = match &rule.subject {
            Some(subject) => {
                let guard = steps
                    .lock(self.locks(), LockKey::User(subject.clone()))
                    .await?;
                steps.check()?;
                if stores.users.get_user(subject).await?.is_none() {
                    return Err(StorageError::dangling(Domain::AuthRule, &rule.id, subject).into());
                }
                Some(guard)
            }
            None => None,
        };

        let _rule = steps
            .lock(self.locks(), LockKey::Rule(rule.id.clone()))
            .await?;
        steps.check()?;
        let id = rule.id.clone();
        let method = rule.method.name();
        stores.auth.put_rule(rule).await?;
        info!(rule = %id, method, "Stored auth rule");
        Ok(())
    }

    pub async fn get_auth_rule(&self, ctx: &OpContext, id: &RuleId) -> Result<AuthRule> {
        let ctx = self.effective(ctx);
        Steps::new(&ctx, "get_auth_rule").check()?;
        self.stores()
            .auth
            .get_rule(id)
            .await?
            .ok_or_else(|| StorageError::not_found(Domain::AuthRule, id).into())
    }

    pub async fn list_auth_rules(&self, ctx: &OpContext) -> Result<Vec<AuthRule>> {
        let ctx = self.effective(ctx);
        Steps::new(&ctx, "list_auth_rules").check()?;
        self.stores().auth.list_rules().await
    }

    /// Delete an auth rule. Fails with `NotFound` if it does not exist.
    pub async fn delete_auth_rule(&self, ctx: &OpContext, id: &RuleId) -> Result<()> {
        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "delete_auth_rule");
        let auth = &self.stores().auth;

        let _guard = steps.lock(self.locks(), LockKey::Rule(id.clone())).await?;
        steps.check()?;
        if auth.get_rule(id).await?.is_none() {
            return Err(StorageError::not_found(Domain::AuthRule, id).into());
        }

        steps.check()?;
        auth.delete_rule(id).await?;
        info!(rule = %id, "Deleted auth rule");
        Ok(())
    }
}
