//! Reference checks across domains
//!
//! The facade keeps shares and rules pointing at live users, but records
//! written around it (hand-edited files, another writer) can still dangle.
//! [`Storage::verify_integrity`] reports such records and
//! [`Storage::repair_integrity`] fixes them the way a user deletion would:
//! dangling shares are deleted, dangling rule subjects are cleared.

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

use super::{
    OpContext, Storage,
    context::Steps,
    locks::{KeyGuard, LockKey},
};
use crate::{Result, RuleId, ShareKey, UserKey};

/// Records whose user reference does not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Shares whose owner does not exist
    pub dangling_shares: Vec<ShareKey>,
    /// Rules whose subject does not exist
    pub dangling_rules: Vec<RuleId>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.dangling_shares.is_empty() && self.dangling_rules.is_empty()
    }

    /// Total number of dangling records.
    pub fn len(&self) -> usize {
        self.dangling_shares.len() + self.dangling_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_consistent()
    }
}

impl Storage {
    /// Scan every share and rule for references to missing users.
    ///
    /// Read-only, and takes no locks: the result is a snapshot.
    pub async fn verify_integrity(&self, ctx: &OpContext) -> Result<IntegrityReport> {
        let ctx = self.effective(ctx);
        let steps = Steps::new(&ctx, "verify_integrity");
        let stores = self.stores();
        let mut report = IntegrityReport::default();

        steps.check()?;
        for share in stores.shares.list_shares().await? {
            steps.check()?;
            if stores.users.get_user(&share.owner).await?.is_none() {
                report.dangling_shares.push(share.key);
            }
        }

        steps.check()?;
        for rule in stores.auth.list_rules().await? {
            let Some(subject) = &rule.subject else {
                continue;
            };
            steps.check()?;
            if stores.users.get_user(subject).await?.is_none() {
                report.dangling_rules.push(rule.id);
            }
        }

        if !report.is_consistent() {
            warn!(
                shares = report.dangling_shares.len(),
                rules = report.dangling_rules.len(),
                "Found dangling references"
            );
        }
        Ok(report)
    }

    /// Delete dangling shares and clear dangling rule subjects.
    ///
    /// Each record is re-checked under the same locks the cascade uses
    /// before it is changed; the report lists only what was repaired.
    pub async fn repair_integrity(&self, ctx: &OpContext) -> Result<IntegrityReport> {
        let ctx = self.effective(ctx);
        self.repair(&ctx)
            .instrument(info_span!("repair_integrity"))
            .await
    }

    async fn repair(&self, ctx: &OpContext) -> Result<IntegrityReport> {
        let found = self.verify_integrity(ctx).await?;
        let mut steps = Steps::new(ctx, "repair_integrity");
        let stores = self.stores();
        let mut repaired = IntegrityReport::default();

        for key in found.dangling_shares {
            let Some(share) = stores.shares.get_share(&key).await? else {
                continue;
            };
            let Some(_owner) = self.lock_missing_user(&steps, &share.owner).await? else {
                continue;
            };
            let _share = steps
                .lock(self.locks(), LockKey::Share(key.clone()))
                .await?;
            steps.check()?;
            let still_dangling = stores
                .shares
                .get_share(&key)
                .await?
                .is_some_and(|current| current.owner == share.owner);
            if still_dangling {
                stores.shares.delete_share(&key).await?;
                steps.complete();
                repaired.dangling_shares.push(key);
            }
        }

        for id in found.dangling_rules {
            let Some(subject) = stores.auth.get_rule(&id).await?.and_then(|r| r.subject) else {
                continue;
            };
            let Some(_subject) = self.lock_missing_user(&steps, &subject).await? else {
                continue;
            };
            let _rule = steps.lock(self.locks(), LockKey::Rule(id.clone())).await?;
            steps.check()?;
            if let Some(mut current) = stores.auth.get_rule(&id).await?
                && current.references(&subject)
            {
                current.clear_subject();
                stores.auth.put_rule(current).await?;
                steps.complete();
                repaired.dangling_rules.push(id);
            }
        }

        info!(
            shares = repaired.dangling_shares.len(),
            rules = repaired.dangling_rules.len(),
            "Repaired dangling references"
        );
        Ok(repaired)
    }

    /// Lock `user` and confirm it is still missing. `None` means the user
    /// exists after all and its lock has been released.
    async fn lock_missing_user(
        &self,
        steps: &Steps<'_>,
        user: &UserKey,
    ) -> Result<Option<KeyGuard>> {
        let guard = steps
            .lock(self.locks(), LockKey::User(user.clone()))
            .await?;
        steps.check()?;
        if self.stores().users.get_user(user).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(guard))
    }
}
