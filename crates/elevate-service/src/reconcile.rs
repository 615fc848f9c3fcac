//! Reconciliation sweep for invitations interrupted between the identity
//! and the profile write.
//!
//! Only identities carrying an `invited_by` marker are considered, and only
//! once they are older than the configured minimum age, so an invitation
//! that is still running is never touched.

use serde::Serialize;

use elevate_db::error::{DbError, UniqueField};
use elevate_db::model::user::NewUser;

use crate::auth::authenticate;
use crate::context::ServiceDeps;
use crate::error::ServiceResult;
use crate::guard::{provider_call, store_call};
use crate::identity::{GatewayError, Identity};
use crate::policy::Action;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Identities listed by the provider.
    pub examined: usize,
    /// Orphans whose profile was written.
    pub completed: usize,
    /// Orphans whose identity was deleted.
    pub discarded: usize,
    /// Identities left alone (too young or not ours).
    pub skipped: usize,
    /// Orphans that could be neither completed nor discarded this time.
    pub failed: usize,
}

enum Resolution {
    Completed,
    Discarded,
    Failed,
}

/// ## Summary
/// Finds invited identities without a profile and either writes the profile
/// from the invitation metadata or deletes the identity.
///
/// ## Side Effects
/// - Inserts `users` rows for recoverable orphans
/// - Deletes provider identities that cannot be recovered
///
/// ## Errors
/// Returns `Provider` or `Persistence` only if the identities or existing
/// profile ids cannot be listed; per-identity failures are counted instead.
#[tracing::instrument(skip_all)]
pub async fn sweep(deps: &ServiceDeps) -> ServiceResult<ReconcileReport> {
    let limits = &deps.limits;
    let identities =
        provider_call(limits.identity_timeout, deps.identity.list_identities()).await?;

    let ids: Vec<uuid::Uuid> = identities.iter().map(|identity| identity.id).collect();
    let with_profile =
        store_call(limits.store_timeout, deps.store.existing_user_ids(&ids)).await?;

    let cutoff = chrono::Utc::now() - limits.reconcile_min_age;
    let mut report = ReconcileReport {
        examined: identities.len(),
        ..ReconcileReport::default()
    };

    for identity in &identities {
        if with_profile.contains(&identity.id) {
            continue;
        }
        let invited = identity
            .metadata
            .as_ref()
            .is_some_and(|m| m.invited_by.is_some());
        if !invited || identity.created_at > cutoff {
            report.skipped += 1;
            continue;
        }

        match resolve_orphan(deps, identity).await {
            Resolution::Completed => report.completed += 1,
            Resolution::Discarded => report.discarded += 1,
            Resolution::Failed => report.failed += 1,
        }
    }

    if report.completed + report.discarded + report.failed > 0 {
        tracing::info!(?report, "Reconciliation sweep finished");
    } else {
        tracing::debug!(?report, "Reconciliation sweep found nothing to do");
    }
    Ok(report)
}

/// ## Summary
/// Runs [`sweep`] on behalf of an actor.
///
/// ## Errors
/// - `Unauthenticated`, `Unauthorized` (non-creator), plus the errors of [`sweep`]
#[tracing::instrument(skip_all)]
pub async fn reconcile_now(deps: &ServiceDeps, token: &str) -> ServiceResult<ReconcileReport> {
    let actor = authenticate(deps, token).await?;
    deps.policy.require(actor.role(), Action::Reconcile, None)?;

    tracing::info!(user_id = %actor.id(), "Reconciliation requested");
    sweep(deps).await
}

/// Builds the profile an orphaned identity should have had, if its metadata
/// still describes a valid invitation.
fn recover_profile(identity: &Identity) -> Option<NewUser> {
    let metadata = identity.metadata.as_ref()?;
    let email = elevate_core::util::email::normalize_email(identity.email.as_deref()?).ok()?;
    let name = metadata.name.trim();

    if name.is_empty() || !metadata.role.is_invitable() {
        return None;
    }

    Some(NewUser {
        id: identity.id,
        name: name.to_string(),
        email,
        role: metadata.role,
        organization_id: metadata.organization_id,
        created_at: identity.created_at,
    })
}

async fn resolve_orphan(deps: &ServiceDeps, identity: &Identity) -> Resolution {
    let Some(new_user) = recover_profile(identity) else {
        tracing::warn!(subject = %identity.id, "Orphaned identity has unusable invitation metadata");
        return discard(deps, identity.id).await;
    };

    match store_call(deps.limits.store_timeout, deps.store.insert_user(&new_user)).await {
        Ok(_) => {
            tracing::info!(user_id = %new_user.id, role = %new_user.role, "Orphaned invitation completed");
            Resolution::Completed
        }
        // Written concurrently by the invitation itself.
        Err(DbError::UniqueViolation(UniqueField::Id)) => Resolution::Completed,
        Err(DbError::UniqueViolation(UniqueField::Email)) => {
            tracing::warn!(subject = %identity.id, "Email of orphaned identity belongs to another profile");
            discard(deps, identity.id).await
        }
        Err(e) => {
            tracing::error!(subject = %identity.id, error = %e, "Could not complete orphaned invitation");
            Resolution::Failed
        }
    }
}

async fn discard(deps: &ServiceDeps, subject: uuid::Uuid) -> Resolution {
    match provider_call(
        deps.limits.identity_timeout,
        deps.identity.delete_identity(subject),
    )
    .await
    {
        Ok(()) | Err(GatewayError::NotFound) => {
            tracing::info!(subject = %subject, "Orphaned identity discarded");
            Resolution::Discarded
        }
        Err(e) => {
            tracing::error!(subject = %subject, error = %e, "Could not discard orphaned identity");
            Resolution::Failed
        }
    }
}
