//! Deletion service: provider first, then the profile row.

use elevate_service::deletion::delete;
use elevate_service::identity::{GatewayError, IdentityGateway};

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn unknown_target_is_not_found_without_side_effects() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let result = delete(&harness.deps, &creator.token, uuid::Uuid::new_v4()).await;

    assert_code(&result, ErrorCode::NotFound);
    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn deleted_account_can_no_longer_sign_in() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let player = harness.player(None);

    harness
        .identity
        .sign_in("player@example.com", SEED_PASSWORD)
        .await
        .expect("player can sign in before deletion");

    let outcome = delete(&harness.deps, &creator.token, player.user.id)
        .await
        .expect("creator may delete players");
    assert_eq!(outcome.user_id, player.user.id);
    assert_eq!(outcome.role, Role::Player);

    assert!(harness.store.user(player.user.id).is_none());
    assert!(harness.identity.identity(player.user.id).is_none());
    assert!(matches!(
        harness
            .identity
            .sign_in("player@example.com", SEED_PASSWORD)
            .await,
        Err(GatewayError::InvalidCredentials)
    ));

    // The deleted account's bearer token is revoked too.
    let whoami = elevate_service::directory::whoami(&harness.deps, &player.token).await;
    assert_code(&whoami, ErrorCode::Unauthenticated);
}

#[test_log::test(tokio::test)]
async fn admin_cannot_delete_admin() {
    let harness = TestHarness::new().await;
    let admin = harness.admin(None);
    let other = harness.seed_account("Other Admin", "other@example.com", Role::Admin, None);

    let result = delete(&harness.deps, &admin.token, other.user.id).await;

    assert_code(&result, ErrorCode::Unauthorized);
    assert!(harness.store.user(other.user.id).is_some());
    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn admin_deletes_player() {
    let harness = TestHarness::new().await;
    let admin = harness.admin(None);
    let player = harness.player(None);

    delete(&harness.deps, &admin.token, player.user.id)
        .await
        .expect("admin may delete players");

    assert_eq!(harness.store.count_role(Role::Player), 0);
}

#[test_log::test(tokio::test)]
async fn nobody_deletes_the_creator() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let admin = harness.admin(None);

    let result = delete(&harness.deps, &admin.token, creator.user.id).await;
    assert_code(&result, ErrorCode::Unauthorized);
    assert_eq!(harness.store.count_role(Role::Creator), 1);
}

#[test_log::test(tokio::test)]
async fn self_deletion_is_rejected() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let admin = harness.admin(None);

    for account in [&creator, &admin] {
        let result = delete(&harness.deps, &account.token, account.user.id).await;
        assert_code(&result, ErrorCode::ValidationError);
        assert!(harness.store.user(account.user.id).is_some());
        assert!(harness.identity.identity(account.user.id).is_some());
    }
    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn missing_identity_still_removes_profile() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let player = harness.player(None);
    harness
        .identity
        .delete_identity(player.user.id)
        .await
        .expect("identity removed out of band");

    delete(&harness.deps, &creator.token, player.user.id)
        .await
        .expect("deletion completes without the identity");

    assert!(harness.store.user(player.user.id).is_none());
}

#[test_log::test(tokio::test)]
async fn provider_failure_keeps_the_profile() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let player = harness.player(None);
    harness
        .identity
        .fail_next(GatewayOp::Delete, GatewayError::Timeout);

    let result = delete(&harness.deps, &creator.token, player.user.id).await;

    assert_code(&result, ErrorCode::ProviderError);
    assert!(harness.store.user(player.user.id).is_some());
    assert!(harness.identity.identity(player.user.id).is_some());
}

#[test_log::test(tokio::test)]
async fn transient_profile_delete_failure_is_retried() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let player = harness.player(None);
    harness.store.fail_next_deletes(2);

    delete(&harness.deps, &creator.token, player.user.id)
        .await
        .expect("third attempt succeeds");

    assert!(harness.store.user(player.user.id).is_none());
}

#[test_log::test(tokio::test)]
async fn exhausted_profile_delete_reports_persistence_error() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let player = harness.player(None);
    harness.store.fail_next_deletes(10);

    let result = delete(&harness.deps, &creator.token, player.user.id).await;

    assert_code(&result, ErrorCode::PersistenceError);
    // The identity is gone, so the account cannot sign in even though the
    // profile row remains.
    assert!(harness.store.user(player.user.id).is_some());
    assert!(
        harness
            .identity
            .sign_in("player@example.com", SEED_PASSWORD)
            .await
            .is_err()
    );
}
