//! Invitation service: two-phase creation, duplicate handling, and
//! partial-failure behaviour.

use elevate_db::model::user::User;
use elevate_service::identity::GatewayError;
use elevate_service::invitation::{InviteRequest, invite};

use super::helpers::*;

fn request(name: &str, email: &str, role: Role) -> InviteRequest {
    InviteRequest {
        name: name.to_string(),
        email: email.to_string(),
        role,
        organization_id: None,
    }
}

#[test_log::test(tokio::test)]
async fn admin_invites_player_but_not_admin() {
    let harness = TestHarness::new().await;
    let admin = harness.admin(None);

    let denied = invite(
        &harness.deps,
        &admin.token,
        request("Taro", "taro@example.com", Role::Admin),
    )
    .await;
    assert_code(&denied, ErrorCode::Unauthorized);
    assert!(harness.store.users_with_email("taro@example.com").is_empty());

    let outcome = invite(
        &harness.deps,
        &admin.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await
    .expect("admin may invite players");

    let stored = harness.store.user(outcome.user_id).expect("profile written");
    assert_eq!(stored.name, "Taro");
    assert_eq!(stored.email, "taro@example.com");
    assert_eq!(stored.role, Role::Player);
    assert!(harness.identity.identity(outcome.user_id).is_some());
}

#[test_log::test(tokio::test)]
async fn invitation_stamps_metadata_and_activation() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let outcome = invite(
        &harness.deps,
        &creator.token,
        request("  Hanako ", "Hanako@Example.COM", Role::Admin),
    )
    .await
    .expect("creator may invite admins");

    let identity = harness
        .identity
        .identity(outcome.user_id)
        .expect("identity created");
    let metadata = identity.metadata.expect("invitation metadata attached");
    assert_eq!(metadata.name, "Hanako");
    assert_eq!(metadata.role, Role::Admin);
    assert_eq!(metadata.invited_by, Some(creator.user.id));
    assert_eq!(identity.email.as_deref(), Some("hanako@example.com"));
    assert!(harness.identity.activation_token_for("hanako@example.com").is_some());
}

#[test_log::test(tokio::test)]
async fn existing_email_is_rejected_before_any_side_effect() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let _existing = harness.player(None);

    let result = invite(
        &harness.deps,
        &creator.token,
        request("Again", "player@example.com", Role::Player),
    )
    .await;

    assert_code(&result, ErrorCode::DuplicateEmail);
    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn concurrent_duplicate_invites_yield_one_account() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let (first, second) = tokio::join!(
        invite(
            &harness.deps,
            &creator.token,
            request("Taro", "taro@example.com", Role::Player),
        ),
        invite(
            &harness.deps,
            &creator.token,
            request("Taro", "taro@example.com", Role::Player),
        ),
    );

    let outcomes = [&first, &second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes
        .iter()
        .find(|r| r.is_err())
        .expect("one invitation loses");
    assert_code(loser, ErrorCode::DuplicateEmail);

    assert_eq!(harness.store.users_with_email("taro@example.com").len(), 1);
    assert_eq!(harness.identity.identities_with_email("taro@example.com"), 1);
}

#[test_log::test(tokio::test)]
async fn lost_store_race_compensates_the_identity() {
    let harness = TestHarness::new().await;
    harness.identity.accept_duplicate_emails(true);
    let creator = harness.creator();

    let (first, second) = tokio::join!(
        invite(
            &harness.deps,
            &creator.token,
            request("Taro", "taro@example.com", Role::Player),
        ),
        invite(
            &harness.deps,
            &creator.token,
            request("Taro", "taro@example.com", Role::Player),
        ),
    );

    let winner = first.as_ref().or(second.as_ref()).expect("one invitation wins");
    assert!(first.is_ok() != second.is_ok());
    assert_eq!(harness.store.users_with_email("taro@example.com").len(), 1);

    // The loser's identity was deleted again; only the winner's remains.
    assert_eq!(harness.identity.identities_with_email("taro@example.com"), 1);
    assert!(harness.identity.identity(winner.user_id).is_some());
}

#[test_log::test(tokio::test)]
async fn concurrent_reinvites_sharing_a_subject_yield_one_account() {
    let harness = TestHarness::new().await;
    harness.identity.reinvite_pending(true);
    let creator = harness.creator();

    let (first, second) = tokio::join!(
        invite(
            &harness.deps,
            &creator.token,
            request("Taro", "taro@example.com", Role::Player),
        ),
        invite(
            &harness.deps,
            &creator.token,
            request("Taro Other", "taro@example.com", Role::Player),
        ),
    );

    assert!(first.is_ok() != second.is_ok());
    let (winner, winning_name) = match (&first, &second) {
        (Ok(outcome), Err(_)) => (outcome, "Taro"),
        (Err(_), Ok(outcome)) => (outcome, "Taro Other"),
        _ => unreachable!("exactly one invitation succeeds"),
    };
    let loser = if first.is_err() { &first } else { &second };
    assert_code(loser, ErrorCode::DuplicateEmail);

    let profiles = harness.store.users_with_email("taro@example.com");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, winner.user_id);
    assert_eq!(profiles[0].name, winning_name);

    // The shared identity belongs to the winner and is kept.
    assert!(harness.identity.identity(winner.user_id).is_some());
    assert_eq!(harness.identity.identities_with_email("taro@example.com"), 1);
}

#[test_log::test(tokio::test)]
async fn reinvite_of_an_invited_email_is_a_duplicate() {
    let harness = TestHarness::new().await;
    harness.identity.reinvite_pending(true);
    let creator = harness.creator();

    let first = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await
    .expect("first invitation succeeds");

    // Skip the profile pre-check so the store's id constraint decides.
    let profile = harness.store.user(first.user_id).expect("profile written");
    harness.store.put_user(User {
        email: "renamed@example.com".to_string(),
        ..profile
    });

    let second = invite(
        &harness.deps,
        &creator.token,
        request("Taro Other", "taro@example.com", Role::Player),
    )
    .await;

    assert_code(&second, ErrorCode::DuplicateEmail);
    let kept = harness.store.user(first.user_id).expect("profile kept");
    assert_eq!(kept.name, "Taro");
    assert!(harness.identity.identity(first.user_id).is_some());
}

#[test_log::test(tokio::test)]
async fn unacknowledged_profile_write_is_not_repeated() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    harness.store.lose_next_insert_acks(1);

    let outcome = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await
    .expect("the retry finds the row written by the first attempt");

    let profiles = harness.store.users_with_email("taro@example.com");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, outcome.user_id);
    assert_eq!(profiles[0].name, "Taro");
    assert!(harness.identity.identity(outcome.user_id).is_some());
}

#[test_log::test(tokio::test)]
async fn provider_failure_writes_no_profile() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    harness.identity.fail_next(
        GatewayOp::Invite,
        GatewayError::Rejected {
            status: 503,
            message: "maintenance".to_string(),
        },
    );

    let result = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await;

    assert_code(&result, ErrorCode::ProviderError);
    assert!(harness.store.users_with_email("taro@example.com").is_empty());
    let message = result.expect_err("failed").to_string();
    assert!(!message.contains("maintenance"), "raw provider message leaked: {message}");
}

#[test_log::test(tokio::test)]
async fn transient_profile_failures_are_retried() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    harness.store.fail_next_inserts(2);

    let outcome = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await
    .expect("third attempt succeeds");

    assert!(harness.store.user(outcome.user_id).is_some());
}

#[test_log::test(tokio::test)]
async fn exhausted_profile_write_reports_persistence_error() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    harness.store.fail_next_inserts(10);

    let result = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await;

    assert_code(&result, ErrorCode::PersistenceError);
    assert!(
        result
            .expect_err("failed")
            .to_string()
            .contains("reconciliation")
    );
    // The identity stays behind for the sweep.
    assert_eq!(harness.identity.identities_with_email("taro@example.com"), 1);
    assert!(harness.store.users_with_email("taro@example.com").is_empty());
}

#[test_log::test(tokio::test)]
async fn malformed_input_is_a_validation_error() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let blank_name = invite(
        &harness.deps,
        &creator.token,
        request("   ", "taro@example.com", Role::Player),
    )
    .await;
    assert_code(&blank_name, ErrorCode::ValidationError);

    let bad_email = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "not-an-email", Role::Player),
    )
    .await;
    assert_code(&bad_email, ErrorCode::ValidationError);

    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn invalid_token_is_unauthenticated() {
    let harness = TestHarness::new().await;

    let result = invite(
        &harness.deps,
        "not-a-token",
        request("Taro", "taro@example.com", Role::Player),
    )
    .await;
    assert_code(&result, ErrorCode::Unauthenticated);

    let empty = invite(&harness.deps, "", request("Taro", "taro@example.com", Role::Player)).await;
    assert_code(&empty, ErrorCode::Unauthenticated);
}

#[test_log::test(tokio::test)]
async fn identity_without_profile_is_unauthenticated() {
    let harness = TestHarness::new().await;
    let subject = harness
        .identity
        .create_identity("ghost@example.com", Some(SEED_PASSWORD), None);
    let token = harness.identity.issue_token(subject);

    let result = invite(
        &harness.deps,
        &token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await;
    assert_code(&result, ErrorCode::Unauthenticated);
}

#[test_log::test(tokio::test)]
async fn admin_invites_into_own_organization() {
    let harness = TestHarness::new().await;
    let org = harness.organization("Kanto");
    let other = harness.organization("Kansai");
    let admin = harness.admin(Some(org.id));

    let outcome = invite(
        &harness.deps,
        &admin.token,
        request("Taro", "taro@example.com", Role::Player),
    )
    .await
    .expect("admin may invite players");
    assert_eq!(outcome.organization_id, Some(org.id));

    let foreign = invite(
        &harness.deps,
        &admin.token,
        InviteRequest {
            organization_id: Some(other.id),
            ..request("Jiro", "jiro@example.com", Role::Player)
        },
    )
    .await;
    assert_code(&foreign, ErrorCode::Unauthorized);
}

#[test_log::test(tokio::test)]
async fn creator_invites_into_active_organization() {
    let harness = TestHarness::new().await;
    let org = harness.organization("Kanto");
    let creator = harness.creator();
    elevate_service::organization::switch_organization(&harness.deps, &creator.token, org.id)
        .await
        .expect("switch succeeds");

    let outcome = invite(
        &harness.deps,
        &creator.token,
        request("Taro", "taro@example.com", Role::Admin),
    )
    .await
    .expect("creator may invite admins");

    assert_eq!(outcome.organization_id, Some(org.id));
}
