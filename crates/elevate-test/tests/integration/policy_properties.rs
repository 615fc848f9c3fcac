//! Policy enforcement at the service boundary.
//!
//! For every actor role and target role, `invite` succeeds exactly when the
//! role table allows it; a denial touches neither the provider nor the store.

use elevate_service::invitation::{InviteRequest, invite};
use elevate_service::policy::Action;

use super::helpers::*;

const ROLES: [Role; 3] = [Role::Player, Role::Admin, Role::Creator];

#[test_log::test(tokio::test)]
async fn invite_succeeds_iff_policy_allows() {
    for actor_role in ROLES {
        for target_role in [Role::Player, Role::Admin] {
            let harness = TestHarness::new().await;
            let actor = harness.seed_account("Actor", "actor@example.com", actor_role, None);
            let allowed = harness
                .deps
                .policy
                .evaluate(actor_role, Action::Invite, Some(target_role))
                .is_allowed();

            let users_before = harness.store.user_count();
            let result = invite(
                &harness.deps,
                &actor.token,
                InviteRequest {
                    name: "Target".to_string(),
                    email: "target@example.com".to_string(),
                    role: target_role,
                    organization_id: None,
                },
            )
            .await;

            if allowed {
                let outcome = result.expect("allowed invitation succeeds");
                assert_eq!(outcome.role, target_role);
                assert_eq!(harness.store.user_count(), users_before + 1);
            } else {
                assert_code(&result, ErrorCode::Unauthorized);
                assert_eq!(harness.identity.mutation_count(), 0, "{actor_role} -> {target_role}");
                assert_eq!(harness.store.user_count(), users_before);
            }
        }
    }
}

#[test_log::test(tokio::test)]
async fn creator_role_is_never_invitable() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let result = invite(
        &harness.deps,
        &creator.token,
        InviteRequest {
            name: "Second Creator".to_string(),
            email: "second@example.com".to_string(),
            role: Role::Creator,
            organization_id: None,
        },
    )
    .await;

    assert_code(&result, ErrorCode::ValidationError);
    assert_eq!(harness.identity.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn player_cannot_list_admins() {
    let harness = TestHarness::new().await;
    let player = harness.player(None);

    let result =
        elevate_service::directory::list_users(&harness.deps, &player.token, Some(Role::Admin), None)
            .await;

    assert_code(&result, ErrorCode::Unauthorized);
}
