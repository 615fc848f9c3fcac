//! Organization switching and tenant-scoped listings.

use elevate_service::deletion::delete;
use elevate_service::directory::list_users;
use elevate_service::organization::{active_organization, list_organizations, switch_organization};

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn creator_switches_between_organizations() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let kanto = harness.organization("Kanto");
    let kansai = harness.organization("Kansai");

    assert!(
        active_organization(&harness.deps, &creator.token)
            .await
            .expect("readable")
            .is_none()
    );

    switch_organization(&harness.deps, &creator.token, kanto.id)
        .await
        .expect("switch to Kanto");
    let first = harness.store.cursor(creator.user.id).expect("cursor exists");
    assert_eq!(first.organization_id, kanto.id);

    let active = switch_organization(&harness.deps, &creator.token, kansai.id)
        .await
        .expect("switch to Kansai");
    assert_eq!(active.organization_id, kansai.id);
    assert_eq!(
        harness
            .store
            .cursor(creator.user.id)
            .expect("cursor still exists")
            .organization_id,
        kansai.id
    );

    let read_back = active_organization(&harness.deps, &creator.token)
        .await
        .expect("readable")
        .expect("set");
    assert_eq!(read_back.organization_id, kansai.id);
}

#[test_log::test(tokio::test)]
async fn repeated_switch_is_idempotent() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let kanto = harness.organization("Kanto");

    for _ in 0..3 {
        let active = switch_organization(&harness.deps, &creator.token, kanto.id)
            .await
            .expect("switch succeeds");
        assert_eq!(active.organization_id, kanto.id);
    }
    assert_eq!(
        harness
            .store
            .cursor(creator.user.id)
            .expect("one cursor")
            .organization_id,
        kanto.id
    );
}

#[test_log::test(tokio::test)]
async fn only_creators_switch() {
    let harness = TestHarness::new().await;
    let kanto = harness.organization("Kanto");
    let admin = harness.admin(Some(kanto.id));
    let player = harness.seed_account("Player", "player@example.com", Role::Player, Some(kanto.id));

    for account in [&admin, &player] {
        let result = switch_organization(&harness.deps, &account.token, kanto.id).await;
        assert_code(&result, ErrorCode::Unauthorized);
        assert!(harness.store.cursor(account.user.id).is_none());
    }

    let listing = list_organizations(&harness.deps, &admin.token).await;
    assert_code(&listing, ErrorCode::Unauthorized);
}

#[test_log::test(tokio::test)]
async fn unknown_organization_is_not_found() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();

    let result = switch_organization(&harness.deps, &creator.token, uuid::Uuid::new_v4()).await;

    assert_code(&result, ErrorCode::NotFound);
    assert!(harness.store.cursor(creator.user.id).is_none());
}

#[test_log::test(tokio::test)]
async fn organizations_are_listed_by_name() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let _ = harness.organization("Tohoku");
    let _ = harness.organization("Kanto");

    let names: Vec<String> = list_organizations(&harness.deps, &creator.token)
        .await
        .expect("creator may list organizations")
        .into_iter()
        .map(|o| o.name)
        .collect();

    assert_eq!(names, ["Kanto", "Tohoku"]);
}

#[test_log::test(tokio::test)]
async fn listings_follow_the_active_organization() {
    let harness = TestHarness::new().await;
    let creator = harness.creator();
    let kanto = harness.organization("Kanto");
    let kansai = harness.organization("Kansai");
    let _a = harness.seed_account("Taro", "taro@example.com", Role::Player, Some(kanto.id));
    let _b = harness.seed_account("Jiro", "jiro@example.com", Role::Player, Some(kansai.id));

    let unscoped = list_users(&harness.deps, &creator.token, Some(Role::Player), None)
        .await
        .expect("creator lists players");
    assert_eq!(unscoped.len(), 2);

    switch_organization(&harness.deps, &creator.token, kansai.id)
        .await
        .expect("switch");
    let scoped = list_users(&harness.deps, &creator.token, Some(Role::Player), None)
        .await
        .expect("creator lists players");
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].email, "jiro@example.com");

    // An explicit organization overrides the cursor.
    let explicit = list_users(&harness.deps, &creator.token, Some(Role::Player), Some(kanto.id))
        .await
        .expect("creator lists players");
    assert_eq!(explicit.len(), 1);
    assert_eq!(explicit[0].email, "taro@example.com");
}

#[test_log::test(tokio::test)]
async fn admin_is_confined_to_own_organization() {
    let harness = TestHarness::new().await;
    let kanto = harness.organization("Kanto");
    let kansai = harness.organization("Kansai");
    let admin = harness.admin(Some(kanto.id));
    let _a = harness.seed_account("Taro", "taro@example.com", Role::Player, Some(kanto.id));
    let _b = harness.seed_account("Jiro", "jiro@example.com", Role::Player, Some(kansai.id));

    let own = list_users(&harness.deps, &admin.token, Some(Role::Player), None)
        .await
        .expect("admin lists players");
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].organization_id, Some(kanto.id));

    let foreign = list_users(&harness.deps, &admin.token, Some(Role::Player), Some(kansai.id)).await;
    assert_code(&foreign, ErrorCode::Unauthorized);

    let admins = list_users(&harness.deps, &admin.token, Some(Role::Admin), None).await;
    assert_code(&admins, ErrorCode::Unauthorized);
}

#[test_log::test(tokio::test)]
async fn admin_cannot_delete_player_of_another_organization() {
    let harness = TestHarness::new().await;
    let kanto = harness.organization("Kanto");
    let kansai = harness.organization("Kansai");
    let admin = harness.admin(Some(kanto.id));
    let local = harness.seed_account("Taro", "taro@example.com", Role::Player, Some(kanto.id));
    let foreign = harness.seed_account("Jiro", "jiro@example.com", Role::Player, Some(kansai.id));

    let result = delete(&harness.deps, &admin.token, foreign.user.id).await;
    assert_code(&result, ErrorCode::Unauthorized);
    assert!(harness.store.user(foreign.user.id).is_some());
    assert!(harness.identity.identity(foreign.user.id).is_some());
    assert_eq!(harness.identity.mutation_count(), 0);

    delete(&harness.deps, &admin.token, local.user.id)
        .await
        .expect("admin deletes players of their own organization");
    assert!(harness.store.user(local.user.id).is_none());
}

#[test_log::test(tokio::test)]
async fn creator_deletes_across_organizations() {
    let harness = TestHarness::new().await;
    let kansai = harness.organization("Kansai");
    let creator = harness.creator();
    let foreign = harness.seed_account("Jiro", "jiro@example.com", Role::Player, Some(kansai.id));

    delete(&harness.deps, &creator.token, foreign.user.id)
        .await
        .expect("creators are not confined to one organization");
    assert!(harness.store.user(foreign.user.id).is_none());
}
