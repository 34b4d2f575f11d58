use std::sync::Arc;

use serde_json::json;
use warrant_core::AppError;
use warrant_domain::{
    ContentRef, ExecutionResource, KeyValuePairApi, KeyValueScopeName, PermissionGrantInput,
    PermissionType, Resource, ResourceApi, ResourceType, RuleTrigger, User,
};

use super::{
    ExecutionPermissionsResolver, GrantEvaluator, KeyValuePairPermissionsResolver,
    PermissionsResolver, ResourcePermissionsResolver, RulePermissionsResolver,
    RuleReferenceResolver,
};
use crate::RbacService;
use crate::test_support::{
    FakeActionCatalog, FakeRbacRepository, assign, grant_role, service_with_repository, user,
};

fn scoped(uid: &str, permission_types: Vec<PermissionType>) -> PermissionGrantInput {
    PermissionGrantInput::scoped(uid, permission_types).unwrap_or_else(|_| unreachable!())
}

fn global(resource_type: ResourceType, permission_types: Vec<PermissionType>) -> PermissionGrantInput {
    PermissionGrantInput::global(resource_type, permission_types).unwrap_or_else(|_| unreachable!())
}

fn evaluator(service: &RbacService) -> GrantEvaluator {
    GrantEvaluator::new(service.clone(), true)
}

fn system_key(name: &str) -> Resource {
    Resource::system_key(name).unwrap_or_else(|_| unreachable!())
}

fn user_key(owner: &str, name: &str) -> Resource {
    Resource::user_key(owner, name).unwrap_or_else(|_| unreachable!())
}

fn action(pack: &str, name: &str) -> Resource {
    Resource::action(pack, name).unwrap_or_else(|_| unreachable!())
}

async fn allowed(
    resolver: &dyn PermissionsResolver,
    user: &User,
    resource: &Resource,
    permission_type: PermissionType,
) -> bool {
    resolver
        .user_has_resource_db_permission(user, resource, permission_type)
        .await
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn administrators_bypass_without_grants() {
    let (service, _) = service_with_repository();
    assert!(service.insert_system_roles().await.is_ok());
    assign(&service, "admin1", "admin").await;
    assign(&service, "root1", "system_admin").await;
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));
    let target = action("core", "local");

    for name in ["admin1", "root1"] {
        for permission_type in ResourceType::Action.permission_types() {
            assert!(allowed(&resolver, &user(name), &target, permission_type).await);
        }
    }
}

#[tokio::test]
async fn users_without_roles_are_denied_except_observers_reading() {
    let (service, _) = service_with_repository();
    assert!(service.insert_system_roles().await.is_ok());
    assign(&service, "observer1", "observer").await;
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));
    let target = action("core", "local");
    let nobody = user("no_permissions");
    let observer = user("observer1");

    for permission_type in ResourceType::Action.permission_types() {
        assert!(!allowed(&resolver, &nobody, &target, permission_type).await);
        assert_eq!(
            allowed(&resolver, &observer, &target, permission_type).await,
            permission_type.is_read_only()
        );
    }

    let listing = resolver
        .user_has_permission(&nobody, PermissionType::ActionList)
        .await
        .unwrap_or(true);
    assert!(!listing);
}

#[tokio::test]
async fn disabled_evaluator_allows_everything() {
    let (service, _) = service_with_repository();
    let resolver = ResourcePermissionsResolver::new(
        ResourceType::Action,
        GrantEvaluator::new(service.clone(), false),
    );

    assert!(allowed(&resolver, &user("anyone"), &action("core", "local"), PermissionType::ActionDelete).await);
}

#[tokio::test]
async fn all_grant_covers_every_verb_but_set_covers_only_set() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "kvp_all",
        vec![scoped("key_value_pair:st2kv.system:k1", vec![PermissionType::KeyValuePairAll])],
    )
    .await;
    grant_role(
        &service,
        "user2",
        "kvp_set",
        vec![scoped("key_value_pair:st2kv.system:k1", vec![PermissionType::KeyValuePairSet])],
    )
    .await;
    let resolver = KeyValuePairPermissionsResolver::new(evaluator(&service));
    let key = system_key("k1");

    for permission_type in ResourceType::KeyValuePair.permission_types() {
        assert!(allowed(&resolver, &user("user1"), &key, permission_type).await);
    }
    assert!(allowed(&resolver, &user("user2"), &key, PermissionType::KeyValuePairSet).await);
    assert!(!allowed(&resolver, &user("user2"), &key, PermissionType::KeyValuePairDelete).await);
    assert!(!allowed(&resolver, &user("user2"), &key, PermissionType::KeyValuePairView).await);
    assert!(!allowed(&resolver, &user("user1"), &system_key("k2"), PermissionType::KeyValuePairView).await);
}

#[tokio::test]
async fn user_scoped_keys_belong_to_their_owner_only() {
    let (service, _) = service_with_repository();
    assert!(service.insert_system_roles().await.is_ok());
    grant_role(
        &service,
        "user_b",
        "wrong_scope",
        vec![scoped("key_value_pair:st2kv.user:user_a:", vec![PermissionType::KeyValuePairAll])],
    )
    .await;
    assign(&service, "observer1", "observer").await;
    let resolver = KeyValuePairPermissionsResolver::new(evaluator(&service));
    let key = user_key("user_a", "secret");

    for permission_type in ResourceType::KeyValuePair.permission_types() {
        assert!(allowed(&resolver, &user("user_a"), &key, permission_type).await);
        assert!(!allowed(&resolver, &user("user_b"), &key, permission_type).await);
        assert!(!allowed(&resolver, &user("observer1"), &key, permission_type).await);
    }
}

#[tokio::test]
async fn api_payload_and_stored_key_agree() {
    let (service, _) = service_with_repository();
    let resolver = KeyValuePairPermissionsResolver::new(evaluator(&service));
    let payload = ResourceApi::KeyValuePair(KeyValuePairApi::new(
        "secret",
        KeyValueScopeName::User,
        None,
    ));
    let other_owner = ResourceApi::KeyValuePair(KeyValuePairApi::new(
        "secret",
        KeyValueScopeName::User,
        Some("user_b".to_owned()),
    ));

    let own = resolver
        .user_has_resource_api_permission(&user("user_a"), &payload, PermissionType::KeyValuePairSet)
        .await
        .unwrap_or(false);
    let foreign = resolver
        .user_has_resource_api_permission(&user("user_a"), &other_owner, PermissionType::KeyValuePairSet)
        .await
        .unwrap_or(true);

    assert!(own);
    assert!(!foreign);
}

#[tokio::test]
async fn scoped_list_grant_implies_view_but_global_list_does_not() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "scoped",
        "scoped_list",
        vec![scoped("key_value_pair:st2kv.system:", vec![PermissionType::KeyValuePairList])],
    )
    .await;
    grant_role(
        &service,
        "global",
        "global_list",
        vec![global(ResourceType::KeyValuePair, vec![PermissionType::KeyValuePairList])],
    )
    .await;
    let resolver = KeyValuePairPermissionsResolver::new(evaluator(&service));
    let key = system_key("test_system_scope");

    assert!(allowed(&resolver, &user("scoped"), &key, PermissionType::KeyValuePairView).await);
    assert!(!allowed(&resolver, &user("scoped"), &key, PermissionType::KeyValuePairSet).await);
    assert!(!allowed(&resolver, &user("global"), &key, PermissionType::KeyValuePairView).await);

    for name in ["scoped", "global"] {
        let listing = resolver
            .user_has_permission(&user(name), PermissionType::KeyValuePairList)
            .await
            .unwrap_or(false);
        assert!(listing);
    }
}

#[tokio::test]
async fn scoped_create_grant_does_not_satisfy_type_level_create() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "role1",
        vec![scoped("action:core:local", vec![PermissionType::ActionCreate])],
    )
    .await;
    grant_role(
        &service,
        "user2",
        "role2",
        vec![global(ResourceType::Action, vec![PermissionType::ActionCreate])],
    )
    .await;
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));

    let scoped_only = resolver
        .user_has_permission(&user("user1"), PermissionType::ActionCreate)
        .await
        .unwrap_or(true);
    let global_grant = resolver
        .user_has_permission(&user("user2"), PermissionType::ActionCreate)
        .await
        .unwrap_or(false);

    assert!(!scoped_only);
    assert!(global_grant);
}

#[tokio::test]
async fn pack_grant_covers_pack_content() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "pack_reader",
        vec![scoped("pack:examples", vec![PermissionType::ActionView])],
    )
    .await;
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));

    assert!(allowed(&resolver, &user("user1"), &action("examples", "local"), PermissionType::ActionView).await);
    assert!(!allowed(&resolver, &user("user1"), &action("examples", "local"), PermissionType::ActionExecute).await);
    assert!(!allowed(&resolver, &user("user1"), &action("core", "local"), PermissionType::ActionView).await);
}

#[tokio::test]
async fn wildcard_grant_matches_by_prefix() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "wildcard",
        vec![scoped("action:examples:deploy_*", vec![PermissionType::ActionExecute])],
    )
    .await;
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));

    assert!(allowed(&resolver, &user("user1"), &action("examples", "deploy_web"), PermissionType::ActionExecute).await);
    assert!(!allowed(&resolver, &user("user1"), &action("examples", "rollback"), PermissionType::ActionExecute).await);
}

#[tokio::test]
async fn resolver_rejects_foreign_resource_kind() {
    let (service, _) = service_with_repository();
    let resolver = ResourcePermissionsResolver::new(ResourceType::Rule, evaluator(&service));

    let result = resolver
        .user_has_resource_db_permission(&user("user1"), &action("core", "local"), PermissionType::RuleView)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn execution_permissions_follow_the_executed_action() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "runner",
        vec![scoped("action:examples:local", vec![PermissionType::ActionExecute])],
    )
    .await;
    grant_role(
        &service,
        "user2",
        "viewer",
        vec![scoped("execution:abc", vec![PermissionType::ExecutionView])],
    )
    .await;
    let resolver = ExecutionPermissionsResolver::new(evaluator(&service));
    let execution = Resource::Execution(
        ExecutionResource::new(
            "abc",
            ContentRef::new("examples", "local").unwrap_or_else(|_| unreachable!()),
        )
        .unwrap_or_else(|_| unreachable!()),
    );

    assert!(allowed(&resolver, &user("user1"), &execution, PermissionType::ExecutionReRun).await);
    assert!(allowed(&resolver, &user("user1"), &execution, PermissionType::ExecutionStop).await);
    assert!(!allowed(&resolver, &user("user1"), &execution, PermissionType::ExecutionView).await);
    assert!(allowed(&resolver, &user("user2"), &execution, PermissionType::ExecutionView).await);
    assert!(!allowed(&resolver, &user("user2"), &execution, PermissionType::ExecutionStop).await);
}

#[tokio::test]
async fn rule_references_check_webhook_and_action() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "rule_author",
        vec![
            scoped("webhook:sample", vec![PermissionType::WebhookCreate]),
            scoped("action:examples:local", vec![PermissionType::ActionExecute]),
        ],
    )
    .await;
    let catalog = FakeActionCatalog::with_actions(vec![
        ContentRef::new("examples", "local").unwrap_or_else(|_| unreachable!()),
    ]);
    let resolver = RulePermissionsResolver::new(evaluator(&service), Arc::new(catalog));
    let user1 = user("user1");

    let webhook = RuleTrigger::new("core.st2.webhook", json!({"url": "sample"}))
        .unwrap_or_else(|_| unreachable!());
    let other_webhook = RuleTrigger::new("core.st2.webhook", json!({"url": "other"}))
        .unwrap_or_else(|_| unreachable!());
    let timer = RuleTrigger::new("core.st2.IntervalTimer", json!({"delta": 5}))
        .unwrap_or_else(|_| unreachable!());

    assert!(resolver.user_has_trigger_permission(&user1, &webhook).await.unwrap_or(false));
    assert!(!resolver.user_has_trigger_permission(&user1, &other_webhook).await.unwrap_or(true));
    assert!(resolver.user_has_trigger_permission(&user1, &timer).await.unwrap_or(false));

    assert!(resolver.user_has_action_permission(&user1, "examples.local").await.unwrap_or(false));
    assert!(!resolver.user_has_action_permission(&user1, "core.local").await.unwrap_or(true));
}

#[tokio::test]
async fn missing_action_is_checked_through_a_placeholder() {
    let (service, _) = service_with_repository();
    grant_role(
        &service,
        "user1",
        "future_actions",
        vec![scoped("pack:examples", vec![PermissionType::ActionExecute])],
    )
    .await;
    let resolver = RulePermissionsResolver::new(evaluator(&service), Arc::new(FakeActionCatalog::default()));

    let allowed_missing = resolver
        .user_has_action_permission(&user("user1"), "examples.not_installed")
        .await
        .unwrap_or(false);
    assert!(allowed_missing);

    let malformed = resolver
        .user_has_action_permission(&user("user1"), "malformed")
        .await;
    assert!(matches!(malformed, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn store_failure_propagates_instead_of_denying() {
    let repository = Arc::new(FakeRbacRepository::default());
    let service = RbacService::new(repository.clone());
    let resolver = ResourcePermissionsResolver::new(ResourceType::Action, evaluator(&service));
    repository.fail_all();

    let result = resolver
        .user_has_resource_db_permission(&user("user1"), &action("core", "local"), PermissionType::ActionView)
        .await;

    assert!(matches!(result, Err(AppError::Store(_))));
}
