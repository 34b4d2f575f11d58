use warrant_application::RbacRepository;
use warrant_domain::{
    GroupToRoleMapping, PermissionGrantInput, PermissionType, Role, UserRoleAssignment,
};

use super::InMemoryRbacRepository;

fn assignment(role: &str, source: &str, is_remote: bool) -> UserRoleAssignment {
    UserRoleAssignment::new("user1", role, source, None, is_remote)
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn grants_receive_distinct_ids() {
    let repository = InMemoryRbacRepository::new();
    let input = PermissionGrantInput::scoped("action:core:local", vec![PermissionType::ActionView])
        .unwrap_or_else(|_| unreachable!());

    let first = repository.create_permission_grant(input.clone()).await;
    let second = repository.create_permission_grant(input).await;
    assert!(first.is_ok());
    assert!(second.is_ok());
    let first = first.unwrap_or_else(|_| unreachable!());
    let second = second.unwrap_or_else(|_| unreachable!());
    assert_ne!(first.id(), second.id());

    let ids = vec![first.id().to_owned(), "missing".to_owned()];
    let found = repository.find_permission_grants(&ids).await.unwrap_or_default();
    assert_eq!(found, vec![first]);
}

#[tokio::test]
async fn assignments_keep_insertion_order_and_upsert_once() {
    let repository = InMemoryRbacRepository::new();

    for role in ["role_b", "role_a", "role_c"] {
        let inserted = repository
            .upsert_role_assignment(assignment(role, "assignments/user1.yaml", false))
            .await;
        assert_eq!(inserted.ok(), Some(true));
    }
    let repeated = repository
        .upsert_role_assignment(assignment("role_b", "assignments/user1.yaml", false))
        .await;
    assert_eq!(repeated.ok(), Some(false));

    let roles: Vec<String> = repository
        .list_role_assignments_for_user("user1", true)
        .await
        .unwrap_or_default()
        .iter()
        .map(|stored| stored.role().to_owned())
        .collect();
    assert_eq!(roles, vec!["role_b", "role_a", "role_c"]);
}

#[tokio::test]
async fn remote_assignments_are_filtered_on_request() {
    let repository = InMemoryRbacRepository::new();
    assert!(repository
        .upsert_role_assignment(assignment("local", "assignments/user1.yaml", false))
        .await
        .is_ok());
    assert!(repository
        .upsert_role_assignment(assignment("remote", "mappings/stormers.yaml", true))
        .await
        .is_ok());

    let local_only = repository
        .list_role_assignments_for_user("user1", false)
        .await
        .unwrap_or_default();
    assert_eq!(local_only.len(), 1);

    let removed = repository
        .delete_role_assignment("user1", "remote", "mappings/stormers.yaml")
        .await;
    assert_eq!(removed.ok(), Some(true));
    assert_eq!(repository.list_role_assignments().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn roles_and_group_maps_are_replaced_by_key() {
    let repository = InMemoryRbacRepository::new();
    let role = Role::new("role1", None, Vec::new(), false).unwrap_or_else(|_| unreachable!());
    let renamed = Role::new("role1", Some("updated".to_owned()), Vec::new(), false)
        .unwrap_or_else(|_| unreachable!());
    assert!(repository.save_role(role).await.is_ok());
    assert!(repository.save_role(renamed).await.is_ok());

    let stored = repository.find_role("role1").await.unwrap_or_default();
    assert_eq!(stored.as_ref().and_then(Role::description), Some("updated"));
    assert_eq!(repository.list_roles().await.unwrap_or_default().len(), 1);

    for roles in [vec!["role1".to_owned()], vec!["role2".to_owned()]] {
        let mapping = GroupToRoleMapping::new("CN=stormers", roles, "mappings/stormers.yaml", None, true)
            .unwrap_or_else(|_| unreachable!());
        assert!(repository.save_group_to_role_map(mapping).await.is_ok());
    }

    let found = repository
        .find_group_to_role_maps(&["CN=stormers".to_owned(), "CN=other".to_owned()])
        .await
        .unwrap_or_default();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].roles(), ["role2".to_owned()]);
}
