use crate::core::errors::DripsplitError;
use crate::core::models::user::User;
use crate::tests::{create_test_harness, TestHarness};
use std::collections::HashMap;

async fn two_member_group(harness: &TestHarness) -> (User, User, String) {
    let alice = harness.service.create_user("alice".to_string()).await.unwrap();
    let bob = harness.service.create_user("bob".to_string()).await.unwrap();
    let group = harness
        .service
        .create_group("flat".to_string(), String::new(), vec![bob.id.clone()], &alice)
        .await
        .unwrap();
    (alice, bob, group.id)
}

async fn balances_by_user(harness: &TestHarness, group_id: &str) -> HashMap<String, i64> {
    harness
        .service
        .group_balances(group_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.user_id, b.drops))
        .collect()
}

#[tokio::test]
async fn new_group_starts_with_zero_balances() {
    let harness = create_test_harness();
    let (alice, bob, group_id) = two_member_group(&harness).await;

    let balances = balances_by_user(&harness, &group_id).await;
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[&alice.id], 0);
    assert_eq!(balances[&bob.id], 0);
}

#[tokio::test]
async fn bill_application_moves_balances_and_conserves_zero_sum() {
    let harness = create_test_harness();
    let (alice, bob, group_id) = two_member_group(&harness).await;

    harness
        .service
        .add_group_bill(
            &group_id,
            "groceries".to_string(),
            &alice.id,
            vec![alice.id.clone(), bob.id.clone()],
            vec![1, 1],
            100,
        )
        .await
        .unwrap();

    let balances = balances_by_user(&harness, &group_id).await;
    assert_eq!(balances[&alice.id], 50);
    assert_eq!(balances[&bob.id], -50);

    // Same bill again doubles the positions, still summing to zero.
    harness
        .service
        .add_group_bill(
            &group_id,
            "groceries".to_string(),
            &alice.id,
            vec![alice.id.clone(), bob.id.clone()],
            vec![1, 1],
            100,
        )
        .await
        .unwrap();

    let balances = balances_by_user(&harness, &group_id).await;
    assert_eq!(balances[&alice.id], 100);
    assert_eq!(balances[&bob.id], -100);
    assert_eq!(balances.values().sum::<i64>(), 0);
}

#[tokio::test]
async fn conservation_holds_for_uneven_weights() {
    let harness = create_test_harness();
    let alice = harness.service.create_user("alice".to_string()).await.unwrap();
    let bob = harness.service.create_user("bob".to_string()).await.unwrap();
    let carol = harness.service.create_user("carol".to_string()).await.unwrap();
    let group = harness
        .service
        .create_group(
            "trip".to_string(),
            String::new(),
            vec![bob.id.clone(), carol.id.clone()],
            &alice,
        )
        .await
        .unwrap();

    let bills: &[(&str, i64, &[u64])] = &[
        ("fuel", 1_000_003, &[2, 3, 5]),
        ("hotel", 77, &[1, 1, 1]),
        ("dinner", 999, &[10, 1, 1]),
    ];
    for (description, total, weights) in bills {
        harness
            .service
            .add_group_bill(
                &group.id,
                description.to_string(),
                &alice.id,
                vec![alice.id.clone(), bob.id.clone(), carol.id.clone()],
                weights.to_vec(),
                *total,
            )
            .await
            .unwrap();

        let balances = balances_by_user(&harness, &group.id).await;
        assert_eq!(balances.values().sum::<i64>(), 0, "after bill {}", description);
    }
}

#[tokio::test]
async fn bill_with_non_member_changes_nothing() {
    let harness = create_test_harness();
    let (alice, bob, group_id) = two_member_group(&harness).await;
    let mallory = harness.service.create_user("mallory".to_string()).await.unwrap();

    let result = harness
        .service
        .add_group_bill(
            &group_id,
            "crash the party".to_string(),
            &alice.id,
            vec![bob.id.clone(), mallory.id.clone()],
            vec![1, 1],
            100,
        )
        .await;
    assert!(matches!(result, Err(DripsplitError::NotGroupMember(id)) if id == mallory.id));

    let balances = balances_by_user(&harness, &group_id).await;
    assert_eq!(balances[&alice.id], 0);
    assert_eq!(balances[&bob.id], 0);
    assert!(harness.service.group_bills(&group_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_member_add_is_an_error() {
    let harness = create_test_harness();
    let (_alice, bob, group_id) = two_member_group(&harness).await;

    let result = harness.service.add_member(&group_id, &bob.id).await;
    assert!(matches!(result, Err(DripsplitError::AlreadyGroupMember(id)) if id == bob.id));
}

#[tokio::test]
async fn added_member_gets_a_zero_balance_row() {
    let harness = create_test_harness();
    let (_alice, _bob, group_id) = two_member_group(&harness).await;
    let carol = harness.service.create_user("carol".to_string()).await.unwrap();

    harness.service.add_member(&group_id, &carol.id).await.unwrap();

    let balances = balances_by_user(&harness, &group_id).await;
    assert_eq!(balances.len(), 3);
    assert_eq!(balances[&carol.id], 0);
}

#[tokio::test]
async fn standalone_bill_creates_requests_per_share() {
    let harness = create_test_harness();
    let alice = harness.service.create_user("alice".to_string()).await.unwrap();
    let bob = harness.service.create_user("bob".to_string()).await.unwrap();

    let (bill, requests) = harness
        .service
        .add_bill(
            "lunch".to_string(),
            &alice.id,
            vec![alice.id.clone(), bob.id.clone()],
            vec![1, 1],
            100,
        )
        .await
        .unwrap();

    // The creditor's own share produces no request.
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].debtor_id, bob.id);
    assert_eq!(requests[0].creditor_id, alice.id);
    assert_eq!(requests[0].total_drops, 50);
    assert_eq!(requests[0].bill_id.as_deref(), Some(bill.id.as_str()));
    assert!(requests[0].group_id.is_none());
    assert!(!requests[0].paid);
}

#[tokio::test]
async fn mismatched_weights_are_rejected() {
    let harness = create_test_harness();
    let (alice, bob, group_id) = two_member_group(&harness).await;

    let result = harness
        .service
        .add_group_bill(
            &group_id,
            "bad".to_string(),
            &alice.id,
            vec![alice.id.clone(), bob.id.clone()],
            vec![1],
            100,
        )
        .await;
    assert!(matches!(result, Err(DripsplitError::InvalidSplit(_))));
}
