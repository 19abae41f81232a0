//! Conversation lifecycle against the in-memory backend

use slackctl_api::ApiError;
use slackctl_runner::controller::ConversationController;
use slackctl_runner::state::{ConversationSpec, ObservedConversation};
use slackctl_runner::test_utils::{
    conversation, direct_message, group_direct_message, ApiCall, MockSlack,
};
use slackctl_runner::{OpContext, ResourceController, RunnerError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn setup() -> (Arc<MockSlack>, ConversationController) {
    let mock = Arc::new(MockSlack::new());
    let controller = ConversationController::new(mock.clone());
    (mock, controller)
}

fn existing(mock: &MockSlack, id: &str, members: &[&str]) -> ObservedConversation {
    mock.add_conversation(conversation(id, "eng"));
    mock.set_members(id, members);
    ObservedConversation {
        id: id.to_string(),
        name: "eng".to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
        ..ObservedConversation::default()
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_with_topic_and_members() {
    let (mock, controller) = setup();
    let spec = ConversationSpec::new("eng")
        .private()
        .with_topic("roadmap")
        .with_members(&["U1", "U2"]);

    let observed = controller.create(&OpContext::new(), &spec).await.unwrap();
    let id = observed.id.clone();

    assert_eq!(
        mock.calls(),
        vec![
            ApiCall::CreateConversation(slackctl_api::NewConversation {
                name: "eng".to_string(),
                is_private: true,
            }),
            ApiCall::SetTopic(id.clone(), "roadmap".to_string()),
            ApiCall::Invite(id.clone(), "U1,U2".to_string()),
        ]
    );

    assert_eq!(observed.name, "eng");
    assert_eq!(observed.topic, "roadmap");
    assert_eq!(observed.purpose, "");
    assert!(observed.is_private);
    assert_eq!(observed.members, vec!["U1", "U2"]);
    assert_eq!(mock.members_of(&id), vec!["U1", "U2"]);
}

#[tokio::test]
async fn test_create_reports_invite_failure_after_creation() {
    let (mock, controller) = setup();
    mock.fail_on(
        "conversations.invite",
        ApiError::platform("conversations.invite", "user_not_found"),
    );

    let spec = ConversationSpec::new("eng").with_members(&["U404"]);
    let err = controller.create(&OpContext::new(), &spec).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to invite users to conversation"));
    // the conversation itself stays created
    assert_eq!(mock.calls_to("conversations.create").len(), 1);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_invites_once_and_kicks_each() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &["a", "b", "c"]);
    let plan = ConversationSpec::new("eng").with_members(&["a", "d"]);

    let observed = controller
        .update(&OpContext::new(), &plan, &prior)
        .await
        .unwrap();

    assert_eq!(mock.calls_to("conversations.invite"), vec![ApiCall::Invite("C1".into(), "d".into())]);
    assert_eq!(
        mock.calls_to("conversations.kick"),
        vec![
            ApiCall::Kick("C1".into(), "b".into()),
            ApiCall::Kick("C1".into(), "c".into()),
        ]
    );
    assert_eq!(observed.id, "C1");
    assert_eq!(observed.members, vec!["a", "d"]);
    assert_eq!(mock.members_of("C1"), vec!["a", "d"]);
}

#[tokio::test]
async fn test_second_update_changes_no_membership() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &["a", "b", "c"]);
    let plan = ConversationSpec::new("eng").with_members(&["a", "d"]);
    let ctx = OpContext::new();

    let observed = controller.update(&ctx, &plan, &prior).await.unwrap();
    mock.clear_calls();
    controller.update(&ctx, &plan, &observed).await.unwrap();

    assert!(mock.calls_to("conversations.invite").is_empty());
    assert!(mock.calls_to("conversations.kick").is_empty());
    assert_eq!(mock.calls_to("conversations.setTopic").len(), 1);
}

#[tokio::test]
async fn test_update_sends_empty_topic_when_undeclared() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &[]);

    controller
        .update(&OpContext::new(), &ConversationSpec::new("eng"), &prior)
        .await
        .unwrap();

    assert_eq!(
        mock.calls_to("conversations.setTopic"),
        vec![ApiCall::SetTopic("C1".into(), String::new())]
    );
    assert_eq!(
        mock.calls_to("conversations.setPurpose"),
        vec![ApiCall::SetPurpose("C1".into(), String::new())]
    );
}

#[tokio::test]
async fn test_update_stops_at_first_failed_kick() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &["a", "b", "c"]);
    mock.fail_on(
        "conversations.kick",
        ApiError::platform("conversations.kick", "cant_kick_self"),
    );

    let plan = ConversationSpec::new("eng").with_members(&["a", "d"]);
    let err = controller
        .update(&OpContext::new(), &plan, &prior)
        .await
        .unwrap_err();

    assert_eq!(err.api_error().and_then(|e| e.code()), Some("cant_kick_self"));
    // invite already happened, only the first kick was attempted
    assert_eq!(mock.calls_to("conversations.invite").len(), 1);
    assert_eq!(mock.calls_to("conversations.kick").len(), 1);
    assert!(mock.members_of("C1").contains(&"d".to_string()));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_already_closed_direct_message_succeeds() {
    let (mock, controller) = setup();
    mock.add_conversation(direct_message("D1", "U1"));
    mock.fail_on(
        "conversations.close",
        ApiError::platform("conversations.close", "already_closed"),
    );

    let prior = ObservedConversation {
        id: "D1".to_string(),
        ..ObservedConversation::default()
    };
    controller.delete(&OpContext::new(), &prior).await.unwrap();

    assert_eq!(
        mock.calls(),
        vec![
            ApiCall::ConversationInfo("D1".into()),
            ApiCall::Close("D1".into()),
        ]
    );
}

#[tokio::test]
async fn test_delete_group_direct_message_closes() {
    let (mock, controller) = setup();
    mock.add_conversation(group_direct_message("G1"));

    let prior = ObservedConversation {
        id: "G1".to_string(),
        ..ObservedConversation::default()
    };
    controller.delete(&OpContext::new(), &prior).await.unwrap();

    assert_eq!(mock.calls_to("conversations.close").len(), 1);
    assert!(mock.calls_to("conversations.archive").is_empty());
}

#[tokio::test]
async fn test_delete_archive_failure_is_reported() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &[]);
    mock.fail_on(
        "conversations.archive",
        ApiError::platform("conversations.archive", "already_archived"),
    );

    let err = controller.delete(&OpContext::new(), &prior).await.unwrap_err();
    assert!(matches!(err, RunnerError::Remote { .. }));
    assert!(err.to_string().starts_with("failed to archive conversation"));
}

// ============================================================================
// Import
// ============================================================================

#[tokio::test]
async fn test_import_unknown_id_is_not_found() {
    let (mock, controller) = setup();
    let err = controller.import(&OpContext::new(), "C404").await.unwrap_err();

    assert!(matches!(err, RunnerError::NotFound { .. }));
    assert!(mock.calls_to("conversations.members").is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_start_issues_no_calls() {
    let (mock, controller) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = controller
        .create(
            &OpContext::with_cancellation(cancel),
            &ConversationSpec::new("eng").with_members(&["U1"]),
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_mid_update_stops_further_calls() {
    let (mock, controller) = setup();
    let prior = existing(&mock, "C1", &["a", "b", "c"]);
    let cancel = CancellationToken::new();
    mock.cancel_on("conversations.invite", cancel.clone());

    let plan = ConversationSpec::new("eng").with_members(&["a", "d"]);
    let err = controller
        .update(&OpContext::with_cancellation(cancel), &plan, &prior)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(mock.calls_to("conversations.kick").is_empty());
}
