//! Whole runs through the registry: apply, destroy, import, refresh, data

use serde_json::json;
use slackctl_api::ApiError;
use slackctl_config::{Address, Manifest};
use slackctl_runner::apply::{apply, destroy, import, read_data, refresh};
use slackctl_runner::state::StateDocument;
use slackctl_runner::test_utils::{user, user_group, MockSlack};
use slackctl_runner::{LifecycleRegistry, OpContext};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MANIFEST: &str = r#"
[resource.slack_conversation.eng]
name = "eng"
topic = "roadmap"
members = ["U1", "U2"]

[resource.slack_usergroup.oncall]
name = "On call"
handle = "oncall"
users = ["U1"]
"#;

fn setup() -> (Arc<MockSlack>, LifecycleRegistry) {
    let mock = Arc::new(MockSlack::new());
    let registry = LifecycleRegistry::new(mock.clone());
    (mock, registry)
}

fn eng() -> Address {
    Address::new("slack_conversation", "eng")
}

#[tokio::test]
async fn test_apply_creates_then_is_stable() {
    let (mock, registry) = setup();
    let blocks = Manifest::parse(MANIFEST).unwrap().resources().unwrap();
    let mut state = StateDocument::new();
    let ctx = OpContext::new();

    let report = apply(&registry, &ctx, &blocks, &mut state).await;
    assert!(!report.has_error(), "{}", report.diagnostics);
    assert_eq!(report.created.len(), 2);
    assert_eq!(state.len(), 2);

    let record = state.get(&eng()).unwrap();
    assert_eq!(record.attributes["topic"], json!("roadmap"));
    assert_eq!(record.attributes["members"], json!(["U1", "U2"]));

    mock.clear_calls();
    let report = apply(&registry, &ctx, &blocks, &mut state).await;
    assert_eq!(report.unchanged.len(), 2);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_apply_updates_drift_and_deletes_removed() {
    let (mock, registry) = setup();
    let ctx = OpContext::new();
    let mut state = StateDocument::new();
    let blocks = Manifest::parse(MANIFEST).unwrap().resources().unwrap();
    apply(&registry, &ctx, &blocks, &mut state).await;

    let changed = Manifest::parse(
        r#"
[resource.slack_conversation.eng]
name = "eng"
topic = "roadmap"
members = ["U1", "U3"]
"#,
    )
    .unwrap()
    .resources()
    .unwrap();

    mock.clear_calls();
    let report = apply(&registry, &ctx, &changed, &mut state).await;

    assert!(!report.has_error(), "{}", report.diagnostics);
    assert_eq!(report.updated, vec![eng()]);
    assert_eq!(report.deleted, vec![Address::new("slack_usergroup", "oncall")]);
    assert_eq!(mock.calls_to("conversations.kick").len(), 1);
    assert_eq!(mock.calls_to("usergroups.disable").len(), 1);
    assert_eq!(state.len(), 1);
}

#[tokio::test]
async fn test_apply_failure_is_scoped_to_address() {
    let (mock, registry) = setup();
    mock.fail_on(
        "conversations.create",
        ApiError::platform("conversations.create", "name_taken"),
    );
    let blocks = Manifest::parse(MANIFEST).unwrap().resources().unwrap();
    let mut state = StateDocument::new();

    let report = apply(&registry, &OpContext::new(), &blocks, &mut state).await;

    assert!(report.has_error());
    let diagnostic = report.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.summary, "slack_conversation.eng: failed to create conversation");
    // the user group is independent and still created
    assert_eq!(report.created, vec![Address::new("slack_usergroup", "oncall")]);
    assert!(state.get(&eng()).is_none());
}

#[tokio::test]
async fn test_apply_unknown_type_is_diagnostic() {
    let (mock, registry) = setup();
    let blocks = Manifest::parse("[resource.slack_channel.x]\nname = \"x\"")
        .unwrap()
        .resources()
        .unwrap();

    let report = apply(&registry, &OpContext::new(), &blocks, &mut StateDocument::new()).await;

    assert!(report.has_error());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_apply_touches_nothing() {
    let (mock, registry) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let blocks = Manifest::parse(MANIFEST).unwrap().resources().unwrap();
    let mut state = StateDocument::new();

    apply(&registry, &OpContext::with_cancellation(cancel), &blocks, &mut state).await;

    assert!(mock.calls().is_empty());
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_destroy_removes_everything() {
    let (mock, registry) = setup();
    let ctx = OpContext::new();
    let mut state = StateDocument::new();
    let blocks = Manifest::parse(MANIFEST).unwrap().resources().unwrap();
    apply(&registry, &ctx, &blocks, &mut state).await;

    let report = destroy(&registry, &ctx, &mut state).await;

    assert!(!report.has_error(), "{}", report.diagnostics);
    assert_eq!(report.deleted.len(), 2);
    assert!(state.is_empty());
    assert_eq!(mock.calls_to("conversations.archive").len(), 1);
}

#[tokio::test]
async fn test_import_then_refresh() {
    let (mock, registry) = setup();
    mock.add_user_group(user_group("S7", "oncall", &["U1"]));
    let address = Address::new("slack_usergroup", "oncall");
    let ctx = OpContext::new();
    let mut state = StateDocument::new();

    import(&registry, &ctx, &address, "S7", &mut state).await.unwrap();
    assert_eq!(state.get(&address).unwrap().attributes["id"], json!("S7"));

    let again = import(&registry, &ctx, &address, "S7", &mut state).await;
    assert!(again.is_err());

    let report = refresh(&registry, &ctx, &mut state).await;
    assert_eq!(report.unchanged, vec![address]);
}

#[tokio::test]
async fn test_disabled_usergroup_settles_after_first_apply() {
    let (mock, registry) = setup();
    let ctx = OpContext::new();
    let mut state = StateDocument::new();
    let address = Address::new("slack_usergroup", "oncall");
    let blocks = Manifest::parse(
        r#"
[resource.slack_usergroup.oncall]
name = "On call"
users = ["U1"]
enabled = false
"#,
    )
    .unwrap()
    .resources()
    .unwrap();

    let report = apply(&registry, &ctx, &blocks, &mut state).await;
    assert_eq!(report.created, vec![address.clone()]);
    assert_eq!(state.get(&address).unwrap().attributes["enabled"], json!(false));

    for _ in 0..2 {
        mock.clear_calls();
        let report = apply(&registry, &ctx, &blocks, &mut state).await;
        assert!(!report.has_error(), "{}", report.diagnostics);
        assert_eq!(report.unchanged, vec![address.clone()]);
        assert!(report.updated.is_empty());
        assert!(mock.calls().is_empty(), "{:?}", mock.calls());
    }
}

#[tokio::test]
async fn test_import_miss_persists_nothing() {
    let (mock, registry) = setup();
    let ctx = OpContext::new();
    let mut state = StateDocument::new();

    let cases = [
        (
            Address::new("slack_conversation", "eng"),
            "C404",
            "the conversation with the id C404 does not exist",
        ),
        (
            Address::new("slack_usergroup", "oncall"),
            "S404",
            "the usergroup that has the id S404 does not exist",
        ),
    ];

    for (address, id, summary) in cases {
        let diagnostics = import(&registry, &ctx, &address, id, &mut state)
            .await
            .unwrap_err();

        assert!(diagnostics.has_error());
        assert_eq!(diagnostics.iter().next().unwrap().summary, summary);
        assert!(state.get(&address).is_none());
    }

    assert!(state.is_empty());
    assert_eq!(mock.calls_to("conversations.info").len(), 1);
}

#[tokio::test]
async fn test_read_data_blocks() {
    let (mock, registry) = setup();
    mock.add_user(user("U1", "alice@example.com"));
    let blocks = Manifest::parse(
        r#"
[data.slack_user.alice]
email = "alice@example.com"

[data.slack_usergroup.missing]
id = "S404"
"#,
    )
    .unwrap()
    .data_sources()
    .unwrap();

    let (values, diagnostics) = read_data(&registry, &OpContext::new(), &blocks).await;

    assert_eq!(values["slack_user.alice"]["id"], json!("U1"));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics.iter().next().unwrap().summary,
        "slack_usergroup.missing: the usergroup that has the id S404 does not exist"
    );
}
