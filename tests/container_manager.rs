// ABOUTME: Integration tests for ContainerManager against the in-memory runtime.
// ABOUTME: Verifies idempotent ensure_running, replacement of stopped containers, and error propagation.

mod support;

use cutover::runtime::{ContainerError, ContainerManager, ContainerSpec};
use support::{Call, FakeRuntime};

fn release_spec(name: &str) -> ContainerSpec {
    ContainerSpec {
        name: name.to_string(),
        image: "daaku/rell:v1".to_string(),
        user: Some("15151".to_string()),
        env: vec!["A=1".to_string()],
        links: vec!["redis:redis".to_string()],
        ..Default::default()
    }
}

fn is_create_or_start(call: &Call) -> bool {
    matches!(call, Call::Create(_) | Call::Start(_))
}

#[tokio::test]
async fn creates_and_starts_missing_container() {
    support::init_tracing();
    let manager = ContainerManager::new(FakeRuntime::new());

    let record = manager.ensure_running(&release_spec("rell-v1")).await.unwrap();

    assert!(record.running);
    assert_eq!(record.name, "rell-v1");
    assert!(record.ip_address.is_some());
    assert_eq!(
        manager.runtime().calls(),
        vec![
            Call::Inspect("rell-v1".into()),
            Call::Create("rell-v1".into()),
            Call::Start("rell-v1".into()),
            Call::Inspect(record.id.to_string()),
        ]
    );

    let created = manager.runtime().container("rell-v1").unwrap();
    assert_eq!(created.spec.unwrap(), release_spec("rell-v1"));
}

#[tokio::test]
async fn second_call_is_a_no_op() {
    let manager = ContainerManager::new(FakeRuntime::new());
    let spec = release_spec("rell-v1");

    let first = manager.ensure_running(&spec).await.unwrap();
    let second = manager.ensure_running(&spec).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(
        manager.runtime().calls_where(is_create_or_start),
        vec![Call::Create("rell-v1".into()), Call::Start("rell-v1".into())]
    );
}

#[tokio::test]
async fn running_container_is_reused_even_if_spec_differs() {
    let runtime = FakeRuntime::new().with_container("redis", "other/redis", true, &[]);
    let manager = ContainerManager::new(runtime);

    let spec = ContainerSpec {
        name: "redis".into(),
        image: "daaku/redis".into(),
        ..Default::default()
    };
    let record = manager.ensure_running(&spec).await.unwrap();

    assert_eq!(record.image, "other/redis");
    assert!(manager.runtime().calls_where(is_create_or_start).is_empty());
}

#[tokio::test]
async fn stopped_container_is_removed_then_recreated() {
    let runtime = FakeRuntime::new().with_container("rell-v1", "daaku/rell:v1", false, &[]);
    let old_id = runtime.container("rell-v1").unwrap().id;
    let manager = ContainerManager::new(runtime);

    let record = manager.ensure_running(&release_spec("rell-v1")).await.unwrap();

    assert_ne!(record.id, old_id);
    assert!(record.running);
    let calls = manager.runtime().calls();
    assert_eq!(
        &calls[..4],
        &[
            Call::Inspect("rell-v1".into()),
            Call::Remove("rell-v1".into()),
            Call::Create("rell-v1".into()),
            Call::Start("rell-v1".into()),
        ]
    );
    // never restarted in place
    assert_eq!(
        calls.iter().filter(|c| matches!(c, Call::Start(_))).count(),
        1
    );
}

#[tokio::test]
async fn failed_removal_of_stopped_container_propagates() {
    let runtime = FakeRuntime::new().with_container("rell-v1", "daaku/rell:v1", false, &[]);
    runtime.fail_remove("rell-v1");
    let manager = ContainerManager::new(runtime);

    let err = manager
        .ensure_running(&release_spec("rell-v1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ContainerError::Runtime(_)));
    assert!(manager.runtime().calls_where(is_create_or_start).is_empty());
}

#[tokio::test]
async fn missing_image_surfaces_from_create() {
    let runtime = FakeRuntime::new();
    runtime.fail_create("rell-v1");
    let manager = ContainerManager::new(runtime);

    let err = manager
        .ensure_running(&release_spec("rell-v1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ContainerError::ImageNotFound(ref image) if image == "daaku/rell:v1"));
    assert!(!err.is_not_found());
}
