mod common;

use common::{MemoryQueue, QUEUE_URL, message, props};
use sqs_bridge::core::config::{SourceConfig, keys};
use sqs_bridge::core::models::{AttributePayload, AttributeValue, HeaderValue, LogRecord, MESSAGE_ID_KEY, QUEUE_URL_KEY, RECEIPT_HANDLE_KEY, SourcePosition};
use sqs_bridge::{BridgeError, SourceBridge, TaskPhase};

fn started(queue: &MemoryQueue, extra: &[(&str, &str)]) -> SourceBridge {
    let config = SourceConfig::from_props(&props(QUEUE_URL, extra)).unwrap();
    let mut bridge = SourceBridge::default();
    bridge.start_with(config, Box::new(queue.clone()));
    bridge
}

#[tokio::test]
async fn poll_before_start_is_illegal_state() {
    let mut bridge = SourceBridge::default();
    assert_eq!(bridge.phase(), TaskPhase::Idle);
    let err = bridge.poll().await.unwrap_err();
    assert!(matches!(err, BridgeError::IllegalState(_)));
    assert!(err.to_string().contains("Task is not properly initialized"));
}

#[tokio::test]
async fn poll_converts_messages_in_order() {
    let queue = MemoryQueue::new();
    queue.push(message("m-1", "first"));
    queue.push(message("m-2", "second"));
    let mut bridge = started(&queue, &[(keys::MAX_MESSAGES, "10"), (keys::WAIT_TIME_SECONDS, "0")]);

    let records = bridge.poll().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].value, "first");
    assert_eq!(records[1].value, "second");
    assert!(records.iter().all(|r| r.topic == "orders"));
    assert_eq!(records[0].key, "m-1");

    let position = records[0].position.as_ref().unwrap();
    assert_eq!(position.queue_url, QUEUE_URL);
    assert_eq!(position.message_id, "m-1");
    assert_eq!(position.receipt_handle, "rh-m-1");
    assert_eq!(position.source_partition()[QUEUE_URL_KEY], QUEUE_URL);
    assert_eq!(position.source_offset()[MESSAGE_ID_KEY], "m-1");
    assert_eq!(position.source_offset()[RECEIPT_HANDLE_KEY], "rh-m-1");

    assert_eq!(queue.receive_calls(), vec![(10, 0, false, Vec::new())]);
}

#[tokio::test]
async fn empty_receive_yields_empty_batch() {
    let queue = MemoryQueue::new();
    let mut bridge = started(&queue, &[]);
    assert!(bridge.poll().await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_deletes_by_receipt_handle() {
    let queue = MemoryQueue::new();
    queue.push(message("m-1", "body"));
    let mut bridge = started(&queue, &[]);

    let records = bridge.poll().await.unwrap();
    assert_eq!(queue.in_flight(), 1);
    bridge.commit(&records[0]).await.unwrap();
    assert_eq!(queue.deleted(), vec!["rh-m-1".to_string()]);
    assert_eq!(queue.in_flight(), 0);
}

#[tokio::test]
async fn uncommitted_messages_are_redelivered() {
    let queue = MemoryQueue::new();
    queue.push(message("m-1", "body"));
    let mut bridge = started(&queue, &[]);

    let first = bridge.poll().await.unwrap();
    queue.expire_visibility();
    let second = bridge.poll().await.unwrap();
    assert_eq!(first[0].position, second[0].position);
    assert!(queue.deleted().is_empty());
}

#[tokio::test]
async fn commit_without_position_is_illegal_argument() {
    let queue = MemoryQueue::new();
    let mut bridge = started(&queue, &[]);
    let record = LogRecord {
        topic: "orders".to_string(),
        key: "k".to_string(),
        value: "v".to_string(),
        headers: Vec::new(),
        position: None,
    };
    assert!(matches!(
        bridge.commit(&record).await,
        Err(BridgeError::IllegalArgument(_))
    ));
}

#[tokio::test]
async fn commit_after_stop_is_illegal_state() {
    let queue = MemoryQueue::new();
    let mut bridge = started(&queue, &[]);
    bridge.stop();
    let record = LogRecord {
        topic: "orders".to_string(),
        key: "k".to_string(),
        value: "v".to_string(),
        headers: Vec::new(),
        position: Some(SourcePosition {
            queue_url: QUEUE_URL.to_string(),
            message_id: "m-1".to_string(),
            receipt_handle: "rh-m-1".to_string(),
        }),
    };
    assert!(matches!(
        bridge.commit(&record).await,
        Err(BridgeError::IllegalState(_))
    ));
}

#[tokio::test]
async fn attributes_become_headers_and_key_when_enabled() {
    let queue = MemoryQueue::new();
    let mut msg = message("m-1", "body");
    msg.attributes.insert("tenant".to_string(), AttributeValue::string("acme"));
    msg.attributes.insert("count".to_string(), AttributeValue::number("3"));
    queue.push(msg);

    let mut bridge = started(
        &queue,
        &[
            (keys::MESSAGE_ATTRIBUTES_ENABLED, "true"),
            (keys::MESSAGE_ATTRIBUTES_INCLUDE_LIST, "tenant,count"),
            (keys::MESSAGE_ATTRIBUTE_PARTITION_KEY, "tenant"),
        ],
    );
    let records = bridge.poll().await.unwrap();
    assert_eq!(records[0].key, "acme");
    assert_eq!(
        records[0].header("tenant"),
        Some(&HeaderValue::String("acme".to_string()))
    );
    assert_eq!(records[0].header("count"), None);
    assert_eq!(
        queue.receive_calls()[0].3,
        vec!["tenant".to_string(), "count".to_string()]
    );
}

#[tokio::test]
async fn attributes_are_ignored_when_disabled() {
    let queue = MemoryQueue::new();
    let mut msg = message("m-1", "body");
    msg.attributes.insert("tenant".to_string(), AttributeValue::string("acme"));
    queue.push(msg);

    let mut bridge = started(&queue, &[(keys::MESSAGE_ATTRIBUTE_PARTITION_KEY, "tenant")]);
    let records = bridge.poll().await.unwrap();
    assert_eq!(records[0].key, "m-1");
    assert!(records[0].headers.is_empty());
}

#[tokio::test]
async fn body_pointer_supplies_key() {
    let queue = MemoryQueue::new();
    queue.push(message("m-1", r#"{"customer":{"id":"c-7"}}"#));
    let mut bridge = started(
        &queue,
        &[
            (keys::MESSAGE_ATTRIBUTES_ENABLED, "true"),
            (keys::BODY_PARTITION_KEY_PATH, "/customer/id"),
        ],
    );
    assert_eq!(bridge.poll().await.unwrap()[0].key, "c-7");
}

#[tokio::test]
async fn disabled_attributes_always_key_by_message_id() {
    let queue = MemoryQueue::new();
    let mut msg = message("m-1", r#"{"customer":"c-7"}"#);
    msg.attributes.insert("tenant".to_string(), AttributeValue::string("acme"));
    queue.push(msg);

    let mut bridge = started(
        &queue,
        &[
            (keys::MESSAGE_ATTRIBUTE_PARTITION_KEY, "tenant"),
            (keys::BODY_PARTITION_KEY_PATH, "/customer"),
        ],
    );
    assert_eq!(bridge.poll().await.unwrap()[0].key, "m-1");
}

#[tokio::test]
async fn missing_partition_key_attribute_keys_by_message_id() {
    let queue = MemoryQueue::new();
    let mut msg = message("m-1", r#"{"customer":"c-7"}"#);
    msg.attributes.insert("other".to_string(), AttributeValue::string("v"));
    queue.push(msg);

    let mut bridge = started(
        &queue,
        &[
            (keys::MESSAGE_ATTRIBUTES_ENABLED, "true"),
            (keys::MESSAGE_ATTRIBUTE_PARTITION_KEY, "X"),
        ],
    );
    let records = bridge.poll().await.unwrap();
    assert_eq!(records[0].key, "m-1");
    assert_eq!(
        records[0].header("other"),
        Some(&HeaderValue::String("v".to_string()))
    );
}

#[tokio::test]
async fn custom_string_types_reach_headers_and_keys() {
    let queue = MemoryQueue::new();
    let mut msg = message("m-1", "body");
    msg.attributes.insert(
        "trace".to_string(),
        AttributeValue {
            data_type: "String.uuid".to_string(),
            payload: AttributePayload::String("0b8e-77".to_string()),
        },
    );
    queue.push(msg);

    let mut bridge = started(
        &queue,
        &[
            (keys::MESSAGE_ATTRIBUTES_ENABLED, "true"),
            (keys::MESSAGE_ATTRIBUTE_PARTITION_KEY, "trace"),
        ],
    );
    let records = bridge.poll().await.unwrap();
    assert_eq!(records[0].key, "0b8e-77");
    assert_eq!(
        records[0].header("trace"),
        Some(&HeaderValue::String("0b8e-77".to_string()))
    );
}

#[tokio::test]
async fn commit_from_another_queue_is_illegal_argument() {
    let queue = MemoryQueue::new();
    let mut bridge = started(&queue, &[]);
    let record = LogRecord {
        topic: "orders".to_string(),
        key: "k".to_string(),
        value: "v".to_string(),
        headers: Vec::new(),
        position: Some(SourcePosition {
            queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/other".to_string(),
            message_id: "m-1".to_string(),
            receipt_handle: "rh-m-1".to_string(),
        }),
    };
    assert!(matches!(
        bridge.commit(&record).await,
        Err(BridgeError::IllegalArgument(_))
    ));
    assert!(queue.deleted().is_empty());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let queue = MemoryQueue::new();
    let mut bridge = started(&queue, &[]);
    bridge.stop();
    bridge.stop();
    assert_eq!(bridge.phase(), TaskPhase::Stopped);
    assert_eq!(queue.close_count(), 1);
    assert!(matches!(bridge.poll().await, Err(BridgeError::IllegalState(_))));
}
