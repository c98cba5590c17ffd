//! Publisher connect-retry and publish-path tests.

use dualtof::app::events::AppEvent;
use dualtof::error::PublishError;
use dualtof::publisher::{CONNECT_RETRY_PAUSE, ConnectionState, Publisher};
use dualtof::sensors::{Reading, SlotId};

use crate::mock_hw::{FakeClock, RecordingBroker, RecordingSink};

#[test]
fn connect_blocks_until_broker_accepts() {
    let mut publisher = Publisher::new(RecordingBroker::failing_connects(4));
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::new();

    let attempts = publisher.connect(&mut clock, &mut sink);

    assert_eq!(attempts, 5);
    assert_eq!(publisher.broker().connect_attempts, 5);
    assert_eq!(clock.sleeps, vec![CONNECT_RETRY_PAUSE; 4]);
    assert_eq!(publisher.state(), ConnectionState::Connected);
    let failed: Vec<u32> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::BrokerConnectFailed { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![1, 2, 3, 4]);
}

#[test]
fn immediate_connect_does_not_pause() {
    let mut publisher = Publisher::new(RecordingBroker::default());
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::new();

    assert_eq!(publisher.connect(&mut clock, &mut sink), 1);
    assert!(clock.sleeps.is_empty());
    assert_eq!(sink.events, vec![AppEvent::BrokerConnected { attempts: 1 }]);
}

#[test]
fn publish_reports_broker_failure() {
    let mut publisher = Publisher::new(RecordingBroker::default());
    publisher.attempt().unwrap();
    publisher.broker_mut().fail_publish = true;

    let reading = Reading::accept(SlotId::One, 420).unwrap();
    let err = publisher.publish("sensor/meter/1", &reading).unwrap_err();

    assert!(matches!(err, PublishError::Send(_)));
    assert_eq!(publisher.published(), 0);
}

#[test]
fn each_reading_is_one_message() {
    let mut publisher = Publisher::new(RecordingBroker::default());
    publisher.attempt().unwrap();

    for mm in [10, 11, 4000] {
        let reading = Reading::accept(SlotId::Two, mm).unwrap();
        publisher.publish("sensor/meter/2", &reading).unwrap();
    }

    assert_eq!(publisher.published(), 3);
    let payloads: Vec<&str> = publisher
        .broker()
        .sent
        .iter()
        .map(|(_, p)| p.as_str())
        .collect();
    assert_eq!(
        payloads,
        vec![r#"{"value":10}"#, r#"{"value":11}"#, r#"{"value":4000}"#]
    );
}
