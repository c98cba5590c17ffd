//! Integration tests for the AppService → EnableController → SensorSession
//! → Publisher → ErrorSupervisor pipeline.
//!
//! Everything runs on the host against the doubles in `mock_hw`; the fake
//! clock records pauses instead of sleeping.

use dualtof::app::events::AppEvent;
use dualtof::drivers::enable::SETTLE_DELAY;
use dualtof::error::Error;
use dualtof::publisher::CONNECT_RETRY_PAUSE;
use dualtof::sensors::{RangingMode, SlotId};
use dualtof::supervisor::{BACKOFF, Verdict};

use crate::mock_hw::{RecordingBroker, Rig, TofStep};

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_drives_lines_low_before_connecting() {
    let mut rig = Rig::with_broker(RecordingBroker::failing_connects(2));
    let attempts = rig.app.start(&mut rig.sink).unwrap();

    assert_eq!(attempts, 3);
    assert_eq!(rig.board.borrow().writes, vec![(0, false), (1, false)]);
    assert_eq!(rig.sink.events[0], AppEvent::Started);
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::BrokerConnected { attempts: 3 })
    );
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::BrokerConnectFailed { .. })),
        2
    );
    assert_eq!(rig.app.clock().sleeps, vec![CONNECT_RETRY_PAUSE; 2]);
    assert!(rig.app.publisher().is_connected());
}

#[test]
fn startup_fails_if_lines_cannot_be_driven() {
    let mut rig = Rig::new();
    rig.board.borrow_mut().fail_in(0);

    let err = rig.app.start(&mut rig.sink).unwrap_err();
    assert!(matches!(err, Error::Line(_)));
    assert_eq!(rig.app.publisher().broker().connect_attempts, 0);
}

// ── Healthy cycles ────────────────────────────────────────────

#[test]
fn both_sensors_publish_and_no_pause_follows() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::Distance(150)]);
    rig.tof().script(SlotId::Two, &[TofStep::Distance(200)]);

    let report = rig.app.tick(&mut rig.sink);

    assert_eq!(report.verdict, Verdict::Proceed);
    assert!(report.outcome.is_clean());
    assert!(report.unexpected.is_none());
    assert_eq!(
        rig.sent(),
        &[
            ("sensor/meter/1".to_string(), r#"{"value":150}"#.to_string()),
            ("sensor/meter/2".to_string(), r#"{"value":200}"#.to_string()),
        ]
    );
    assert_eq!(rig.app.error_count(), 0);
    // Only the four settle delays; no backoff.
    assert_eq!(rig.app.clock().sleeps, vec![SETTLE_DELAY; 4]);
    assert_eq!(rig.app.cycles(), 1);
}

#[test]
fn one_cycle_switches_lines_in_order() {
    let mut rig = Rig::started();
    rig.board.borrow_mut().writes.clear();

    rig.app.tick(&mut rig.sink);

    assert_eq!(
        rig.board.borrow().writes,
        vec![
            // EnableSensor1: other line low first, then assert.
            (1, false),
            (0, true),
            // SettleOff1
            (0, false),
            (1, false),
            // EnableSensor2
            (0, false),
            (1, true),
            // SettleOff2
            (0, false),
            (1, false),
        ]
    );
    assert_eq!(rig.board.borrow().levels, [false, false]);
}

#[test]
fn sensors_are_only_touched_while_powered() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::ReadFails, TofStep::Distance(5)]);
    rig.tof().script(SlotId::Two, &[TofStep::InitFails]);

    for _ in 0..5 {
        rig.app.tick(&mut rig.sink);
    }

    let board = rig.board.borrow();
    assert!(!board.overlap_seen, "both enable lines were high at once");
    let tof = rig.app.tof();
    assert_eq!(tof.unpowered_opens, 0);
    assert_eq!(tof.stale_access, 0);
    assert!(
        tof.opens
            .iter()
            .all(|(_, bus, addr, mode)| bus == "/dev/i2c-0" && *addr == 0x29 && *mode == RangingMode::Short)
    );
}

#[test]
fn every_opened_session_is_closed() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::ReadFails]);
    rig.tof().script(SlotId::Two, &[TofStep::InitFails]);

    rig.app.tick(&mut rig.sink);

    // Slot 2 never opened, so only slot 1 is closed.
    assert_eq!(rig.app.tof().closes, vec![SlotId::One]);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SensorClosed(_))),
        1
    );
}

// ── Near-field rejection ──────────────────────────────────────

#[test]
fn near_field_sample_is_dropped_without_failure() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::Distance(9)]);
    rig.tof().script(SlotId::Two, &[TofStep::Distance(10)]);

    let report = rig.app.tick(&mut rig.sink);

    assert_eq!(report.verdict, Verdict::Proceed);
    assert_eq!(rig.app.publisher().broker().topics(), vec!["sensor/meter/2"]);
    assert!(rig.sink.events.contains(&AppEvent::NearFieldIgnored {
        slot: SlotId::One,
        distance_mm: 9
    }));
    assert_eq!(rig.sent()[0].1, r#"{"value":10}"#);
}

// ── Failure accounting ────────────────────────────────────────

#[test]
fn init_failure_on_one_slot_backs_off() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::InitFails]);
    rig.tof().script(SlotId::Two, &[TofStep::Distance(80)]);

    let report = rig.app.tick(&mut rig.sink);

    assert_eq!(report.verdict, Verdict::Backoff { error_count: 1 });
    assert!(report.outcome.slot_failed(SlotId::One));
    assert!(!report.outcome.slot_failed(SlotId::Two));
    assert_eq!(
        rig.sent(),
        &[("sensor/meter/2".to_string(), r#"{"value":80}"#.to_string())]
    );
    assert_eq!(rig.app.error_count(), 1);
    assert_eq!(rig.app.clock().count(BACKOFF), 1);
    assert!(rig.sink.events.contains(&AppEvent::CycleFailed {
        failures: 1,
        error_count: 1
    }));
}

#[test]
fn publish_failure_counts_against_the_slot() {
    let mut rig = Rig::started();
    rig.app.publisher_mut().broker_mut().fail_publish = true;

    let report = rig.app.tick(&mut rig.sink);

    assert_eq!(report.outcome.failures(), 2);
    assert_eq!(report.verdict, Verdict::Backoff { error_count: 2 });
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PublishFailed { .. })),
        2
    );
    // Sessions were still closed after the failed publish.
    assert_eq!(rig.app.tof().closes, vec![SlotId::One, SlotId::Two]);
}

#[test]
fn three_failing_cycles_request_one_restart() {
    let mut rig = Rig::started();
    rig.tof().always(SlotId::One, TofStep::ReadFails);

    let verdicts: Vec<_> = (0..3).map(|_| rig.app.tick(&mut rig.sink).verdict).collect();

    assert_eq!(
        verdicts,
        vec![
            Verdict::Backoff { error_count: 1 },
            Verdict::Backoff { error_count: 2 },
            Verdict::Escalate { error_count: 3 },
        ]
    );
    assert_eq!(rig.restarts(), 1);
    assert_eq!(rig.app.error_count(), 0);
    // Two backoffs; escalation itself does not pause.
    assert_eq!(rig.app.clock().count(BACKOFF), 2);
}

#[test]
fn double_failures_escalate_after_two_cycles() {
    let mut rig = Rig::started();
    rig.tof().always(SlotId::One, TofStep::InitFails);
    rig.tof().always(SlotId::Two, TofStep::ReadFails);

    assert_eq!(
        rig.app.tick(&mut rig.sink).verdict,
        Verdict::Backoff { error_count: 2 }
    );
    assert_eq!(
        rig.app.tick(&mut rig.sink).verdict,
        Verdict::Escalate { error_count: 4 }
    );
    assert_eq!(rig.restarts(), 1);
    assert_eq!(rig.app.error_count(), 0);
}

#[test]
fn clean_cycle_resets_the_count() {
    let mut rig = Rig::started();
    rig.tof().script(
        SlotId::One,
        &[
            TofStep::ReadFails,
            TofStep::ReadFails,
            TofStep::Distance(300),
            TofStep::ReadFails,
        ],
    );

    let counts: Vec<_> = (0..4)
        .map(|_| {
            rig.app.tick(&mut rig.sink);
            rig.app.error_count()
        })
        .collect();

    assert_eq!(counts, vec![1, 2, 0, 1]);
    assert_eq!(rig.restarts(), 0);
}

// ── Outer handler ─────────────────────────────────────────────

#[test]
fn line_failure_is_caught_and_paused() {
    let mut rig = Rig::started();
    // First write of the cycle: slot 2's line driven low.
    rig.board.borrow_mut().fail_in(0);

    let report = rig.app.tick(&mut rig.sink);

    assert!(matches!(report.unexpected, Some(Error::Line(_))));
    assert_eq!(report.verdict, Verdict::Backoff { error_count: 1 });
    assert_eq!(rig.app.error_count(), 1);
    assert_eq!(rig.app.clock().sleeps.last(), Some(&BACKOFF));
    assert_eq!(rig.board.borrow().levels, [false, false]);
    assert!(rig.sent().is_empty());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::UnexpectedError { .. })),
        1
    );

    // The next cycle starts from sensor 1 and runs normally.
    let report = rig.app.tick(&mut rig.sink);
    assert_eq!(report.verdict, Verdict::Proceed);
    assert_eq!(rig.sent().len(), 2);
    assert_eq!(rig.app.cycles(), 2);
}

#[test]
fn line_failure_mid_cycle_keeps_slot_failures() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::ReadFails]);
    // Writes: enable 1 (2), settle off (2), then slot 1's line low for enable 2.
    rig.board.borrow_mut().fail_in(4);

    let report = rig.app.tick(&mut rig.sink);

    assert!(report.outcome.slot_failed(SlotId::One));
    assert_eq!(report.outcome.failures(), 2);
    assert_eq!(report.verdict, Verdict::Backoff { error_count: 2 });
    // Slot 2 was never reached.
    assert!(rig.app.tof().opens.iter().all(|(slot, ..)| *slot == SlotId::One));
}

#[test]
fn unexpected_failure_can_escalate() {
    let mut rig = Rig::started();
    rig.tof().script(SlotId::One, &[TofStep::ReadFails, TofStep::ReadFails]);
    rig.app.tick(&mut rig.sink);
    rig.app.tick(&mut rig.sink);
    assert_eq!(rig.app.error_count(), 2);

    rig.board.borrow_mut().fail_in(0);
    let report = rig.app.tick(&mut rig.sink);

    assert_eq!(report.verdict, Verdict::Escalate { error_count: 3 });
    assert_eq!(rig.restarts(), 1);
    assert_eq!(rig.app.error_count(), 0);
    assert_eq!(rig.app.clock().sleeps.last(), Some(&BACKOFF));
}

#[test]
fn failed_restart_is_an_unexpected_error() {
    let mut rig = Rig::started();
    rig.app.restart_action_mut().fail = true;
    rig.tof().always(SlotId::One, TofStep::ReadFails);

    rig.app.tick(&mut rig.sink);
    rig.app.tick(&mut rig.sink);
    let report = rig.app.tick(&mut rig.sink);

    assert!(matches!(report.unexpected, Some(Error::Restart(_))));
    assert_eq!(rig.restarts(), 1);
    // The escalation reset the count; the failed restart adds one back.
    assert_eq!(report.verdict, Verdict::Backoff { error_count: 1 });
    assert_eq!(rig.app.error_count(), 1);
    assert_eq!(rig.app.clock().sleeps.last(), Some(&BACKOFF));
    assert_eq!(rig.app.cycles(), 3);
}
