//! Application service: the cycle orchestrator.
//!
//! [`AppService`] owns the enable controller, the ToF driver, the
//! publisher, the restart action, the clock, and the error supervisor.
//! Each call to [`AppService::tick`] runs one full cycle:
//!
//! ```text
//!  EnableController ──▶ SensorSession ──▶ Publisher      (slot 1, slot 2)
//!                                              │
//!                       ErrorSupervisor ◀──────┘ CycleOutcome
//! ```
//!
//! Per-slot failures (init, read, publish) are absorbed into the cycle's
//! [`CycleOutcome`] and never abort the cycle.  Anything else that goes
//! wrong mid-cycle (an enable line write, the restart command) is caught
//! once, in `tick`, and turned into one extra failure plus a pause.

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::drivers::enable::EnableController;
use crate::error::{Error, Result};
use crate::fsm::{CycleFsm, PhaseAction};
use crate::publisher::Publisher;
use crate::sensors::session::SensorSession;
use crate::sensors::{Sample, SensorSlot, SlotId};
use crate::supervisor::{BACKOFF, CycleOutcome, ErrorSupervisor, Verdict};

use super::events::AppEvent;
use super::ports::{BrokerPort, Clock, EventSink, RestartPort, TofDriver};

// ───────────────────────────────────────────────────────────────
// Cycle report
// ───────────────────────────────────────────────────────────────

/// What happened in one call to [`AppService::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Failures tallied this cycle, including an unexpected one.
    pub outcome: CycleOutcome,
    /// The supervisor's decision for this cycle.
    pub verdict: Verdict,
    /// The failure caught by the outer handler, if any.
    pub unexpected: Option<Error>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<P, D, B, R, C>
where
    P: OutputPin,
    D: TofDriver,
    B: BrokerPort,
    R: RestartPort,
    C: Clock,
{
    slots: [SensorSlot; 2],
    enable: EnableController<P>,
    tof: D,
    publisher: Publisher<B>,
    restart: R,
    clock: C,
    supervisor: ErrorSupervisor,
    fsm: CycleFsm,
    /// Tally of the cycle in progress.
    outcome: CycleOutcome,
}

impl<P, D, B, R, C> AppService<P, D, B, R, C>
where
    P: OutputPin,
    D: TofDriver,
    B: BrokerPort,
    R: RestartPort,
    C: Clock,
{
    /// Assemble the service.  Nothing touches hardware until
    /// [`start`](Self::start).
    pub fn new(
        slots: [SensorSlot; 2],
        enable: EnableController<P>,
        tof: D,
        publisher: Publisher<B>,
        restart: R,
        clock: C,
    ) -> Self {
        Self {
            slots,
            enable,
            tof,
            publisher,
            restart,
            clock,
            supervisor: ErrorSupervisor::new(),
            fsm: CycleFsm::new(),
            outcome: CycleOutcome::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Power both sensors down, then block until the broker accepts a
    /// connection.  Returns the number of connection attempts.
    ///
    /// Fails only if the enable lines cannot be driven low.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<u32> {
        self.enable.init()?;
        for slot in &self.slots {
            info!(
                "{}: enable line {} [{}], {} @ 0x{:02x}, topic {}",
                slot.id, slot.enable_line, slot.enable_label, slot.bus, slot.address, slot.topic
            );
        }
        sink.emit(&AppEvent::Started);
        Ok(self.publisher.connect(&mut self.clock, sink))
    }

    /// Run cycles forever.
    pub fn run_forever(&mut self, sink: &mut impl EventSink) -> ! {
        loop {
            self.tick(sink);
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One full cycle, including the outer catch-all.  Never fails.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> CycleReport {
        let outcome = match self.run_cycle(sink) {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut pending = self.outcome;
                pending.record_unexpected();
                let verdict = self.recover(&e, pending, sink);
                return CycleReport {
                    outcome: pending,
                    verdict,
                    unexpected: Some(e),
                };
            }
        };

        match self
            .supervisor
            .supervise(outcome, &mut self.restart, &mut self.clock, sink)
        {
            Ok(verdict) => {
                self.fsm.advance();
                CycleReport {
                    outcome,
                    verdict,
                    unexpected: None,
                }
            }
            Err(e) => {
                // The slot failures were already accounted for; only the
                // failed restart itself is new.
                let mut pending = CycleOutcome::default();
                pending.record_unexpected();
                let verdict = self.recover(&e, pending, sink);
                let mut total = outcome;
                total.record_unexpected();
                CycleReport {
                    outcome: total,
                    verdict,
                    unexpected: Some(e),
                }
            }
        }
    }

    /// Walk the phase ring from `EnableSensor1` up to `Evaluate` and return
    /// the tally.  Only unexpected failures are returned as errors.
    pub fn run_cycle(&mut self, sink: &mut impl EventSink) -> Result<CycleOutcome> {
        self.outcome = CycleOutcome::default();
        loop {
            match self.fsm.current().action() {
                PhaseAction::Enable(slot) => {
                    self.enable.set_exclusive(slot, &mut self.clock)?;
                    sink.emit(&AppEvent::SensorEnabled {
                        slot,
                        line: self.slots[slot.index()].enable_label.clone(),
                    });
                }
                PhaseAction::Read(slot) => {
                    if self.service_slot(slot, sink).is_err() {
                        self.outcome.record_failure(slot);
                    }
                }
                PhaseAction::SettleOff(_) => {
                    self.enable.disable_all(&mut self.clock)?;
                }
                PhaseAction::Evaluate => return Ok(self.outcome),
            }
            self.fsm.advance();
        }
    }

    /// Open, sample, publish, close.  Every failure is reported through
    /// `sink` before being returned.
    fn service_slot(&mut self, slot: SlotId, sink: &mut impl EventSink) -> Result<()> {
        let wiring = &self.slots[slot.index()];

        let mut session = SensorSession::open(&mut self.tof, wiring).map_err(|e| {
            sink.emit(&AppEvent::SensorInitFailed {
                slot,
                reason: e.to_string(),
            });
            Error::from(e)
        })?;

        let result = match session.read() {
            Ok(Sample::Ignored(distance_mm)) => {
                sink.emit(&AppEvent::NearFieldIgnored { slot, distance_mm });
                Ok(())
            }
            Ok(Sample::Accepted(reading)) => {
                sink.emit(&AppEvent::DistanceMeasured {
                    slot,
                    distance_mm: reading.distance_mm(),
                });
                match self.publisher.publish(&wiring.topic, &reading) {
                    Ok(payload) => {
                        sink.emit(&AppEvent::Published {
                            slot,
                            topic: wiring.topic.clone(),
                            payload,
                        });
                        Ok(())
                    }
                    Err(e) => {
                        sink.emit(&AppEvent::PublishFailed {
                            slot,
                            reason: e.to_string(),
                        });
                        Err(Error::from(e))
                    }
                }
            }
            Err(e) => {
                sink.emit(&AppEvent::SensorReadFailed {
                    slot,
                    reason: e.to_string(),
                });
                Err(Error::from(e))
            }
        };

        match session.close() {
            Ok(()) => sink.emit(&AppEvent::SensorClosed(slot)),
            Err(e) => warn!("{} did not stop ranging: {}", slot, e),
        }
        result
    }

    /// Outer catch-all: log, release both lines, account for the failure,
    /// pause, and start the next cycle from the top.
    fn recover(&mut self, e: &Error, pending: CycleOutcome, sink: &mut impl EventSink) -> Verdict {
        sink.emit(&AppEvent::UnexpectedError {
            reason: e.to_string(),
        });
        if let Err(line_err) = self.enable.init() {
            error!("could not release enable lines: {}", line_err);
        }
        self.fsm.restart_cycle();

        let verdict = self.supervisor.evaluate(pending);
        if let Verdict::Escalate { error_count } = verdict {
            sink.emit(&AppEvent::RestartRequested { error_count });
            if let Err(restart_err) = self.restart.request_restart() {
                error!("restart action failed: {}", restart_err);
            }
        }
        self.clock.sleep(BACKOFF);
        verdict
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn slots(&self) -> &[SensorSlot; 2] {
        &self.slots
    }

    pub fn supervisor(&self) -> &ErrorSupervisor {
        &self.supervisor
    }

    /// Running error count carried between cycles.
    pub fn error_count(&self) -> u32 {
        self.supervisor.error_count()
    }

    /// Cycles completed or abandoned since startup.
    pub fn cycles(&self) -> u64 {
        self.fsm.cycles()
    }

    pub fn enable(&self) -> &EnableController<P> {
        &self.enable
    }

    pub fn tof(&self) -> &D {
        &self.tof
    }

    pub fn tof_mut(&mut self) -> &mut D {
        &mut self.tof
    }

    pub fn publisher(&self) -> &Publisher<B> {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut Publisher<B> {
        &mut self.publisher
    }

    pub fn restart_action(&self) -> &R {
        &self.restart
    }

    pub fn restart_action_mut(&mut self) -> &mut R {
        &mut self.restart
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
