//! Fixed-cadence tick scheduler

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use warden_api::ServiceStatusSnapshot;

use crate::{CoreEvent, EnforcementEngine};

/// Receives what the scheduler produces
pub trait EventSink {
    /// Called for every event of every tick, in order
    fn event(&mut self, event: &CoreEvent);

    /// Called when a status report was requested
    fn status(&mut self, _snapshot: &ServiceStatusSnapshot) {}
}

impl<F: FnMut(&CoreEvent)> EventSink for F {
    fn event(&mut self, event: &CoreEvent) {
        self(event)
    }
}

enum Action {
    Tick,
    Status,
    StatusClosed,
    Stop,
}

/// Drives an [`EnforcementEngine`] at a fixed interval until shutdown.
///
/// Ticks never overlap: a slow tick delays the next one instead of
/// queueing a burst.
pub struct Scheduler {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
    status_requests: Option<mpsc::UnboundedReceiver<()>>,
}

impl Scheduler {
    pub fn new(interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            interval,
            shutdown,
            status_requests: None,
        }
    }

    /// Accept on-demand status requests
    pub fn with_status_requests(mut self, requests: mpsc::UnboundedReceiver<()>) -> Self {
        self.status_requests = Some(requests);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the shutdown flag is set or its sender is dropped.
    ///
    /// Returns the number of ticks run. A tick in progress always
    /// completes before shutdown is observed.
    pub async fn run(mut self, engine: &mut EnforcementEngine, sink: &mut impl EventSink) -> u64 {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_ms = self.interval.as_millis() as u64, "Scheduler started");

        let mut ticks = 0u64;
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let action = tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() { Action::Stop } else { continue }
                }
                _ = timer.tick() => Action::Tick,
                request = next_request(&mut self.status_requests) => match request {
                    Some(()) => Action::Status,
                    None => Action::StatusClosed,
                },
            };

            match action {
                Action::Tick => {
                    let events = engine.tick(warden_util::now());
                    for event in &events {
                        sink.event(event);
                    }
                    ticks += 1;
                }
                Action::Status => {
                    let snapshot = engine.status(warden_util::now());
                    sink.status(&snapshot);
                }
                Action::StatusClosed => {
                    debug!("Status request channel closed");
                    self.status_requests = None;
                }
                Action::Stop => break,
            }
        }

        info!(ticks, "Scheduler stopped");
        ticks
    }
}

async fn next_request(requests: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match requests {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
