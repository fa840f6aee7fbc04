//! Background today-line runs, one per data version
//!
//! The chart is painted by someone else on their own schedule. Each time the
//! feed changes the controller bumps a version counter and spawns a run
//! that:
//!
//! 1. plans the line from the new feed (no range, or today outside it, ends
//!    the run at once)
//! 2. polls the host until the month labels are painted, bounded by the
//!    ready timeout
//! 3. draws the line
//! 4. optionally keeps checking and redraws if a re-render dropped the line
//!
//! A run stops as soon as the version moves past its own, so at most one run
//! ever touches the chart. Every run starts by removing the line left by the
//! previous version, so a version that cannot draw leaves no line behind.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use milestrack_core::{DateResolution, DependencyEdge, OverlayConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::chart::SvgChart;
use crate::overlay::{draw_today_line, LineStyle, LocateError, OverlayOutcome, PlanError, TodayLinePlan};

/// Access to the chart as currently painted
pub trait ChartHost: Send + Sync + 'static {
    /// Run `f` against the painted chart. `None` while nothing is painted.
    fn with_chart<R>(&self, f: impl FnOnce(&mut SvgChart) -> R) -> Option<R>;
}

/// Shared in-memory chart host
#[derive(Clone, Debug, Default)]
pub struct ChartSlot {
    inner: Arc<Mutex<Option<SvgChart>>>,
}

impl ChartSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SvgChart>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the painted chart (a fresh render)
    pub fn paint(&self, chart: SvgChart) {
        *self.lock() = Some(chart);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn snapshot(&self) -> Option<SvgChart> {
        self.lock().clone()
    }
}

impl ChartHost for ChartSlot {
    fn with_chart<R>(&self, f: impl FnOnce(&mut SvgChart) -> R) -> Option<R> {
        self.lock().as_mut().map(f)
    }
}

/// Owns the data version and spawns overlay runs
#[derive(Debug)]
pub struct TodayLineController<H: ChartHost> {
    host: Arc<H>,
    config: OverlayConfig,
    policy: DateResolution,
    version: watch::Sender<u64>,
}

impl<H: ChartHost> TodayLineController<H> {
    pub fn new(host: H, config: OverlayConfig, policy: DateResolution) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            host: Arc::new(host),
            config,
            policy,
            version,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Current data version
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Supersede any running overlay and start one for `edges`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn data_changed(&self, edges: &[DependencyEdge], today: NaiveDate) -> JoinHandle<OverlayOutcome> {
        self.version.send_modify(|v| *v += 1);
        let version = self.version();
        let receiver = self.version.subscribe();

        let run = OverlayRun {
            version,
            host: Arc::clone(&self.host),
            plan: TodayLinePlan::new(edges, today, self.policy),
            style: LineStyle::from(&self.config),
            poll_interval: self.config.poll_interval(),
            ready_timeout: self.config.ready_timeout(),
            maintain: self.config.maintain,
        };
        debug!(version, "starting today-line run");
        tokio::spawn(run.execute(receiver))
    }

    /// Stop the active run without starting a new one
    pub fn cancel(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

struct OverlayRun<H> {
    version: u64,
    host: Arc<H>,
    plan: Result<TodayLinePlan, PlanError>,
    style: LineStyle,
    poll_interval: Duration,
    ready_timeout: Duration,
    maintain: bool,
}

enum FirstDraw {
    Drawn(f64),
    Stopped(OverlayOutcome),
}

impl<H: ChartHost> OverlayRun<H> {
    async fn execute(self, mut receiver: watch::Receiver<u64>) -> OverlayOutcome {
        let cleared = self.host.with_chart(|chart| {
            if self.is_current(&receiver) {
                chart.remove_by_id(&self.style.id)
            } else {
                0
            }
        });
        if cleared.unwrap_or(0) > 0 {
            debug!(version = self.version, "removed previous today line");
        }

        let plan = match &self.plan {
            Ok(plan) => plan,
            Err(err) => {
                info!(version = self.version, "no today line: {}", err);
                return (*err).into();
            }
        };

        let first = timeout(self.ready_timeout, self.wait_and_draw(plan, &mut receiver)).await;
        let mut x = match first {
            Ok(FirstDraw::Drawn(x)) => x,
            Ok(FirstDraw::Stopped(outcome)) => return outcome,
            Err(_) => {
                warn!(
                    version = self.version,
                    timeout_ms = self.ready_timeout.as_millis() as u64,
                    "chart not painted in time, no today line"
                );
                return OverlayOutcome::TimedOut;
            }
        };

        if !self.maintain {
            return OverlayOutcome::Drawn { x };
        }

        let mut redraws = 0;
        loop {
            if self.pause(&mut receiver).await {
                debug!(version = self.version, redraws, "today-line run retired");
                return OverlayOutcome::Retired { x, redraws };
            }

            let redrawn = self.host.with_chart(|chart| {
                if !self.is_current(&receiver) || chart.find_by_id(&self.style.id).is_some() {
                    return None;
                }
                Some(draw_today_line(chart, plan, &self.style))
            });

            match redrawn.flatten() {
                None | Some(Err(LocateError::LabelsMissing(_))) => {}
                Some(Ok(new_x)) => {
                    redraws += 1;
                    x = new_x;
                    debug!(version = self.version, x, "redrew today line after re-render");
                }
                Some(Err(LocateError::LabelMismatch { expected, found })) => {
                    info!(expected, found, "month labels changed, today line dropped");
                    return OverlayOutcome::LabelMismatch { expected, found };
                }
            }
        }
    }

    async fn wait_and_draw(
        &self,
        plan: &TodayLinePlan,
        receiver: &mut watch::Receiver<u64>,
    ) -> FirstDraw {
        loop {
            let drawn = self.host.with_chart(|chart| {
                if self.is_current(receiver) {
                    Some(draw_today_line(chart, plan, &self.style))
                } else {
                    None
                }
            });
            match drawn.flatten() {
                Some(Ok(x)) => {
                    info!(version = self.version, x, "today line drawn");
                    return FirstDraw::Drawn(x);
                }
                Some(Err(LocateError::LabelMismatch { expected, found })) => {
                    info!(expected, found, "month label count mismatch, no today line");
                    return FirstDraw::Stopped(OverlayOutcome::LabelMismatch { expected, found });
                }
                Some(Err(LocateError::LabelsMissing(_))) | None => {}
            }

            if self.pause(receiver).await {
                return FirstDraw::Stopped(OverlayOutcome::Superseded);
            }
        }
    }

    /// Checked under the host lock, so a superseded run never draws
    fn is_current(&self, receiver: &watch::Receiver<u64>) -> bool {
        *receiver.borrow() == self.version
    }

    /// Wait one poll interval. True if the run has been superseded.
    async fn pause(&self, receiver: &mut watch::Receiver<u64>) -> bool {
        tokio::select! {
            () = sleep(self.poll_interval) => false,
            changed = receiver.changed() => {
                // a closed channel means the controller is gone
                changed.is_err() || *receiver.borrow() != self.version
            }
        }
    }
}
