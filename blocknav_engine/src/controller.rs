// The path controller: route lifecycle around the executor.
//
// `PathController` is the piece a bot's tick loop talks to. It owns the
// current `PathExecutor` (if any) and moves between these states:
//
//   Idle -> Calculating -> Running -> Finished
//                ^            |
//                +------------+   executor asked for recalculation
//
// plus `Cancelled` (from anywhere, sticky) and `Failed(reason)` (searcher
// error or fatal execution error).
//
// Each route search runs on its own `route-search` thread, off the tick
// thread and off the rayon pool (graph expansion fans out over that pool, and
// a settling search must not sit on one of its workers). A search job:
//
// 1. Returns early if cancellation was requested.
// 2. For a recalculation, sleeps `recalculate_settle_ms` first so a fall
//    or jump in progress can finish, then checks cancellation again.
// 3. Calls `PathSearcher::find_path`.
// 4. Under the executor lock, checks cancellation once more and installs a
//    fresh executor. The initial route gets a leading move to its start
//    block; a partial route gets a trailing recalculate marker. An empty
//    complete route means the goal is already reached.
//
// A panic inside the searcher is caught on the search thread and reported as
// `Failed`; the job is still counted as returned.
//
// Cancellation is cooperative. It never interrupts a tick or a search in
// progress; it only keeps a finished search from installing anything.
//
// See also: `executor.rs` for the per-tick state machine, `world_action.rs`
// for the steps installed here.
//
// **Critical constraint: lock order.** The executor lock is always taken
// before the progress lock. `tick` holds the executor lock for the whole
// step tick, so a search finishing mid-tick waits for the tick to end.

use crate::bot::BotConnection;
use crate::config::NavConfig;
use crate::error::{ExecutionError, SearchError};
use crate::executor::{ExecutorStatus, PathExecutor};
use crate::graph::PlannedAction;
use crate::types::Vec3i;
use crate::world_action::{MovementAction, RecalculatePathAction, WorldAction};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// The route a searcher found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// The block the route starts from.
    pub start: Vec3i,
    pub actions: Vec<PlannedAction>,
    /// The search stopped short of the goal (time limit or unloaded
    /// terrain); plan again once the route is walked.
    pub partial: bool,
}

impl RoutePlan {
    pub fn complete(start: Vec3i, actions: Vec<PlannedAction>) -> Self {
        Self {
            start,
            actions,
            partial: false,
        }
    }

    pub fn partial(start: Vec3i, actions: Vec<PlannedAction>) -> Self {
        Self {
            start,
            actions,
            partial: true,
        }
    }
}

/// Finds routes from the bot's current position. Called from a background
/// thread.
pub trait PathSearcher: Send + Sync {
    fn find_path(&self, is_initial: bool) -> Result<RoutePlan, SearchError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerStatus {
    Idle,
    Calculating,
    Running,
    Finished,
    Cancelled,
    Failed(String),
}

impl ControllerStatus {
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            ControllerStatus::Finished | ControllerStatus::Cancelled | ControllerStatus::Failed(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Progress {
    status: ControllerStatus,
    /// Search jobs submitted and not yet returned.
    jobs: usize,
}

struct Shared {
    searcher: Arc<dyn PathSearcher>,
    config: NavConfig,
    executor: Mutex<Option<PathExecutor>>,
    progress: Mutex<Progress>,
    changed: Condvar,
    cancelled: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Shared {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancelled is final; later transitions are ignored.
    fn set_status(&self, status: ControllerStatus) {
        let mut progress = lock(&self.progress);
        if progress.status == ControllerStatus::Cancelled {
            return;
        }
        progress.status = status;
        self.changed.notify_all();
    }

    fn finish_job(&self) {
        let mut progress = lock(&self.progress);
        progress.jobs = progress.jobs.saturating_sub(1);
        self.changed.notify_all();
    }

    fn recalculate(&self, is_initial: bool) {
        if self.is_cancelled() {
            return;
        }
        if !is_initial && self.config.recalculate_settle_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.recalculate_settle_ms));
            if self.is_cancelled() {
                log::debug!("cancelled while settling, not searching");
                return;
            }
        }

        let result = self.searcher.find_path(is_initial);

        let mut executor = lock(&self.executor);
        if self.is_cancelled() {
            log::info!("route search finished after cancellation, discarding it");
            return;
        }
        let plan = match result {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("route search failed: {e}");
                self.set_status(ControllerStatus::Failed(e.to_string()));
                return;
            }
        };
        if plan.actions.is_empty() && !plan.partial {
            log::info!("already at the goal");
            self.set_status(ControllerStatus::Finished);
            return;
        }

        log::info!(
            "installing {} route of {} steps from {}",
            if plan.partial { "partial" } else { "complete" },
            plan.actions.len(),
            plan.start
        );
        let mut steps: Vec<Box<dyn WorldAction>> = Vec::with_capacity(plan.actions.len() + 2);
        if is_initial {
            steps.push(Box::new(MovementAction::new(
                plan.start,
                false,
                self.config.yaw_noise_threshold_degrees,
            )));
        }
        steps.extend(
            plan.actions
                .into_iter()
                .map(|action| action.into_world_action(&self.config)),
        );
        if plan.partial {
            steps.push(Box::new(RecalculatePathAction));
        }
        *executor = Some(PathExecutor::new(steps, &self.config));
        self.set_status(ControllerStatus::Running);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct PathController {
    shared: Arc<Shared>,
}

impl PathController {
    pub fn new(searcher: Arc<dyn PathSearcher>, config: NavConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                searcher,
                config,
                executor: Mutex::new(None),
                progress: Mutex::new(Progress {
                    status: ControllerStatus::Idle,
                    jobs: 0,
                }),
                changed: Condvar::new(),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn status(&self) -> ControllerStatus {
        lock(&self.shared.progress).status.clone()
    }

    pub fn is_done(&self) -> bool {
        self.status().is_done()
    }

    /// Start the initial route search.
    pub fn register(&self) {
        log::info!("starting route calculation");
        self.submit(true);
    }

    /// Stop following the route. A search in progress still runs to the
    /// end but installs nothing.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        let mut executor = lock(&self.shared.executor);
        executor.take();
        let mut progress = lock(&self.shared.progress);
        if !progress.status.is_done() {
            log::info!("route cancelled");
        }
        progress.status = ControllerStatus::Cancelled;
        self.shared.changed.notify_all();
    }

    /// Block until no search is pending (or `timeout` passes) and return
    /// the status then.
    pub fn wait_while_calculating(&self, timeout: Duration) -> ControllerStatus {
        let progress = lock(&self.shared.progress);
        let (progress, _) = self
            .shared
            .changed
            .wait_timeout_while(progress, timeout, |p| {
                p.status == ControllerStatus::Calculating
            })
            .unwrap_or_else(PoisonError::into_inner);
        progress.status.clone()
    }

    /// Block until every submitted search job has returned. Returns false
    /// on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let progress = lock(&self.shared.progress);
        let (progress, _) = self
            .shared
            .changed
            .wait_timeout_while(progress, timeout, |p| p.jobs > 0)
            .unwrap_or_else(PoisonError::into_inner);
        progress.jobs == 0
    }

    /// Drive the current route by one game tick. Does nothing while no
    /// route is installed.
    pub fn tick(&self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        let mut slot = lock(&self.shared.executor);
        let Some(executor) = slot.as_mut() else {
            return Ok(());
        };
        match executor.tick(bot) {
            Ok(ExecutorStatus::Running) => Ok(()),
            Ok(ExecutorStatus::Finished) => {
                *slot = None;
                bot.controls().reset();
                self.shared.set_status(ControllerStatus::Finished);
                Ok(())
            }
            Ok(ExecutorStatus::NeedsRecalculation) => {
                *slot = None;
                drop(slot);
                bot.controls().reset();
                self.submit(false);
                Ok(())
            }
            Err(e) => {
                *slot = None;
                bot.controls().reset();
                log::error!("route execution failed: {e}");
                self.shared.set_status(ControllerStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn submit(&self, is_initial: bool) {
        if self.shared.is_cancelled() {
            return;
        }
        {
            let mut progress = lock(&self.shared.progress);
            if progress.status == ControllerStatus::Cancelled {
                return;
            }
            progress.status = ControllerStatus::Calculating;
            progress.jobs += 1;
            self.shared.changed.notify_all();
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("route-search".to_string())
            .spawn(move || {
                let searched = panic::catch_unwind(AssertUnwindSafe(|| {
                    shared.recalculate(is_initial);
                }));
                if let Err(payload) = searched {
                    let reason = panic_message(payload.as_ref());
                    log::error!("route search panicked: {reason}");
                    shared.set_status(ControllerStatus::Failed(format!(
                        "route search panicked: {reason}"
                    )));
                }
                shared.finish_job();
            });
        if let Err(e) = spawned {
            log::error!("could not start route search thread: {e}");
            self.shared.set_status(ControllerStatus::Failed(e.to_string()));
            self.shared.finish_job();
        }
    }
}

impl Drop for PathController {
    fn drop(&mut self) {
        self.shared.cancelled.store(true, Ordering::Release);
    }
}
