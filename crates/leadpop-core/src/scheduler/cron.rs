//! Cron-triggered scheduler owning the job lifecycle.
//!
//! Constructed explicitly by its caller (no process-wide instance). Every
//! schedule is validated at construction, before anything can fire. Triggered
//! runs go to the background pool so `stop` can wait for them; a trigger that
//! fires while the same job is still running is skipped.

use std::collections::HashMap;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::guard::RunningFlag;
use super::jobs::{JobKind, Orchestrator};
use crate::config::{normalize_schedule, ConfigError, JobsConfig};
use crate::tasks::BackgroundTasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Created,
    Running,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cron scheduler: {0}")]
    Cron(String),
    #[error("scheduler stopped before it was started")]
    NotStarted,
    #[error("scheduler was stopped and cannot be restarted")]
    AlreadyStopped,
}

fn cron_error(e: JobSchedulerError) -> SchedulerError {
    SchedulerError::Cron(format!("{:?}", e))
}

fn schedule_for(jobs: &JobsConfig, kind: JobKind) -> &str {
    match kind {
        JobKind::LowData => &jobs.low_data.schedule,
        JobKind::Missing => &jobs.missing.schedule,
        JobKind::Stats => &jobs.stats.schedule,
    }
}

/// Everything one trigger needs to launch its job.
#[derive(Clone)]
struct Trigger {
    kind: JobKind,
    orchestrator: Arc<Orchestrator>,
    tasks: BackgroundTasks,
    running: RunningFlag,
}

impl Trigger {
    /// Submits a run unless one is already in progress. Returns whether it was submitted.
    fn fire(&self) -> bool {
        let Some(guard) = self.running.try_acquire() else {
            tracing::warn!(
                job = self.kind.name(),
                "previous run still in progress; skipping trigger"
            );
            return false;
        };
        let kind = self.kind;
        let orchestrator = Arc::clone(&self.orchestrator);
        self.tasks.spawn(kind.name(), async move {
            let _guard = guard;
            orchestrator.run_with_budget(kind).await.map(|_| ())
        });
        true
    }
}

fn cron_job(expr: &str, trigger: Trigger) -> Result<Job, JobSchedulerError> {
    Job::new_async(expr, move |_id, _scheduler| {
        let trigger = trigger.clone();
        Box::pin(async move {
            tracing::debug!(job = trigger.kind.name(), "cron trigger fired");
            trigger.fire();
        })
    })
}

pub struct Scheduler {
    cron: JobScheduler,
    triggers: HashMap<JobKind, Trigger>,
    tasks: BackgroundTasks,
    state: SchedulerState,
}

impl Scheduler {
    /// Registers one trigger per job. Fails on the first invalid schedule.
    pub async fn new(
        orchestrator: Arc<Orchestrator>,
        tasks: BackgroundTasks,
    ) -> Result<Self, SchedulerError> {
        let cron = JobScheduler::new().await.map_err(cron_error)?;
        let mut triggers = HashMap::new();

        for kind in JobKind::ALL {
            let expr = schedule_for(orchestrator.jobs(), kind).to_string();
            let invalid = |reason: String| ConfigError::InvalidSchedule {
                job: kind.name(),
                expr: expr.clone(),
                reason,
            };
            let normalized = normalize_schedule(&expr).map_err(invalid)?;
            let trigger = Trigger {
                kind,
                orchestrator: Arc::clone(&orchestrator),
                tasks: tasks.clone(),
                running: RunningFlag::default(),
            };
            let job = cron_job(&normalized, trigger.clone())
                .map_err(|e| invalid(format!("{:?}", e)))?;
            cron.add(job).await.map_err(cron_error)?;
            tracing::debug!(job = kind.name(), schedule = %normalized, "trigger registered");
            triggers.insert(kind, trigger);
        }

        Ok(Self {
            cron,
            triggers,
            tasks,
            state: SchedulerState::Created,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Starts the triggers. Calling it again while running is a no-op.
    pub async fn start(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Running => Ok(()),
            SchedulerState::Stopped => Err(SchedulerError::AlreadyStopped),
            SchedulerState::Created => {
                self.cron.start().await.map_err(cron_error)?;
                self.state = SchedulerState::Running;
                tracing::info!(jobs = self.triggers.len(), "scheduler started");
                Ok(())
            }
        }
    }

    /// Stops the triggers, then waits for running jobs to finish on their own.
    /// Calling it again after a stop is a no-op; calling it before `start` is an error.
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Created => Err(SchedulerError::NotStarted),
            SchedulerState::Stopped => Ok(()),
            SchedulerState::Running => {
                self.cron.shutdown().await.map_err(cron_error)?;
                self.state = SchedulerState::Stopped;
                tracing::info!(
                    in_flight = self.tasks.in_flight(),
                    "triggers stopped; waiting for running jobs"
                );
                self.tasks.drain().await;
                tracing::info!("scheduler stopped");
                Ok(())
            }
        }
    }

    /// Runs `kind` now, outside its schedule, under the same overlap rule.
    /// Returns false if the job is already running or the scheduler is stopped.
    pub fn trigger(&self, kind: JobKind) -> bool {
        if self.state == SchedulerState::Stopped {
            tracing::warn!(job = kind.name(), "scheduler stopped; manual trigger ignored");
            return false;
        }
        self.triggers.get(&kind).is_some_and(Trigger::fire)
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.triggers
            .get(&kind)
            .is_some_and(|t| t.running.is_running())
    }
}
