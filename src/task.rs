//! Lifecycle shared by the source and sink bridges.

use tracing::info;

use crate::errors::{BridgeError, Result};
use crate::transport::MessageQueue;

/// Externally visible lifecycle phase of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    Running,
    Stopped,
}

pub(crate) struct RunningTask<C> {
    pub task: C,
    pub queue: Box<dyn MessageQueue>,
}

pub(crate) enum TaskState<C> {
    Idle,
    Running(RunningTask<C>),
    Stopped,
}

impl<C> TaskState<C> {
    pub fn phase(&self) -> TaskPhase {
        match self {
            TaskState::Idle => TaskPhase::Idle,
            TaskState::Running(_) => TaskPhase::Running,
            TaskState::Stopped => TaskPhase::Stopped,
        }
    }

    pub fn running(&self) -> Result<&RunningTask<C>> {
        match self {
            TaskState::Running(task) => Ok(task),
            TaskState::Idle | TaskState::Stopped => Err(BridgeError::IllegalState(
                "Task is not properly initialized".to_string(),
            )),
        }
    }

    /// Replaces any running task, closing its queue first.
    pub fn start(&mut self, task: C, queue: Box<dyn MessageQueue>) {
        self.stop();
        *self = TaskState::Running(RunningTask { task, queue });
    }

    /// Closes the queue of a running task. Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        match std::mem::replace(self, TaskState::Stopped) {
            TaskState::Running(mut task) => {
                task.queue.close();
                info!("task.stop:OK");
                true
            }
            TaskState::Idle | TaskState::Stopped => false,
        }
    }
}
