//! # Task Management System
//!
//! This module provides a small thread pool for running chunk work off the
//! foreground thread.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that runs on a worker thread
//! - `TaskResult`: The result of a completed task, applied on the foreground
//! - `TaskChannel`: Communication channel between the foreground and one worker thread
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied on the foreground in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//! 6. The cycle continues until all work is complete
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(num_workers);
//!
//! // Publish a task for background processing
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // Once per frame:
//! task_manager.process_completed_tasks(&mut context);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{error, info};
use task::{Task, TaskResult};

use crate::world_state::StreamingContext;

/// A communication channel between the foreground and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the foreground to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `connected`: Cleared once the worker is found to have hung up
/// - `_worker`: Handle to the worker thread
///
/// Dropping the channel drops `task_sender`, which ends the worker's receive loop.
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    connected: bool,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and managing worker threads
/// - Distributing tasks across available workers
/// - Collecting results and applying them on the foreground
/// - Queuing tasks when all workers are busy
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker, oldest first
/// - `current_channel`: Index for round-robin scheduling
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 means a busy worker never holds queued work another idle
/// worker could have taken.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. At least one is always created.
    ///
    /// A worker whose thread cannot be spawned is logged and skipped.
    pub fn new(num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {} chunk workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        for worker_index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
                        Ok(result) => result,
                        Err(payload) => {
                            let reason = panic_message(payload.as_ref());
                            error!("Chunk worker {} panicked: {}", worker_index, reason);
                            task.abandon(reason)
                        }
                    };
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = match thread::Builder::new()
                .name(format!("chunk-worker-{worker_index}"))
                .spawn(task_closure)
            {
                Ok(worker) => worker,
                Err(e) => {
                    error!("Failed to spawn chunk worker {}: {}", worker_index, e);
                    continue;
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                connected: true,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of live worker channels.
    pub fn num_workers(&self) -> usize {
        self.channels.iter().filter(|channel| channel.connected).count()
    }

    /// Number of tasks waiting for a worker.
    pub fn num_queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Number of tasks currently running on workers.
    pub fn num_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Whether no task is queued or running.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.num_in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the in-flight counter is incremented
    /// - `Err(task)` if the worker has hung up, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => {
                error!("Chunk worker {} hung up", channel_idx);
                self.channels[channel_idx].connected = false;
                Err(task.0)
            }
        }
    }

    /// Finds an available worker channel that can accept a new task.
    ///
    /// Round-robin starting from the channel after the last one used, skipping
    /// disconnected channels and channels that have reached `MAX_TASKS_IN_FLIGHT`.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
        let mut current = start_channel;

        loop {
            let channel = &self.channels[current];
            if channel.connected && channel.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// The task is handed to a free worker right away or queued behind the
    /// tasks already waiting.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        // Keep FIFO order: nothing overtakes tasks that are already waiting.
        if !self.queued_tasks.is_empty() {
            self.queued_tasks.push_back(task);
            return false;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    self.process_queued_tasks();
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers, oldest first, until the queue is empty or
    /// every worker is busy.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                // The channel is now marked disconnected; retry on the next one.
                Err(task) => self.queued_tasks.push_front(task),
            }
        }
    }

    /// Applies every result the workers have finished so far, without blocking.
    ///
    /// Follow-up tasks returned by the results are published once all available
    /// results are applied.
    pub fn process_completed_tasks(&mut self, context: &mut StreamingContext) {
        let mut tasks_to_queue = Vec::new();
        for (channel_idx, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight =
                            channel.num_tasks_in_flight.saturating_sub(1);
                        tasks_to_queue.extend(result.handle_result(context));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        Self::abandon_channel(channel_idx, channel);
                        break;
                    }
                }
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
    }

    /// Blocks until every queued and in-flight task has been processed and its
    /// result applied, including follow-up tasks spawned along the way.
    pub fn wait_until_idle(&mut self, context: &mut StreamingContext) {
        loop {
            self.process_completed_tasks(context);
            self.process_queued_tasks();
            if self.is_idle() {
                return;
            }

            let Some(channel_idx) = self
                .channels
                .iter()
                .position(|channel| channel.num_tasks_in_flight > 0)
            else {
                // Work is queued but no worker can take it.
                error!(
                    "{} tasks queued with no live worker to run them",
                    self.queued_tasks.len()
                );
                return;
            };

            let channel = &mut self.channels[channel_idx];
            match channel.result_receiver.recv() {
                Ok(result) => {
                    channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                    for task in result.handle_result(context) {
                        self.publish_task(task);
                    }
                }
                Err(_) => Self::abandon_channel(channel_idx, channel),
            }
        }
    }

    /// Stops using a channel whose worker died.
    fn abandon_channel(channel_idx: usize, channel: &mut TaskChannel) {
        channel.connected = false;
        if channel.num_tasks_in_flight > 0 {
            error!(
                "Chunk worker {} stopped with {} tasks in flight",
                channel_idx, channel.num_tasks_in_flight
            );
            channel.num_tasks_in_flight = 0;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
