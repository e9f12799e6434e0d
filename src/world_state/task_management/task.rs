//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work on background threads while
//! keeping every change to world state on the foreground.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that runs on a worker thread
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`, or `abandon()` builds one if it panicked
//! 4. The result's `handle_result()` is called on the foreground with the `StreamingContext`
//! 5. The result can update the registry, publish meshes and spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the foreground
//! - Tasks own their inputs; nothing a task touches is shared with the registry

use crate::world_state::StreamingContext;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the foreground to
/// background workers. They should be self-contained and own all the data they
/// need to perform their work.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Should report failures through their result rather than panicking
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// This method runs on a worker thread.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the foreground.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// Builds the result reported when `process()` panicked.
    ///
    /// The worker catches the panic and applies this result instead, so whatever the
    /// task had claimed on the foreground is still settled.
    ///
    /// # Arguments
    /// * `reason` - The panic message
    fn abandon(&self, reason: String) -> Box<dyn TaskResult + Send>;
}

/// A trait representing the result of processing a `Task`.
///
/// Task results are applied on the foreground, where they have exclusive access
/// to the streaming state.
pub trait TaskResult: Send {
    /// Applies the result of a completed task.
    ///
    /// # Arguments
    /// * `context` - The foreground streaming state: registry, desired set, render sink
    ///   and the shared generator and store
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, context: &mut StreamingContext) -> Vec<Box<dyn Task + Send>>;
}
