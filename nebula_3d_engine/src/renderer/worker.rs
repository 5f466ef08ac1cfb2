//! Task-queue worker thread.
//!
//! The renderer owns one long-lived worker thread. Before the render loop
//! starts, resource uploads and pipeline compilation are submitted to it as
//! closures and awaited through [`TaskHandle`]; once the loop is submitted
//! the queue is closed and the thread belongs to the loop until shutdown.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{Builder, JoinHandle};
use crate::error::{Error, Result};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Future-like handle to a submitted task's result
pub struct TaskHandle<R> {
    receiver: Receiver<R>,
}

impl<R> TaskHandle<R> {
    /// Block until the task completes
    ///
    /// # Errors
    ///
    /// `BackendError` if the task was dropped without running (worker shut
    /// down) or panicked.
    pub fn wait(self) -> Result<R> {
        self.receiver
            .recv()
            .map_err(|_| Error::BackendError("worker task did not complete".to_string()))
    }
}

/// A thread executing submitted closures in order
pub struct Worker {
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread
    pub fn spawn(name: &str) -> Result<Self> {
        let (sender, receiver) = channel::<Task>();

        let handle = Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for task in receiver {
                    task();
                }
            })
            .map_err(|e| Error::BackendError(format!("failed to spawn worker thread: {}", e)))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Submit a closure; its return value is delivered through the handle
    ///
    /// # Errors
    ///
    /// `BackendError` if the queue has been closed.
    pub fn run<R, F>(&self, f: F) -> Result<TaskHandle<R>>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::BackendError("worker queue is closed".to_string()))?;

        let (result_sender, result_receiver) = channel();
        sender
            .send(Box::new(move || {
                // The caller may have dropped the handle; that is fine
                let _ = result_sender.send(f());
            }))
            .map_err(|_| Error::BackendError("worker thread terminated".to_string()))?;

        Ok(TaskHandle {
            receiver: result_receiver,
        })
    }

    /// Close the queue to further submissions
    ///
    /// Tasks already queued (including a long-running render loop) still
    /// run to completion.
    pub fn close(&mut self) {
        self.sender = None;
    }

    /// Close the queue and wait for the thread to finish
    pub fn join(&mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
