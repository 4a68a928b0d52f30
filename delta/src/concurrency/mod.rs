//! Concurrency primitives shared by the prefix tree builder and background pipelines.
//!
//! [`producer_queue`] drives a worker pool over work that discovers more work, detecting
//! completion when the queue is empty and no worker is busy. [`task_queue`] is a plain
//! producer/consumer pipeline. Both stop every participant on the first failure: the producer
//! queue closes its queue and aborts the remaining workers, while the task queue signals its
//! producer and consumers through [`cancellation`] before aborting them.

pub mod cancellation;
pub mod producer_queue;
pub mod task_queue;
