//! Input debouncing and the worker / timer threads.

pub mod debounce;
pub mod worker_pool;
