mod task;

pub use task::{DbTaskStatus, Task};
