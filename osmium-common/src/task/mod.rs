mod body;
mod handler;
mod model;
mod status;

pub use body::TaskBody;
pub use handler::{FatalTaskHandler, TaskHandler, TaskRegistrator};
pub use model::{Task, TaskHistoryRecord};
pub use status::{DependStatus, TaskStatus};
