pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;

pub use error::AppError;
pub use model::{Filter, Task, TaskId};
pub use store::{EditOutcome, EditState, StoreWarning, TaskStore};
