pub mod queue;
pub mod store;

pub use queue::FileQueue;
pub use store::{Admission, LockInfo, LockStore, QueueInfo};
