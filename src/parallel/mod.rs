pub mod rw_lock;
pub mod work_queue;
pub mod indexer;
