pub mod batch;
pub mod merge;
pub mod scheduler;
pub mod time;
pub mod worker;
