pub mod queues;
pub mod store;
