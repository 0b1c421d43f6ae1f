pub mod review_consumer;
pub mod review_producer;
