pub mod aggregator;
pub mod dedup;
pub mod matcher;
pub mod normalizer;
pub mod writer;
