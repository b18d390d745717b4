pub mod baseline;
pub mod cache;
pub mod config;
pub mod factor;
pub mod footprint;
pub mod region;
pub mod storage;

pub mod errors;
