pub mod config;
pub mod error;
pub mod intake;
pub mod models;
pub mod naming;
pub mod notify;
pub mod routes;
pub mod s3;
pub mod state;
pub mod storage;
pub mod summary;
