pub mod approval;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod notify;
pub mod stage_api;
pub mod storage;
pub mod timeline;
