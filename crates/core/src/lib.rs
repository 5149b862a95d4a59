pub mod aggregate;
pub mod application;
pub mod domain;
pub mod ports;
pub mod query;
pub mod utils;
