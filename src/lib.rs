// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod source;
pub mod status;
pub mod worker;
