#![forbid(unsafe_code)]

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod export;
pub mod identify;
pub mod library;
pub mod logging;
pub mod openai;
pub mod scan;
