pub mod check;
pub mod config;
pub mod discovery;
pub mod parser;
pub mod report;
pub mod version;
