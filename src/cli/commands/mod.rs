pub mod ask;
pub mod categorize;
pub mod config;
pub mod init;
pub mod serve;
