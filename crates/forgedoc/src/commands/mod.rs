pub mod build;
pub mod dev;
pub mod expand;
pub mod init;
pub mod serve;
