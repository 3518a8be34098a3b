pub mod dev;
pub mod serve;
