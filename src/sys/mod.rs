pub mod config;
pub mod deps;
pub mod logging;
pub mod requirements;
pub mod store;
pub mod yt;
