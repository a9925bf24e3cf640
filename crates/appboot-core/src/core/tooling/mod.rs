pub mod log;
pub mod outcome;

pub use log::BootLog;
