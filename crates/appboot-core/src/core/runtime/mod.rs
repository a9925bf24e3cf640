pub mod command;
pub mod effects;
pub mod process;
pub mod traceback;

pub use command::CommandSpec;
pub use process::RunOutput;
