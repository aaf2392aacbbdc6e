use std::io;

pub mod exit_result;
pub mod kcompat_options;
pub mod layout_command;
pub mod probe_command;

pub trait KcompatCommand {
    fn run(&mut self) -> io::Result<()>;
}
