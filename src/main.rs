use kcompat::{
    commands::{
        exit_result::ExitResult,
        kcompat_options::{KcompatOptions, KcompatSubCommand},
        layout_command::LayoutCommand,
        probe_command::ProbeCommand,
        KcompatCommand,
    },
    flags::Flags,
};
use std::process::exit;
use structopt::StructOpt;

fn run(options: &KcompatOptions) -> ExitResult<()> {
    Flags::set(options.flags());

    let res = match &options.cmd {
        KcompatSubCommand::Layout { json } => LayoutCommand::new(*json).run(),
        KcompatSubCommand::Probe { json, mmap_length } => {
            ProbeCommand::new(*json, *mmap_length).run()
        }
    };
    res.into()
}

fn main() {
    let options = KcompatOptions::from_args();
    exit(run(&options).report());
}
