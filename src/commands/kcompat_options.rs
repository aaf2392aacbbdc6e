use crate::flags::Flags;
use structopt::{clap::AppSettings, StructOpt};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kcompat",
    about = "Kernel ABI emulation for sandboxed programs: audit netlink and virtual devices",
    after_help = "Use KCOMPAT_LOG to control logging; e.g. KCOMPAT_LOG=all:warn,audit:debug"
)]
#[structopt(global_settings = &[AppSettings::UnifiedHelpMessage])]
pub struct KcompatOptions {
    #[structopt(
        short = "E",
        long,
        help = "Abort as soon as a guest asks for something that is not emulated."
    )]
    pub fatal_unimplemented: bool,

    #[structopt(
        short = "S",
        long,
        help = "Don't warn about requests for features that are not emulated."
    )]
    pub suppress_unimplemented_warnings: bool,

    #[structopt(subcommand)]
    pub cmd: KcompatSubCommand,
}

#[derive(Clone, Debug, StructOpt)]
pub enum KcompatSubCommand {
    /// Print the ioctl numbers, audit message codes and structure layouts
    /// that are presented to guests.
    #[structopt(name = "layout")]
    Layout {
        /// Print as JSON.
        #[structopt(long)]
        json: bool,
    },

    /// Open the virtual devices and an audit socket in-process, issue the
    /// requests a guest would, and print what came back.
    #[structopt(name = "probe")]
    Probe {
        /// Print as JSON.
        #[structopt(long)]
        json: bool,

        /// Length to request when mapping the framebuffer.
        #[structopt(long, default_value = "4096")]
        mmap_length: u64,
    },
}

impl KcompatOptions {
    pub fn flags(&self) -> Flags {
        Flags {
            fatal_unimplemented: self.fatal_unimplemented,
            suppress_unimplemented_warnings: self.suppress_unimplemented_warnings,
        }
    }
}
