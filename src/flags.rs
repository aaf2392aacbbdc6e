use std::sync::RwLock;

lazy_static! {
    static ref FLAGS: RwLock<Flags> = RwLock::new(Flags::default());
}

/// Process wide knobs. The binary fills these in from the command line;
/// library users and tests get the defaults.
#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct Flags {
    /// Any unimplemented-feature event aborts the process. Handy when
    /// bringing up a new guest to find out what it actually needs.
    pub fatal_unimplemented: bool,
    /// Don't log unimplemented-feature events. They are still delivered to
    /// the event sink.
    pub suppress_unimplemented_warnings: bool,
}

impl Flags {
    pub fn get() -> Flags {
        match FLAGS.read() {
            Ok(flags) => flags.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(flags: Flags) {
        match FLAGS.write() {
            Ok(mut f) => *f = flags,
            Err(poisoned) => *poisoned.into_inner() = flags,
        }
    }
}
