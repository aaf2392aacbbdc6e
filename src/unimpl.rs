//! "Unimplemented feature" diagnostics.
//!
//! When a guest asks for something that has no emulation we fail the
//! request, and we also tell whoever is watching so that missing features
//! can be found without a debugger.

use crate::{
    flags::Flags,
    kernel_metadata::ioctl_name,
    log::LogLevel::LogWarn,
    remote_ptr::{RemotePtr, Void},
    task::Task,
};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct UnimplementedEvent {
    pub tid: i32,
    pub tgid: i32,
    /// Syscall number on the native arch.
    pub sysno: i64,
    pub args: [u64; 3],
    pub what: String,
}

impl UnimplementedEvent {
    pub fn ioctl(task: Task, fd: i32, cmd: u32, arg: RemotePtr<Void>, device: &str) -> Self {
        UnimplementedEvent {
            tid: task.tid,
            tgid: task.tgid,
            sysno: libc::SYS_ioctl as i64,
            args: [fd as u64, cmd as u64, arg.as_usize() as u64],
            what: format!("{} on {}", ioctl_name(cmd), device),
        }
    }
}

pub trait EventSink {
    fn emit(&self, event: &UnimplementedEvent);
}

/// Logs every event. This is what a runtime without its own event stream
/// would use.
#[derive(Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &UnimplementedEvent) {
        report(event);
    }
}

/// Remembers every event; also logs them like `LogEventSink`.
#[derive(Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<UnimplementedEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> CollectingEventSink {
        Default::default()
    }

    pub fn events(&self) -> Vec<UnimplementedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &UnimplementedEvent) {
        report(event);
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

fn report(event: &UnimplementedEvent) {
    let flags = Flags::get();
    if flags.fatal_unimplemented {
        fatal!(
            "Unimplemented feature requested by task {}: {}",
            Task::new(event.tid, event.tgid),
            event.what
        );
    }
    if !flags.suppress_unimplemented_warnings {
        log!(
            LogWarn,
            "Unimplemented feature requested by task {}: {} (sysno {}, args {:#x?})",
            Task::new(event.tid, event.tgid),
            event.what,
            event.sysno,
            event.args
        );
    }
}
