use crate::{
    guest_memory::GuestMemory,
    task::Task,
    unimpl::{EventSink, UnimplementedEvent},
};

/// Everything a device or protocol handler may consult about the request
/// it is serving: who is asking, their memory, and where diagnostics go.
pub struct Context<'a> {
    task: Task,
    mem: &'a mut dyn GuestMemory,
    events: &'a dyn EventSink,
}

impl<'a> Context<'a> {
    pub fn new(task: Task, mem: &'a mut dyn GuestMemory, events: &'a dyn EventSink) -> Self {
        Context { task, mem, events }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn mem(&mut self) -> &mut dyn GuestMemory {
        &mut *self.mem
    }

    pub fn emit_unimplemented_event(&self, event: UnimplementedEvent) {
        self.events.emit(&event);
    }
}
