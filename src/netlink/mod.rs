//! Netlink protocols handled inside the sandbox.
//!
//! A socket of family N hands every request to the provider registered for
//! N. There is one provider instance per family, so state a protocol keeps
//! (like the audit daemon) is shared by every socket of that family.

use crate::{
    abi::netlink::{nlmsghdr, NETLINK_AUDIT},
    context::Context,
    log::LogLevel::LogDebug,
};
use message::MessageSet;
use nix::errno::Errno;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub mod audit;
pub mod message;
pub mod socket;

pub type ProtocolSharedPtr = Arc<dyn Protocol>;
pub type NetlinkEndpointSharedPtr = Arc<dyn NetlinkEndpoint>;

pub trait Protocol: Send + Sync {
    /// The netlink family this handles.
    fn protocol(&self) -> i32;

    /// Handle one inbound message from `endpoint`. Replies go in `ms`.
    /// An error is reported back to the sender as NLMSG_ERROR.
    fn process_message(
        &self,
        ctx: &mut Context,
        endpoint: &NetlinkEndpointSharedPtr,
        hdr: &nlmsghdr,
        data: &[u8],
        ms: &mut MessageSet,
    ) -> Result<(), Errno>;
}

/// Something a protocol can deliver unsolicited messages to.
pub trait NetlinkEndpoint: Send + Sync {
    fn port_id(&self) -> u32;

    fn publish(&self, ms: MessageSet) -> Result<(), Errno>;
}

lazy_static! {
    static ref PROVIDERS: Mutex<HashMap<i32, ProtocolSharedPtr>> = {
        let mut providers: HashMap<i32, ProtocolSharedPtr> = HashMap::new();
        providers.insert(NETLINK_AUDIT, audit::new_protocol());
        Mutex::new(providers)
    };
}

pub fn register_provider(protocol: ProtocolSharedPtr) -> Result<(), Errno> {
    let family = protocol.protocol();
    let mut providers = PROVIDERS.lock().unwrap();
    if providers.contains_key(&family) {
        return Err(Errno::EEXIST);
    }
    log!(LogDebug, "Registered netlink provider for family {}", family);
    providers.insert(family, protocol);
    Ok(())
}

pub fn protocol_for(family: i32) -> Result<ProtocolSharedPtr, Errno> {
    PROVIDERS
        .lock()
        .unwrap()
        .get(&family)
        .cloned()
        .ok_or(Errno::EPROTONOSUPPORT)
}
