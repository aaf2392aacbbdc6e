//! A netlink socket that lives entirely in this process.

use crate::{
    abi::netlink::{nlmsgerr, nlmsghdr, NLMSG_ERROR, NLMSG_MIN_TYPE, NLM_F_ACK, NLM_F_REQUEST},
    context::Context,
    kernel_metadata::errno_name,
    log::LogLevel::{LogDebug, LogWarn},
    netlink::{
        message::{parse_messages, MessageSet},
        protocol_for,
        NetlinkEndpoint,
        NetlinkEndpointSharedPtr,
        ProtocolSharedPtr,
    },
};
use nix::errno::Errno;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

pub struct NetlinkSocket {
    port_id: u32,
    protocol: ProtocolSharedPtr,
    /// Datagrams waiting to be received, oldest first.
    recv_queue: Mutex<VecDeque<Vec<u8>>>,
}

impl NetlinkSocket {
    pub fn new(port_id: u32, protocol: ProtocolSharedPtr) -> Arc<NetlinkSocket> {
        Arc::new(NetlinkSocket {
            port_id,
            protocol,
            recv_queue: Mutex::new(VecDeque::new()),
        })
    }

    /// socket(AF_NETLINK, SOCK_RAW, family), bound to `port_id`.
    pub fn open(family: i32, port_id: u32) -> Result<Arc<NetlinkSocket>, Errno> {
        Ok(NetlinkSocket::new(port_id, protocol_for(family)?))
    }

    pub fn protocol(&self) -> &ProtocolSharedPtr {
        &self.protocol
    }

    /// Process every message in `buf`. Failures are reported to the sender
    /// through the receive queue; the send itself only fails for buffers
    /// that contain no message at all.
    pub fn send(self: &Arc<Self>, ctx: &mut Context, buf: &[u8]) -> Result<usize, Errno> {
        if is_logging!(LogDebug) {
            log!(LogDebug, "port {} <- {:02x?}", self.port_id, buf);
        }
        let msgs = parse_messages(buf);
        if msgs.is_empty() {
            return Err(Errno::EINVAL);
        }
        let endpoint: NetlinkEndpointSharedPtr = self.clone();
        for (hdr, data) in msgs {
            // Only requests reach the protocol; everything else may still be
            // acked.
            if hdr.nlmsg_flags & NLM_F_REQUEST == 0 || hdr.nlmsg_type < NLMSG_MIN_TYPE {
                log!(
                    LogDebug,
                    "Not processing message type {} flags {:#x}",
                    hdr.nlmsg_type,
                    hdr.nlmsg_flags
                );
                if hdr.nlmsg_flags & NLM_F_ACK != 0 {
                    self.send_error(&hdr, 0);
                }
                continue;
            }
            let mut ms = MessageSet::new(self.port_id, hdr.nlmsg_seq);
            match self
                .protocol
                .process_message(ctx, &endpoint, &hdr, data, &mut ms)
            {
                Ok(()) => {
                    if !ms.is_empty() {
                        self.enqueue(ms.encode());
                    }
                    if hdr.nlmsg_flags & NLM_F_ACK != 0 {
                        self.send_error(&hdr, 0);
                    }
                }
                Err(e) => {
                    log!(
                        LogWarn,
                        "Netlink message type {} from {} failed with {}",
                        hdr.nlmsg_type,
                        ctx.task(),
                        errno_name(e as i32)
                    );
                    self.send_error(&hdr, -(e as i32));
                }
            }
        }
        Ok(buf.len())
    }

    /// An error of 0 is an ack.
    fn send_error(&self, hdr: &nlmsghdr, error: i32) {
        let mut ms = MessageSet::new(self.port_id, hdr.nlmsg_seq);
        ms.add_message(nlmsghdr {
            nlmsg_type: NLMSG_ERROR,
            ..Default::default()
        })
        .put(&nlmsgerr { error, msg: *hdr });
        self.enqueue(ms.encode());
    }

    fn enqueue(&self, datagram: Vec<u8>) {
        self.recv_queue.lock().unwrap().push_back(datagram);
    }

    pub fn recv(&self) -> Option<Vec<u8>> {
        self.recv_queue.lock().unwrap().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.recv_queue.lock().unwrap().len()
    }
}

impl NetlinkEndpoint for NetlinkSocket {
    fn port_id(&self) -> u32 {
        self.port_id
    }

    fn publish(&self, ms: MessageSet) -> Result<(), Errno> {
        if ms.is_empty() {
            return Ok(());
        }
        self.enqueue(ms.encode());
        Ok(())
    }
}
