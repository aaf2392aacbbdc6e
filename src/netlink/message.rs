//! Building and splitting netlink datagrams.

use crate::{
    abi::netlink::{nlmsg_align, nlmsghdr, NLMSG_DONE, NLMSG_HDRLEN, NLM_F_MULTI},
    core::{as_bytes, from_bytes},
};
use std::mem::size_of;

/// One outbound message. The length field is filled in by `encode`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub hdr: nlmsghdr,
    payload: Vec<u8>,
}

impl Message {
    pub fn new(hdr: nlmsghdr) -> Message {
        Message {
            hdr,
            payload: Vec::new(),
        }
    }

    /// Append the ABI encoding of `val`, starting at netlink alignment.
    pub fn put<T: Copy + 'static>(&mut self, val: &T) {
        self.put_bytes(as_bytes(val));
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        let aligned = nlmsg_align(self.payload.len());
        self.payload.resize(aligned, 0);
        self.payload.extend_from_slice(bytes);
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Value of `nlmsg_len`. Trailing alignment padding is not counted.
    pub fn encoded_len(&self) -> usize {
        NLMSG_HDRLEN + self.payload.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut hdr = self.hdr;
        hdr.nlmsg_len = self.encoded_len() as u32;
        let mut buf = Vec::with_capacity(nlmsg_align(self.encoded_len()));
        buf.extend_from_slice(as_bytes(&hdr));
        buf.extend_from_slice(&self.payload);
        buf.resize(nlmsg_align(self.encoded_len()), 0);
        buf
    }
}

/// The messages a protocol produces in answer to one request.
#[derive(Clone, Debug, Default)]
pub struct MessageSet {
    /// Destination port; stamped on every message.
    pub port_id: u32,
    /// Sequence number of the request being answered.
    pub seq: u32,
    /// Reply is a multi-part dump terminated by NLMSG_DONE.
    pub multi: bool,
    messages: Vec<Message>,
}

impl MessageSet {
    pub fn new(port_id: u32, seq: u32) -> MessageSet {
        MessageSet {
            port_id,
            seq,
            multi: false,
            messages: Vec::new(),
        }
    }

    /// Start a new message. The caller supplies type and flags; sequence
    /// number and port come from the set.
    pub fn add_message(&mut self, mut hdr: nlmsghdr) -> &mut Message {
        hdr.nlmsg_seq = self.seq;
        hdr.nlmsg_pid = self.port_id;
        if self.multi {
            hdr.nlmsg_flags |= NLM_F_MULTI;
        }
        self.messages.push(Message::new(hdr));
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// All messages as a single datagram.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for m in &self.messages {
            buf.extend_from_slice(&m.encode());
        }
        if self.multi && !self.messages.is_empty() {
            let done = Message::new(nlmsghdr {
                nlmsg_type: NLMSG_DONE,
                nlmsg_flags: NLM_F_MULTI,
                nlmsg_seq: self.seq,
                nlmsg_pid: self.port_id,
                ..Default::default()
            });
            buf.extend_from_slice(&done.encode());
        }
        buf
    }
}

/// Split a datagram into (header, payload) pairs. Stops at the first
/// truncated or malformed message, like the kernel's `nlmsg_ok` loop.
pub fn parse_messages(mut buf: &[u8]) -> Vec<(nlmsghdr, &[u8])> {
    let mut out = Vec::new();
    while buf.len() >= size_of::<nlmsghdr>() {
        let hdr = match from_bytes::<nlmsghdr>(buf) {
            Some(hdr) => hdr,
            None => break,
        };
        let len = hdr.nlmsg_len as usize;
        if len < NLMSG_HDRLEN || len > buf.len() {
            break;
        }
        out.push((hdr, &buf[NLMSG_HDRLEN..len]));
        let next = nlmsg_align(len);
        if next >= buf.len() {
            break;
        }
        buf = &buf[next..];
    }
    out
}
