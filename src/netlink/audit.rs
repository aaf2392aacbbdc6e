//! NETLINK_AUDIT.
//!
//! Enough of the audit control protocol for an audit daemon and for programs
//! that log through it (login, sudo and friends) to work: one daemon can
//! register, its status can be queried, and user messages reach it. There is
//! no rule engine and nothing is ever generated by us.

use crate::{
    abi::{
        audit::{
            audit_features,
            audit_status,
            AUDIT_FEATURE_MASK_ALL,
            AUDIT_FEATURE_VERSION,
            AUDIT_GET,
            AUDIT_GET_FEATURE,
            AUDIT_SET,
            AUDIT_USER,
        },
        netlink::{nlmsghdr, NETLINK_AUDIT},
    },
    context::Context,
    kernel_metadata::{audit_message_type_name, errno_name},
    log::LogLevel::{LogDebug, LogInfo, LogWarn},
    netlink::{
        message::MessageSet,
        NetlinkEndpoint,
        NetlinkEndpointSharedPtr,
        Protocol,
        ProtocolSharedPtr,
    },
};
use libc::pid_t;
use nix::errno::Errno;
use std::sync::{Arc, Mutex, Weak};

/// The audit daemon, as last registered with AUDIT_SET. The endpoint is not
/// kept alive by the registration; once its owner lets go, user messages are
/// dropped until another daemon registers.
#[derive(Clone)]
pub struct AuditDaemonRegistration {
    pub endpoint: Weak<dyn NetlinkEndpoint>,
    pub port_id: u32,
    pub tgid: pid_t,
}

#[derive(Default)]
pub struct AuditProtocol {
    daemon: Mutex<Option<AuditDaemonRegistration>>,
}

pub fn new_protocol() -> ProtocolSharedPtr {
    Arc::new(AuditProtocol::new())
}

impl AuditProtocol {
    pub fn new() -> AuditProtocol {
        Default::default()
    }

    pub fn daemon(&self) -> Option<AuditDaemonRegistration> {
        self.daemon.lock().unwrap().clone()
    }

    fn get_status(&self, ms: &mut MessageSet) {
        let status = match &*self.daemon.lock().unwrap() {
            Some(daemon) => audit_status {
                enabled: 1,
                pid: daemon.tgid as u32,
                ..Default::default()
            },
            None => audit_status::default(),
        };
        ms.add_message(nlmsghdr {
            nlmsg_type: AUDIT_GET,
            ..Default::default()
        })
        .put(&status);
    }

    fn set_daemon(&self, ctx: &Context, endpoint: &NetlinkEndpointSharedPtr) {
        let tgid = ctx.task().tgid;
        let prev = self.daemon.lock().unwrap().replace(AuditDaemonRegistration {
            endpoint: Arc::downgrade(endpoint),
            port_id: endpoint.port_id(),
            tgid,
        });
        match prev {
            Some(prev) if prev.tgid != tgid => log!(
                LogInfo,
                "Audit daemon {} replaced by {} (port {})",
                prev.tgid,
                tgid,
                endpoint.port_id()
            ),
            Some(_) => (),
            None => log!(
                LogInfo,
                "Audit daemon registered: {} (port {})",
                tgid,
                endpoint.port_id()
            ),
        }
    }

    fn forward_user_message(&self, hdr: &nlmsghdr, data: &[u8]) {
        // Don't hold the lock while delivering.
        let (weak, port_id) = match &*self.daemon.lock().unwrap() {
            Some(daemon) => (daemon.endpoint.clone(), daemon.port_id),
            None => {
                log!(LogDebug, "No audit daemon, dropping user message");
                return;
            }
        };
        let endpoint = match weak.upgrade() {
            Some(endpoint) => endpoint,
            None => {
                log!(
                    LogDebug,
                    "Audit daemon at port {} is gone, dropping user message",
                    port_id
                );
                return;
            }
        };
        let mut ms = MessageSet::new(0, hdr.nlmsg_seq);
        ms.add_message(nlmsghdr {
            nlmsg_type: hdr.nlmsg_type,
            nlmsg_flags: hdr.nlmsg_flags,
            ..Default::default()
        })
        .put_bytes(data);
        if let Err(e) = endpoint.publish(ms) {
            log!(
                LogWarn,
                "Could not deliver user message to audit daemon at port {}: {}",
                endpoint.port_id(),
                errno_name(e as i32)
            );
        }
    }

    fn get_features(&self, ms: &mut MessageSet) {
        ms.add_message(nlmsghdr {
            nlmsg_type: AUDIT_GET_FEATURE,
            ..Default::default()
        })
        .put(&audit_features {
            vers: AUDIT_FEATURE_VERSION,
            mask: AUDIT_FEATURE_MASK_ALL,
            features: 0,
            lock: 0,
        });
    }
}

impl Protocol for AuditProtocol {
    fn protocol(&self) -> i32 {
        NETLINK_AUDIT
    }

    fn process_message(
        &self,
        ctx: &mut Context,
        endpoint: &NetlinkEndpointSharedPtr,
        hdr: &nlmsghdr,
        data: &[u8],
        ms: &mut MessageSet,
    ) -> Result<(), Errno> {
        log!(
            LogDebug,
            "{} from {} ({} bytes)",
            audit_message_type_name(hdr.nlmsg_type),
            ctx.task(),
            data.len()
        );
        match hdr.nlmsg_type {
            AUDIT_GET => self.get_status(ms),
            AUDIT_SET => self.set_daemon(ctx, endpoint),
            AUDIT_USER => self.forward_user_message(hdr, data),
            AUDIT_GET_FEATURE => self.get_features(ms),
            _ => return Err(Errno::EOPNOTSUPP),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{
            audit::AUDIT_LIST_RULES,
            netlink::{nlmsgerr, NLMSG_ERROR, NLM_F_ACK, NLM_F_REQUEST},
        },
        core::from_bytes,
        guest_memory::LocalMemory,
        netlink::{
            message::{parse_messages, Message},
            socket::NetlinkSocket,
        },
        task::Task,
        unimpl::CollectingEventSink,
    };

    fn request(type_: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut m = Message::new(nlmsghdr {
            nlmsg_type: type_,
            nlmsg_flags: NLM_F_REQUEST,
            nlmsg_seq: seq,
            ..Default::default()
        });
        m.put_bytes(payload);
        m.encode()
    }

    fn send_as(task: Task, sock: &Arc<NetlinkSocket>, buf: &[u8]) {
        let mut mem = LocalMemory::new();
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(task, &mut mem, &events);
        sock.send(&mut ctx, buf).unwrap();
    }

    fn status(sock: &Arc<NetlinkSocket>) -> audit_status {
        send_as(Task::leader(1), sock, &request(AUDIT_GET, 1, &[]));
        let reply = sock.recv().unwrap();
        let msgs = parse_messages(&reply);
        assert_eq!(1, msgs.len());
        assert_eq!(AUDIT_GET, msgs[0].0.nlmsg_type);
        assert_eq!(56, msgs[0].0.nlmsg_len);
        from_bytes(msgs[0].1).unwrap()
    }

    fn setup() -> (ProtocolSharedPtr, Arc<NetlinkSocket>) {
        let proto = new_protocol();
        let sock = NetlinkSocket::new(100, proto.clone());
        (proto, sock)
    }

    #[test]
    fn disabled_until_a_daemon_registers() {
        let (_, sock) = setup();
        assert_eq!(audit_status::default(), status(&sock));
    }

    #[test]
    fn last_set_wins() {
        let (proto, client) = setup();
        let first = NetlinkSocket::new(200, proto.clone());
        let second = NetlinkSocket::new(300, proto.clone());

        send_as(Task::new(21, 20), &first, &request(AUDIT_SET, 1, &[0u8; 40]));
        let st = status(&client);
        assert_eq!(1, st.enabled);
        assert_eq!(20, st.pid);

        send_as(Task::new(31, 30), &second, &request(AUDIT_SET, 1, &[0u8; 40]));
        let st = status(&client);
        assert_eq!(1, st.enabled);
        assert_eq!(30, st.pid);
        assert_eq!(0, st.failure);
        assert_eq!(0, st.feature_bitmap);

        // SET itself has no reply.
        assert_eq!(0, first.pending());
        assert_eq!(0, second.pending());
    }

    #[test]
    fn user_message_dropped_without_daemon() {
        let (_, sock) = setup();
        send_as(Task::leader(5), &sock, &request(AUDIT_USER, 1, b"op=login"));
        assert_eq!(0, sock.pending());
    }

    #[test]
    fn user_message_forwarded_to_daemon() {
        let (proto, sender) = setup();
        let daemon = NetlinkSocket::new(400, proto.clone());
        send_as(Task::leader(40), &daemon, &request(AUDIT_SET, 1, &[0u8; 40]));

        send_as(Task::leader(5), &sender, &request(AUDIT_USER, 8, b"op=login acct=root"));
        assert_eq!(0, sender.pending());
        let delivered = daemon.recv().unwrap();
        let msgs = parse_messages(&delivered);
        assert_eq!(1, msgs.len());
        assert_eq!(AUDIT_USER, msgs[0].0.nlmsg_type);
        assert_eq!(NLM_F_REQUEST, msgs[0].0.nlmsg_flags);
        assert_eq!(8, msgs[0].0.nlmsg_seq);
        assert_eq!(b"op=login acct=root", msgs[0].1);
        assert!(daemon.recv().is_none());
    }

    #[test]
    fn features() {
        let (_, sock) = setup();
        send_as(Task::leader(1), &sock, &request(AUDIT_GET_FEATURE, 2, &[]));
        let reply = sock.recv().unwrap();
        let (hdr, data) = parse_messages(&reply)[0];
        assert_eq!(AUDIT_GET_FEATURE, hdr.nlmsg_type);
        assert_eq!(2, hdr.nlmsg_seq);
        assert_eq!(
            audit_features {
                vers: 1,
                mask: 0xffff,
                features: 0,
                lock: 0
            },
            from_bytes::<audit_features>(data).unwrap()
        );
    }

    #[test]
    fn unmatched_type_is_not_supported() {
        let (proto, sock) = setup();
        let mut mem = LocalMemory::new();
        let events = CollectingEventSink::new();
        let mut ctx = Context::new(Task::leader(1), &mut mem, &events);
        let endpoint: NetlinkEndpointSharedPtr = sock.clone();
        let mut ms = MessageSet::new(100, 0);
        let hdr = nlmsghdr {
            nlmsg_type: AUDIT_LIST_RULES,
            ..Default::default()
        };
        assert_eq!(
            Err(Errno::EOPNOTSUPP),
            proto.process_message(&mut ctx, &endpoint, &hdr, &[], &mut ms)
        );
        assert!(ms.is_empty());

        // And through the socket.
        send_as(Task::leader(1), &sock, &request(AUDIT_LIST_RULES, 6, &[]));
        let reply = sock.recv().unwrap();
        let (hdr, data) = parse_messages(&reply)[0];
        assert_eq!(NLMSG_ERROR, hdr.nlmsg_type);
        let err: nlmsgerr = from_bytes(data).unwrap();
        assert_eq!(-libc::EOPNOTSUPP, err.error);
        assert_eq!(AUDIT_LIST_RULES, err.msg.nlmsg_type);
        assert_eq!(6, err.msg.nlmsg_seq);
    }

    #[test]
    fn set_with_ack() {
        let (proto, sock) = setup();
        let mut m = Message::new(nlmsghdr {
            nlmsg_type: AUDIT_SET,
            nlmsg_flags: NLM_F_REQUEST | NLM_F_ACK,
            nlmsg_seq: 3,
            ..Default::default()
        });
        m.put(&audit_status::default());
        send_as(Task::leader(9), &sock, &m.encode());
        let ack = sock.recv().unwrap();
        let (hdr, data) = parse_messages(&ack)[0];
        assert_eq!(NLMSG_ERROR, hdr.nlmsg_type);
        assert_eq!(0, from_bytes::<nlmsgerr>(data).unwrap().error);
        assert_eq!(NETLINK_AUDIT, proto.protocol());
    }

    #[test]
    fn replies_carry_no_flags() {
        let (_, sock) = setup();
        for (i, &type_) in [AUDIT_GET, AUDIT_GET_FEATURE].iter().enumerate() {
            let buf = Message::new(nlmsghdr {
                nlmsg_type: type_,
                nlmsg_flags: NLM_F_REQUEST | NLM_F_ACK,
                nlmsg_seq: i as u32,
                ..Default::default()
            })
            .encode();
            send_as(Task::leader(1), &sock, &buf);
            let reply = sock.recv().unwrap();
            let (hdr, _) = parse_messages(&reply)[0];
            assert_eq!(type_, hdr.nlmsg_type);
            assert_eq!(0, hdr.nlmsg_flags);
            // The ack.
            assert_eq!(1, sock.pending());
            sock.recv().unwrap();
        }
    }

    #[test]
    fn user_message_dropped_after_daemon_goes_away() {
        let (proto, sender) = setup();
        let daemon = NetlinkSocket::new(500, proto.clone());
        send_as(Task::leader(50), &daemon, &request(AUDIT_SET, 1, &[0u8; 40]));
        let weak = Arc::downgrade(&daemon);
        drop(daemon);
        assert!(weak.upgrade().is_none());

        for seq in 0..10 {
            send_as(Task::leader(5), &sender, &request(AUDIT_USER, seq, b"op=login"));
        }
        assert_eq!(0, sender.pending());
        // Still registered until someone else sets.
        let st = status(&sender);
        assert_eq!(1, st.enabled);
        assert_eq!(50, st.pid);
    }

    #[test]
    fn registration_is_shared_across_sockets() {
        let proto = AuditProtocol::new();
        assert!(proto.daemon().is_none());
        let proto: ProtocolSharedPtr = Arc::new(proto);
        let a = NetlinkSocket::new(1, proto.clone());
        let b = NetlinkSocket::new(2, proto.clone());
        send_as(Task::leader(77), &a, &request(AUDIT_SET, 1, &[]));
        assert_eq!(77, status(&b).pid);
    }
}
