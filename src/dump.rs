use std::io;

use netlink_packet_core::{
    NetlinkBuffer, NetlinkDeserializable, NetlinkMessage, NetlinkPayload, NetlinkSerializable,
};

use crate::error::Error;
use crate::session::Conn;

const RECV_BUFFER_LEN: usize = 32 * 1024;

/// Decoder verdict for one inner message of a streamed reply.
pub(crate) enum Decoded<D> {
    Keep(D),
    Skip,
    /// Keep this item and stop draining; any remaining messages of the dump
    /// are discarded as stale replies by the next exchange.
    Stop(D),
}

#[derive(Debug)]
pub(crate) enum DumpError {
    /// A blocking call was interrupted; the request may be retried once
    /// after reopening the connection.
    Interrupted,
    Transport(io::Error),
    /// The kernel embedded an error message in the reply stream.
    Kernel(io::Error),
}

impl DumpError {
    fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::Transport(err)
        }
    }

    pub(crate) fn into_fatal(self) -> Error {
        match self {
            Self::Interrupted => Error::Transport(io::ErrorKind::Interrupted.into()),
            Self::Transport(err) => Error::Transport(err),
            Self::Kernel(err) => Error::Kernel(err),
        }
    }
}

/// Send one request and drain its streamed reply, handing every validated
/// inner message to `decode`. Draining ends on the kernel's end-of-dump
/// marker (or an ACK for non-dump exchanges), on a decoder stop, or on an
/// embedded kernel error. Replies that fail validation abort only
/// themselves; replies from other sequence numbers or ports are skipped.
pub(crate) fn execute<T, D, F>(
    conn: &mut Conn,
    mut request: NetlinkMessage<T>,
    mut decode: F,
) -> Result<Vec<D>, DumpError>
where
    T: NetlinkSerializable + NetlinkDeserializable,
    F: FnMut(T) -> Decoded<D>,
{
    let seq = conn.next_seq();
    request.header.sequence_number = seq;
    request.header.port_number = conn.port_number();
    request.finalize();

    let mut out = vec![0u8; request.header.length as usize];
    request.serialize(&mut out[..]);
    conn.send(&out).map_err(DumpError::from_io)?;

    let mut items = Vec::new();
    let mut rx = vec![0u8; RECV_BUFFER_LEN];
    loop {
        let size = conn.recv(&mut rx).map_err(DumpError::from_io)?;
        if size == 0 {
            return Ok(items);
        }

        let mut offset = 0;
        while offset < size {
            let bytes = &rx[offset..size];
            let frame = match NetlinkBuffer::new_checked(bytes) {
                Ok(frame) => frame,
                Err(err) => {
                    // Framing is gone; the rest of this datagram cannot be
                    // resynchronized. Later datagrams are unaffected.
                    log::warn!("dropping undecodable netlink frame: {}", err);
                    break;
                }
            };
            let length = frame.length() as usize;
            if length == 0 || length > bytes.len() {
                log::warn!("dropping netlink frame with bogus length {}", length);
                break;
            }
            if frame.sequence_number() != seq || frame.port_number() != conn.port_number() {
                log::debug!(
                    "skipping stale netlink message (seq {}, port {})",
                    frame.sequence_number(),
                    frame.port_number(),
                );
                offset += aligned(length);
                continue;
            }

            match NetlinkMessage::<T>::deserialize(&bytes[..length]) {
                Err(err) => log::warn!("dropping malformed netlink message: {}", err),
                Ok(message) => match message.payload {
                    NetlinkPayload::Done(_) => return Ok(items),
                    NetlinkPayload::Error(err) => {
                        // Code zero is the ACK terminating a non-dump
                        // exchange.
                        return if err.code.is_none() {
                            Ok(items)
                        } else {
                            Err(DumpError::Kernel(err.to_io()))
                        };
                    }
                    NetlinkPayload::InnerMessage(inner) => match decode(inner) {
                        Decoded::Keep(item) => items.push(item),
                        Decoded::Skip => {}
                        Decoded::Stop(item) => {
                            items.push(item);
                            return Ok(items);
                        }
                    },
                    _ => {}
                },
            }
            offset += aligned(length);
        }
    }
}

fn aligned(length: usize) -> usize {
    (length + 3) & !3
}
