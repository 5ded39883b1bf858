use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use netlink_packet_core::{NetlinkDeserializable, NetlinkMessage, NetlinkSerializable};
use netlink_sys::protocols::{NETLINK_GENERIC, NETLINK_ROUTE};
use netlink_sys::{Socket, SocketAddr};

use crate::dump::{self, Decoded, DumpError};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Route,
    Generic,
}

impl Family {
    fn protocol(self) -> isize {
        match self {
            Self::Route => NETLINK_ROUTE,
            Self::Generic => NETLINK_GENERIC,
        }
    }
}

/// One bound netlink socket plus the sequence counter for its family.
pub(crate) struct Conn {
    socket: Socket,
    port_number: u32,
    seq: u32,
}

impl Conn {
    pub(crate) fn open(family: Family) -> io::Result<Self> {
        let mut socket = Socket::new(family.protocol())?;
        let addr = socket.bind_auto()?;
        socket.connect(&SocketAddr::new(0, 0))?;
        Ok(Self {
            socket,
            port_number: addr.port_number(),
            seq: seq_baseline(),
        })
    }

    pub(crate) fn port_number(&self) -> u32 {
        self.port_number
    }

    pub(crate) fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    pub(crate) fn send(&self, buffer: &[u8]) -> io::Result<()> {
        self.socket.send(buffer, 0).map(|_| ())
    }

    pub(crate) fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(&mut &mut buffer[..], 0)
    }
}

/// The two long-lived kernel connections this subsystem owns.
pub(crate) struct Session {
    route: Conn,
    generic: Conn,
}

impl Session {
    pub(crate) fn open() -> Result<Self, Error> {
        Ok(Self {
            route: Conn::open(Family::Route)?,
            generic: Conn::open(Family::Generic)?,
        })
    }

    /// Replace one family's connection. The fresh sequence baseline keeps
    /// replies to the old socket's in-flight requests from matching.
    pub(crate) fn reopen(&mut self, family: Family) -> Result<(), Error> {
        let slot = self.conn_mut(family);
        *slot = Conn::open(family)?;
        Ok(())
    }

    fn conn_mut(&mut self, family: Family) -> &mut Conn {
        match family {
            Family::Route => &mut self.route,
            Family::Generic => &mut self.generic,
        }
    }

    /// Run one dump request to completion, applying the reopen-once retry
    /// policy on an interrupted exchange.
    pub(crate) fn dump<T, D, F>(
        &mut self,
        family: Family,
        request: NetlinkMessage<T>,
        mut decode: F,
    ) -> Result<Vec<D>, Error>
    where
        T: NetlinkSerializable + NetlinkDeserializable + Clone,
        F: FnMut(T) -> Decoded<D>,
    {
        with_single_retry(
            self,
            |session| dump::execute(session.conn_mut(family), request.clone(), &mut decode),
            |session| session.reopen(family),
        )
    }
}

/// Retry policy for interrupted blocking exchanges: reopen the owning
/// connection exactly once and resubmit the identical request. Anything
/// beyond that surfaces as a transport failure; dumps are stateless, so the
/// resubmitted request starts from an empty accumulator.
pub(crate) fn with_single_retry<S, D>(
    state: &mut S,
    mut attempt: impl FnMut(&mut S) -> Result<Vec<D>, DumpError>,
    mut reopen: impl FnMut(&mut S) -> Result<(), Error>,
) -> Result<Vec<D>, Error> {
    match attempt(state) {
        Ok(items) => Ok(items),
        Err(DumpError::Interrupted) => {
            reopen(state)?;
            match attempt(state) {
                Ok(items) => Ok(items),
                Err(DumpError::Interrupted) => {
                    Err(Error::Transport(io::ErrorKind::Interrupted.into()))
                }
                Err(err) => Err(err.into_fatal()),
            }
        }
        Err(err) => Err(err.into_fatal()),
    }
}

fn seq_baseline() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}
