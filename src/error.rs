use std::io;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Socket open/bind/send/receive failure, including an interruption
    /// that persisted past the single reopen-and-resend. Fatal to the
    /// current poll; nothing is published.
    #[error("netlink transport failure: {0}")]
    Transport(#[from] io::Error),

    /// The kernel answered a request with an error message.
    #[error("netlink request rejected by kernel: {0}")]
    Kernel(io::Error),
}
