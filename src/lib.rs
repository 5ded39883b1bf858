mod dump;
mod ie;
mod link;
mod session;
mod wifi;

pub mod error;
pub mod nl80211;
pub mod table;

pub use error::Error;
pub use table::{Interface, InterfaceTable, SignalTier, signal_quality};

use session::Session;

/// Owner of the two kernel connections. Opened once, then polled by the
/// caller's timer; every poll yields a freshly built table or an error,
/// never a partial snapshot.
pub struct NetMonitor {
    session: Session,
    wifi_family: Option<u16>,
}

impl NetMonitor {
    /// Open both netlink connections and resolve the wireless family id.
    /// A kernel without nl80211 still yields a working monitor; only the
    /// wireless fields stay empty.
    pub fn open() -> Result<Self, Error> {
        let mut session = Session::open()?;
        let wifi_family = wifi::resolve_family(&mut session)?;
        Ok(Self {
            session,
            wifi_family,
        })
    }

    pub fn wifi_available(&self) -> bool {
        self.wifi_family.is_some()
    }

    /// Run one full poll: enumerate links and addresses, classify wireless
    /// interfaces, then annotate them with SSID and signal.
    pub fn poll(&mut self) -> Result<InterfaceTable, Error> {
        let mut table = link::enumerate(&mut self.session)?;
        if let Some(family_id) = self.wifi_family {
            wifi::classify(&mut self.session, family_id, &mut table)?;
            wifi::annotate(&mut self.session, family_id, &mut table)?;
        }
        Ok(table)
    }
}
