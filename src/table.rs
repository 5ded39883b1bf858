use std::borrow::Cow;

const QUALITY_HIGH_THRESH: u8 = 66;
const QUALITY_LOW_THRESH: u8 = 33;

/// One network device as seen by the current poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub if_index: u32,
    pub if_name: String,
    pub has_addr: bool,
    pub is_wifi: bool,
    pub signal_dbm: Option<i8>,
    /// Raw SSID bytes; possibly empty for a hidden network.
    pub ssid: Option<Vec<u8>>,
}

impl Interface {
    fn new(if_index: u32, if_name: String) -> Self {
        Self {
            if_index,
            if_name,
            has_addr: false,
            is_wifi: false,
            signal_dbm: None,
            ssid: None,
        }
    }

    pub fn signal_quality(&self) -> Option<u8> {
        self.signal_dbm.map(signal_quality)
    }

    pub fn signal_tier(&self) -> Option<SignalTier> {
        self.signal_quality().map(SignalTier::from_quality)
    }

    /// SSID with invalid UTF-8 replaced, for display purposes.
    pub fn ssid_lossy(&self) -> Option<Cow<'_, str>> {
        self.ssid.as_deref().map(String::from_utf8_lossy)
    }
}

/// Convert a station signal in dBm into a 0-100 link quality.
pub fn signal_quality(dbm: i8) -> u8 {
    let clamped = i32::from(dbm.clamp(-100, -50));
    (2 * (clamped + 100)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalTier {
    Low,
    Medium,
    High,
}

impl SignalTier {
    pub fn from_quality(quality: u8) -> Self {
        if quality >= QUALITY_HIGH_THRESH {
            Self::High
        } else if quality >= QUALITY_LOW_THRESH {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// The finished snapshot of one poll. Entries keep the order in which the
/// link dump reported them; annotation passes never reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceTable {
    entries: Vec<Interface>,
}

impl InterfaceTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_link(&mut self, if_index: u32, if_name: String) {
        if self.entry_mut(if_index).is_some() {
            return;
        }
        self.entries.push(Interface::new(if_index, if_name));
    }

    pub(crate) fn mark_addr(&mut self, if_index: u32) {
        if let Some(entry) = self.entry_mut(if_index) {
            entry.has_addr = true;
        }
    }

    pub(crate) fn mark_wifi(&mut self, if_index: u32) {
        if let Some(entry) = self.entry_mut(if_index) {
            entry.is_wifi = true;
        }
    }

    pub(crate) fn set_ssid(&mut self, if_index: u32, ssid: Option<Vec<u8>>) {
        if let Some(entry) = self.entry_mut(if_index) {
            entry.ssid = ssid;
        }
    }

    pub(crate) fn set_signal(&mut self, if_index: u32, signal_dbm: Option<i8>) {
        if let Some(entry) = self.entry_mut(if_index) {
            entry.signal_dbm = signal_dbm;
        }
    }

    pub(crate) fn wifi_indices(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| entry.is_wifi)
            .map(|entry| entry.if_index)
            .collect()
    }

    fn entry_mut(&mut self, if_index: u32) -> Option<&mut Interface> {
        self.entries
            .iter_mut()
            .find(|entry| entry.if_index == if_index)
    }

    pub fn get(&self, if_index: u32) -> Option<&Interface> {
        self.entries.iter().find(|entry| entry.if_index == if_index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interface> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a InterfaceTable {
    type Item = &'a Interface;
    type IntoIter = std::slice::Iter<'a, Interface>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(names: &[(u32, &str)]) -> InterfaceTable {
        let mut table = InterfaceTable::new();
        for (if_index, if_name) in names {
            table.push_link(*if_index, (*if_name).to_owned());
        }
        table
    }

    #[test]
    fn order_follows_first_seen() {
        let mut table = table_of(&[(3, "wlan0"), (2, "eth0"), (7, "wg0")]);
        table.mark_wifi(3);
        table.mark_addr(2);
        table.set_signal(3, Some(-55));
        let order: Vec<_> = table.iter().map(|i| i.if_index).collect();
        assert_eq!(order, vec![3, 2, 7]);
    }

    #[test]
    fn duplicate_index_keeps_first_record() {
        let table = table_of(&[(2, "eth0"), (2, "eth0-renamed")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(2).unwrap().if_name, "eth0");
    }

    #[test]
    fn addr_marking_is_idempotent_and_scoped() {
        let mut table = table_of(&[(2, "eth0"), (3, "wlan0")]);
        table.mark_addr(3);
        table.mark_addr(3);
        table.mark_addr(99); // no matching entry, ignored
        assert!(!table.get(2).unwrap().has_addr);
        assert!(table.get(3).unwrap().has_addr);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn wifi_marking_only_touches_known_entries() {
        let mut table = table_of(&[(2, "eth0"), (3, "wlan0")]);
        table.mark_wifi(3);
        table.mark_wifi(42);
        assert!(table.get(3).unwrap().is_wifi);
        assert!(!table.get(2).unwrap().is_wifi);
    }

    #[test]
    fn unresolved_wireless_leaves_defaults() {
        // Link enumeration alone must leave every wireless field empty.
        let table = table_of(&[(2, "eth0"), (3, "wlan0")]);
        for entry in &table {
            assert!(!entry.is_wifi);
            assert_eq!(entry.signal_dbm, None);
            assert_eq!(entry.ssid, None);
        }
    }

    #[test]
    fn quality_clamps_and_scales() {
        assert_eq!(signal_quality(-40), 100);
        assert_eq!(signal_quality(-50), 100);
        assert_eq!(signal_quality(-67), 66);
        assert_eq!(signal_quality(-100), 0);
        assert_eq!(signal_quality(-128), 0);
    }

    #[test]
    fn tier_thresholds_are_inclusive_on_the_high_side() {
        assert_eq!(SignalTier::from_quality(100), SignalTier::High);
        assert_eq!(SignalTier::from_quality(66), SignalTier::High);
        assert_eq!(SignalTier::from_quality(65), SignalTier::Medium);
        assert_eq!(SignalTier::from_quality(33), SignalTier::Medium);
        assert_eq!(SignalTier::from_quality(32), SignalTier::Low);
        assert_eq!(SignalTier::from_quality(0), SignalTier::Low);
    }

    #[test]
    fn interface_tier_comes_from_its_signal() {
        let mut table = table_of(&[(3, "wlan0")]);
        table.mark_wifi(3);
        table.set_signal(3, Some(-40));
        let entry = table.get(3).unwrap();
        assert_eq!(entry.signal_quality(), Some(100));
        assert_eq!(entry.signal_tier(), Some(SignalTier::High));
    }
}
