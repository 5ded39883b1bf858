//! 802.11 information-element walking.
//!
//! A BSS record carries its management-frame fields as a byte stream of
//! (tag, length, value) triples. Only the SSID element (tag 0) is of
//! interest here; a hidden network legitimately carries a zero-length one.

const ELEMENT_ID_SSID: u8 = 0;

/// Walk the information-element stream and return the SSID value bytes,
/// stopping at the first SSID element. A stream that ends or declares a
/// length past the remaining bytes yields `None`.
pub(crate) fn ssid_from_ies(mut ies: &[u8]) -> Option<Vec<u8>> {
    while ies.len() >= 2 {
        let tag = ies[0];
        let len = ies[1] as usize;
        let value = &ies[2..];
        if len > value.len() {
            // Truncated element; nothing after this point can be trusted.
            return None;
        }
        if tag == ELEMENT_ID_SSID {
            return Some(value[..len].to_vec());
        }
        ies = &value[len..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssid_element_is_extracted() {
        let ies = [0x00, 0x04, b'T', b'E', b'S', b'T', 0x01, 0x02, 0x00, 0x01];
        assert_eq!(ssid_from_ies(&ies), Some(b"TEST".to_vec()));
    }

    #[test]
    fn ssid_after_other_elements() {
        let ies = [0x01, 0x02, 0x82, 0x84, 0x00, 0x03, b'l', b'a', b'n'];
        assert_eq!(ssid_from_ies(&ies), Some(b"lan".to_vec()));
    }

    #[test]
    fn hidden_network_yields_empty_ssid() {
        let ies = [0x00, 0x00, 0x01, 0x01, 0x82];
        assert_eq!(ssid_from_ies(&ies), Some(Vec::new()));
    }

    #[test]
    fn truncated_length_stops_without_ssid() {
        // Declared length 0x20 exceeds the two remaining value bytes.
        let ies = [0x01, 0x20, 0x82, 0x84];
        assert_eq!(ssid_from_ies(&ies), None);
    }

    #[test]
    fn truncated_before_ssid_is_reached() {
        let ies = [0x01, 0x02, 0x82, 0x84, 0x03, 0x05, 0x01];
        assert_eq!(ssid_from_ies(&ies), None);
    }

    #[test]
    fn empty_and_single_byte_streams() {
        assert_eq!(ssid_from_ies(&[]), None);
        assert_eq!(ssid_from_ies(&[0x00]), None);
    }
}
