use netlink_packet_core::{
    NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
};
use netlink_packet_generic::GenlMessage;
use netlink_packet_generic::ctrl::nlas::GenlCtrlAttrs;
use netlink_packet_generic::ctrl::{GenlCtrl, GenlCtrlCmd};

use crate::dump::Decoded;
use crate::error::Error;
use crate::ie;
use crate::nl80211::{
    BssAttr, NL80211_BSS_STATUS_ASSOCIATED, NL80211_CMD_GET_INTERFACE, NL80211_CMD_GET_SCAN,
    NL80211_CMD_GET_STATION, NL80211_FAMILY_NAME, Nl80211Attr, Nl80211Message, StaInfoAttr,
};
use crate::session::{Family, Session};
use crate::table::InterfaceTable;

/// Ask the generic-netlink controller for the nl80211 family id. A kernel
/// without the family is not an error: wireless classification is simply
/// disabled for the rest of the session.
pub(crate) fn resolve_family(session: &mut Session) -> Result<Option<u16>, Error> {
    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_ACK;
    let request = NetlinkMessage::new(
        header,
        NetlinkPayload::InnerMessage(GenlMessage::from_payload(GenlCtrl {
            cmd: GenlCtrlCmd::GetFamily,
            nlas: vec![GenlCtrlAttrs::FamilyName(NL80211_FAMILY_NAME.to_owned())],
        })),
    );

    let ids = match session.dump(Family::Generic, request, |message| {
        match family_id_attr(&message.payload) {
            Some(id) => Decoded::Keep(id),
            None => Decoded::Skip,
        }
    }) {
        Ok(ids) => ids,
        Err(Error::Kernel(err)) => {
            log::warn!("{} family not available: {}", NL80211_FAMILY_NAME, err);
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let id = ids.into_iter().next();
    if id.is_none() {
        log::warn!(
            "{} family lookup returned no id, wireless state disabled",
            NL80211_FAMILY_NAME,
        );
    }
    Ok(id)
}

/// Flag every enumerated interface the wireless interface dump reports.
pub(crate) fn classify(
    session: &mut Session,
    family_id: u16,
    table: &mut InterfaceTable,
) -> Result<(), Error> {
    let request = nl80211_dump(family_id, NL80211_CMD_GET_INTERFACE, Vec::new());
    let indices = match session.dump(Family::Generic, request, |message| {
        match wifi_ifindex(&message.payload) {
            Some(if_index) => Decoded::Keep(if_index),
            None => Decoded::Skip,
        }
    }) {
        Ok(indices) => indices,
        Err(Error::Kernel(err)) => {
            log::warn!("wireless interface dump failed: {}", err);
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    for if_index in indices {
        table.mark_wifi(if_index);
    }
    Ok(())
}

/// Fill in SSID and signal for every wireless interface. Failures are
/// scoped to the interface that produced them; transport failures abort
/// the poll.
pub(crate) fn annotate(
    session: &mut Session,
    family_id: u16,
    table: &mut InterfaceTable,
) -> Result<(), Error> {
    for if_index in table.wifi_indices() {
        match fetch_ssid(session, family_id, if_index) {
            Ok(ssid) => table.set_ssid(if_index, ssid),
            Err(Error::Kernel(err)) => {
                log::warn!("scan results unavailable for ifindex {}: {}", if_index, err);
            }
            Err(err) => return Err(err),
        }
        match fetch_signal(session, family_id, if_index) {
            Ok(signal) => table.set_signal(if_index, signal),
            Err(Error::Kernel(err)) => {
                log::warn!("station info unavailable for ifindex {}: {}", if_index, err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// The SSID of the associated BSS, from a scan-results dump. Only the first
/// associated record carrying an information-elements payload is inspected.
fn fetch_ssid(
    session: &mut Session,
    family_id: u16,
    if_index: u32,
) -> Result<Option<Vec<u8>>, Error> {
    let request = nl80211_dump(
        family_id,
        NL80211_CMD_GET_SCAN,
        vec![Nl80211Attr::IfIndex(if_index)],
    );
    let hits = session.dump(Family::Generic, request, |message| {
        match associated_ies(&message.payload) {
            Some(ies) => Decoded::Stop(ies.to_vec()),
            None => Decoded::Skip,
        }
    })?;
    Ok(hits.into_iter().next().and_then(|ies| ie::ssid_from_ies(&ies)))
}

fn fetch_signal(
    session: &mut Session,
    family_id: u16,
    if_index: u32,
) -> Result<Option<i8>, Error> {
    let request = nl80211_dump(
        family_id,
        NL80211_CMD_GET_STATION,
        vec![Nl80211Attr::IfIndex(if_index)],
    );
    let signals = session.dump(Family::Generic, request, |message| {
        match station_signal(&message.payload) {
            Some(signal) => Decoded::Keep(signal),
            None => Decoded::Skip,
        }
    })?;
    Ok(signals.into_iter().next())
}

fn nl80211_dump(
    family_id: u16,
    cmd: u8,
    attrs: Vec<Nl80211Attr>,
) -> NetlinkMessage<GenlMessage<Nl80211Message>> {
    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_DUMP;
    let mut message = GenlMessage::from_payload(Nl80211Message::new(cmd, attrs));
    message.set_resolved_family_id(family_id);
    NetlinkMessage::new(header, NetlinkPayload::InnerMessage(message))
}

fn family_id_attr(ctrl: &GenlCtrl) -> Option<u16> {
    ctrl.nlas.iter().find_map(|nla| match nla {
        GenlCtrlAttrs::FamilyId(id) => Some(*id),
        _ => None,
    })
}

fn wifi_ifindex(message: &Nl80211Message) -> Option<u32> {
    message.attrs.iter().find_map(|attr| match attr {
        Nl80211Attr::IfIndex(if_index) => Some(*if_index),
        _ => None,
    })
}

/// The information-elements payload of the BSS the interface is associated
/// with, if this scan record is that BSS.
fn associated_ies(message: &Nl80211Message) -> Option<&[u8]> {
    let bss = message.attrs.iter().find_map(|attr| match attr {
        Nl80211Attr::Bss(bss) => Some(bss),
        _ => None,
    })?;
    let associated = bss
        .iter()
        .any(|attr| matches!(attr, BssAttr::Status(NL80211_BSS_STATUS_ASSOCIATED)));
    if !associated {
        return None;
    }
    bss.iter().find_map(|attr| match attr {
        BssAttr::InformationElements(ies) => Some(ies.as_slice()),
        _ => None,
    })
}

fn station_signal(message: &Nl80211Message) -> Option<i8> {
    let sta_info = message.attrs.iter().find_map(|attr| match attr {
        Nl80211Attr::StaInfo(attrs) => Some(attrs),
        _ => None,
    })?;
    sta_info.iter().find_map(|attr| match attr {
        StaInfoAttr::Signal(signal) => Some(*signal),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_id_is_read_from_the_ctrl_reply() {
        let reply = GenlCtrl {
            cmd: GenlCtrlCmd::NewFamily,
            nlas: vec![
                GenlCtrlAttrs::FamilyName(NL80211_FAMILY_NAME.to_owned()),
                GenlCtrlAttrs::FamilyId(0x1c),
            ],
        };
        assert_eq!(family_id_attr(&reply), Some(0x1c));

        let nameless = GenlCtrl {
            cmd: GenlCtrlCmd::NewFamily,
            nlas: vec![GenlCtrlAttrs::FamilyName(NL80211_FAMILY_NAME.to_owned())],
        };
        assert_eq!(family_id_attr(&nameless), None);
    }

    #[test]
    fn interface_reply_is_keyed_by_ifindex() {
        let reply = Nl80211Message::new(
            NL80211_CMD_GET_INTERFACE,
            vec![
                Nl80211Attr::IfName("wlan0".to_owned()),
                Nl80211Attr::IfIndex(3),
            ],
        );
        assert_eq!(wifi_ifindex(&reply), Some(3));

        let bare = Nl80211Message::new(NL80211_CMD_GET_INTERFACE, Vec::new());
        assert_eq!(wifi_ifindex(&bare), None);
    }

    #[test]
    fn only_the_associated_bss_with_ies_is_selected() {
        let associated = Nl80211Message::new(
            NL80211_CMD_GET_SCAN,
            vec![Nl80211Attr::Bss(vec![
                BssAttr::Status(NL80211_BSS_STATUS_ASSOCIATED),
                BssAttr::InformationElements(vec![0x00, 0x02, b'h', b'i']),
            ])],
        );
        assert_eq!(
            associated_ies(&associated),
            Some(&[0x00, 0x02, b'h', b'i'][..])
        );

        let unassociated = Nl80211Message::new(
            NL80211_CMD_GET_SCAN,
            vec![Nl80211Attr::Bss(vec![
                BssAttr::Status(0),
                BssAttr::InformationElements(vec![0x00, 0x02, b'h', b'i']),
            ])],
        );
        assert_eq!(associated_ies(&unassociated), None);

        let no_ies = Nl80211Message::new(
            NL80211_CMD_GET_SCAN,
            vec![Nl80211Attr::Bss(vec![BssAttr::Status(
                NL80211_BSS_STATUS_ASSOCIATED,
            )])],
        );
        assert_eq!(associated_ies(&no_ies), None);

        let no_bss = Nl80211Message::new(NL80211_CMD_GET_SCAN, Vec::new());
        assert_eq!(associated_ies(&no_bss), None);
    }

    #[test]
    fn station_signal_comes_from_the_nested_attribute() {
        let reply = Nl80211Message::new(
            NL80211_CMD_GET_STATION,
            vec![Nl80211Attr::StaInfo(vec![StaInfoAttr::Signal(-63)])],
        );
        assert_eq!(station_signal(&reply), Some(-63));

        let empty = Nl80211Message::new(
            NL80211_CMD_GET_STATION,
            vec![Nl80211Attr::StaInfo(Vec::new())],
        );
        assert_eq!(station_signal(&empty), None);
    }
}
