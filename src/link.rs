use netlink_packet_core::{
    NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
};
use netlink_packet_route::AddressFamily;
use netlink_packet_route::RouteNetlinkMessage;
use netlink_packet_route::address::AddressMessage;
use netlink_packet_route::link::{LinkAttribute, LinkFlags, LinkMessage};

use crate::dump::Decoded;
use crate::error::Error;
use crate::session::{Family, Session};
use crate::table::InterfaceTable;

/// Build the base interface table: one link dump for names and indices,
/// one address dump to flag which interfaces hold an address.
pub(crate) fn enumerate(session: &mut Session) -> Result<InterfaceTable, Error> {
    let records = session.dump(Family::Route, link_dump_request(), |message| {
        match message {
            RouteNetlinkMessage::NewLink(link) => match link_record(&link) {
                Some(record) => Decoded::Keep(record),
                None => Decoded::Skip,
            },
            _ => Decoded::Skip,
        }
    })?;

    let mut table = InterfaceTable::new();
    for (if_index, if_name) in records {
        table.push_link(if_index, if_name);
    }

    let owners = session.dump(Family::Route, addr_dump_request(), |message| {
        match message {
            RouteNetlinkMessage::NewAddress(address) => Decoded::Keep(address.header.index),
            _ => Decoded::Skip,
        }
    })?;
    for if_index in owners {
        table.mark_addr(if_index);
    }

    Ok(table)
}

/// Extract (index, name) from a link reply. Loopback devices and devices
/// whose reply carries no name attribute yield no record.
pub(crate) fn link_record(link: &LinkMessage) -> Option<(u32, String)> {
    if link.header.flags.contains(LinkFlags::Loopback) {
        return None;
    }
    let if_name = link.attributes.iter().find_map(|attr| match attr {
        LinkAttribute::IfName(name) => Some(name.clone()),
        _ => None,
    })?;
    Some((link.header.index, if_name))
}

fn link_dump_request() -> NetlinkMessage<RouteNetlinkMessage> {
    let mut link = LinkMessage::default();
    link.header.interface_family = AddressFamily::Packet;
    dump_request(RouteNetlinkMessage::GetLink(link))
}

fn addr_dump_request() -> NetlinkMessage<RouteNetlinkMessage> {
    let mut address = AddressMessage::default();
    address.header.family = AddressFamily::Inet;
    dump_request(RouteNetlinkMessage::GetAddress(address))
}

fn dump_request(payload: RouteNetlinkMessage) -> NetlinkMessage<RouteNetlinkMessage> {
    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_DUMP;
    NetlinkMessage::new(header, NetlinkPayload::InnerMessage(payload))
}
