// Wire types for the nl80211 generic-netlink family, covering the three
// dumps this crate issues. Constants are from the kernel uapi
// (linux/nl80211.h); only the attributes we consume get typed variants,
// everything else is carried as DefaultNla.

use netlink_packet_generic::{GenlFamily, GenlHeader};
use netlink_packet_core::{DefaultNla, Nla, NlaBuffer, NlasIterator};
use netlink_packet_core::{parse_string, parse_u8, parse_u32};
use netlink_packet_core::{DecodeError, Emitable, Parseable, ParseableParametrized};

pub const NL80211_FAMILY_NAME: &str = "nl80211";

pub const NL80211_CMD_GET_INTERFACE: u8 = 5;
pub const NL80211_CMD_GET_STATION: u8 = 17;
pub const NL80211_CMD_GET_SCAN: u8 = 32;

const NL80211_ATTR_IFINDEX: u16 = 3;
const NL80211_ATTR_IFNAME: u16 = 4;
const NL80211_ATTR_STA_INFO: u16 = 21;
const NL80211_ATTR_BSS: u16 = 47;

const NL80211_BSS_INFORMATION_ELEMENTS: u16 = 6;
const NL80211_BSS_STATUS: u16 = 9;

const NL80211_STA_INFO_SIGNAL: u16 = 7;

pub const NL80211_BSS_STATUS_ASSOCIATED: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nl80211Message {
    pub cmd: u8,
    pub attrs: Vec<Nl80211Attr>,
}

impl Nl80211Message {
    pub fn new(cmd: u8, attrs: Vec<Nl80211Attr>) -> Self {
        Self { cmd, attrs }
    }
}

impl GenlFamily for Nl80211Message {
    fn family_name() -> &'static str {
        NL80211_FAMILY_NAME
    }

    fn command(&self) -> u8 {
        self.cmd
    }

    fn version(&self) -> u8 {
        0
    }
}

impl Emitable for Nl80211Message {
    fn buffer_len(&self) -> usize {
        self.attrs.as_slice().buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) {
        self.attrs.as_slice().emit(buffer)
    }
}

impl ParseableParametrized<[u8], GenlHeader> for Nl80211Message {
    fn parse_with_param(buffer: &[u8], header: GenlHeader) -> Result<Self, DecodeError> {
        Ok(Self {
            cmd: header.cmd,
            attrs: parse_nested(buffer)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nl80211Attr {
    IfIndex(u32),
    IfName(String),
    StaInfo(Vec<StaInfoAttr>),
    Bss(Vec<BssAttr>),
    Other(DefaultNla),
}

impl Nla for Nl80211Attr {
    fn value_len(&self) -> usize {
        match self {
            Self::IfIndex(_) => 4,
            Self::IfName(name) => name.len() + 1,
            Self::StaInfo(attrs) => attrs.as_slice().buffer_len(),
            Self::Bss(attrs) => attrs.as_slice().buffer_len(),
            Self::Other(nla) => nla.value_len(),
        }
    }

    fn kind(&self) -> u16 {
        match self {
            Self::IfIndex(_) => NL80211_ATTR_IFINDEX,
            Self::IfName(_) => NL80211_ATTR_IFNAME,
            Self::StaInfo(_) => NL80211_ATTR_STA_INFO,
            Self::Bss(_) => NL80211_ATTR_BSS,
            Self::Other(nla) => nla.kind(),
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        match self {
            Self::IfIndex(value) => buffer[..4].copy_from_slice(&value.to_ne_bytes()),
            Self::IfName(name) => {
                buffer[..name.len()].copy_from_slice(name.as_bytes());
                buffer[name.len()] = 0;
            }
            Self::StaInfo(attrs) => attrs.as_slice().emit(buffer),
            Self::Bss(attrs) => attrs.as_slice().emit(buffer),
            Self::Other(nla) => nla.emit_value(buffer),
        }
    }

    fn is_nested(&self) -> bool {
        matches!(self, Self::StaInfo(_) | Self::Bss(_))
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Parseable<NlaBuffer<&'a T>> for Nl80211Attr {
    fn parse(buf: &NlaBuffer<&'a T>) -> Result<Self, DecodeError> {
        let payload = buf.value();
        Ok(match buf.kind() {
            NL80211_ATTR_IFINDEX => Self::IfIndex(parse_u32(payload)?),
            NL80211_ATTR_IFNAME => Self::IfName(parse_string(payload)?),
            NL80211_ATTR_STA_INFO => Self::StaInfo(parse_nested(payload)?),
            NL80211_ATTR_BSS => Self::Bss(parse_nested(payload)?),
            _ => Self::Other(DefaultNla::parse(buf)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BssAttr {
    InformationElements(Vec<u8>),
    Status(u32),
    Other(DefaultNla),
}

impl Nla for BssAttr {
    fn value_len(&self) -> usize {
        match self {
            Self::InformationElements(ies) => ies.len(),
            Self::Status(_) => 4,
            Self::Other(nla) => nla.value_len(),
        }
    }

    fn kind(&self) -> u16 {
        match self {
            Self::InformationElements(_) => NL80211_BSS_INFORMATION_ELEMENTS,
            Self::Status(_) => NL80211_BSS_STATUS,
            Self::Other(nla) => nla.kind(),
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        match self {
            Self::InformationElements(ies) => buffer[..ies.len()].copy_from_slice(ies),
            Self::Status(value) => buffer[..4].copy_from_slice(&value.to_ne_bytes()),
            Self::Other(nla) => nla.emit_value(buffer),
        }
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Parseable<NlaBuffer<&'a T>> for BssAttr {
    fn parse(buf: &NlaBuffer<&'a T>) -> Result<Self, DecodeError> {
        let payload = buf.value();
        Ok(match buf.kind() {
            NL80211_BSS_INFORMATION_ELEMENTS => Self::InformationElements(payload.to_vec()),
            NL80211_BSS_STATUS => Self::Status(parse_u32(payload)?),
            _ => Self::Other(DefaultNla::parse(buf)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaInfoAttr {
    /// Station signal strength in dBm.
    Signal(i8),
    Other(DefaultNla),
}

impl Nla for StaInfoAttr {
    fn value_len(&self) -> usize {
        match self {
            Self::Signal(_) => 1,
            Self::Other(nla) => nla.value_len(),
        }
    }

    fn kind(&self) -> u16 {
        match self {
            Self::Signal(_) => NL80211_STA_INFO_SIGNAL,
            Self::Other(nla) => nla.kind(),
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        match self {
            Self::Signal(value) => buffer[0] = *value as u8,
            Self::Other(nla) => nla.emit_value(buffer),
        }
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Parseable<NlaBuffer<&'a T>> for StaInfoAttr {
    fn parse(buf: &NlaBuffer<&'a T>) -> Result<Self, DecodeError> {
        let payload = buf.value();
        Ok(match buf.kind() {
            NL80211_STA_INFO_SIGNAL => Self::Signal(parse_u8(payload)? as i8),
            _ => Self::Other(DefaultNla::parse(buf)?),
        })
    }
}

fn parse_nested<A>(payload: &[u8]) -> Result<Vec<A>, DecodeError>
where
    A: for<'b> Parseable<NlaBuffer<&'b [u8]>>,
{
    let mut attrs = Vec::new();
    for nla in NlasIterator::new(payload) {
        let nla = nla?;
        attrs.push(A::parse(&nla)?);
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_bss_attribute_parses() {
        // NL80211_ATTR_BSS (nested) carrying a status and an IE blob, laid
        // out as the kernel would emit it on a little-endian machine.
        #[rustfmt::skip]
        let bytes: [u8; 28] = [
            28, 0x00, 47, 0x80, // nla header: len 28, kind 47 | NLA_F_NESTED
            0x08, 0x00, 9, 0x00, // status: len 8, kind 9
            0x01, 0x00, 0x00, 0x00, // NL80211_BSS_STATUS_ASSOCIATED
            0x0e, 0x00, 6, 0x00, // ies: len 14, kind 6
            0x00, 0x04, b'T', b'E', b'S', b'T', 0x01, 0x02, 0x00, 0x01,
            0x00, 0x00, // alignment padding
        ];
        let buf = NlaBuffer::new_checked(&bytes[..]).unwrap();
        let attr = Nl80211Attr::parse(&buf).unwrap();
        match attr {
            Nl80211Attr::Bss(bss) => {
                assert_eq!(bss[0], BssAttr::Status(NL80211_BSS_STATUS_ASSOCIATED));
                assert_eq!(
                    bss[1],
                    BssAttr::InformationElements(vec![
                        0x00, 0x04, b'T', b'E', b'S', b'T', 0x01, 0x02, 0x00, 0x01,
                    ])
                );
            }
            other => panic!("expected BSS attribute, got {:?}", other),
        }
    }

    #[test]
    fn nested_station_info_signal_parses_as_dbm() {
        #[rustfmt::skip]
        let bytes: [u8; 12] = [
            12, 0x00, 21, 0x80, // nla header: len 12, kind 21 | NLA_F_NESTED
            0x05, 0x00, 7, 0x00, // signal: len 5, kind 7
            0xc8, 0x00, 0x00, 0x00, // -56 dBm, padded
        ];
        let buf = NlaBuffer::new_checked(&bytes[..]).unwrap();
        let attr = Nl80211Attr::parse(&buf).unwrap();
        assert_eq!(attr, Nl80211Attr::StaInfo(vec![StaInfoAttr::Signal(-56)]));
    }

    #[test]
    fn request_attribute_emits_ifindex() {
        let attr = Nl80211Attr::IfIndex(3);
        let mut buffer = vec![0u8; attr.buffer_len()];
        attr.emit(&mut buffer);
        assert_eq!(buffer, [0x08, 0x00, 0x03, 0x00, 0x03, 0x00, 0x00, 0x00]);
    }
}
