use crate::{Buffer, BufferList, EthernetHeader, NetParser, ParseError};

/// An Ethernet II frame: a header followed by an opaque payload.
#[derive(Default, Clone, Debug)]
pub struct EthernetFrame {
    header: EthernetHeader,
    payload: BufferList,
}

impl EthernetFrame {
    pub fn new(header: EthernetHeader, payload: BufferList) -> Self {
        EthernetFrame { header, payload }
    }

    pub fn parse(&mut self, buf: Buffer) -> Result<(), ParseError> {
        let mut p = NetParser::new(buf);
        self.header.parse(&mut p)?;
        self.payload = p.take_buffer().into();
        p.get_result()
    }

    pub fn serialize(&self) -> BufferList {
        let mut ret: BufferList = self.header.serialize().into();
        ret.append(self.payload.clone());
        ret
    }

    pub fn header(&self) -> &EthernetHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut EthernetHeader {
        &mut self.header
    }

    pub fn payload(&self) -> &BufferList {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net_helpers::ethernet_header::EthernetAddress;

    #[test]
    fn test_parse_round_trip() {
        let frame = EthernetFrame::new(
            EthernetHeader {
                dst: EthernetAddress::new([1, 2, 3, 4, 5, 6]),
                src: EthernetAddress::new([6, 5, 4, 3, 2, 1]),
                ty: EthernetHeader::TYPE_IPV4,
            },
            BufferList::from(vec![0xde, 0xad, 0xbe, 0xef]),
        );

        let wire = frame.serialize().concat();
        let mut parsed = EthernetFrame::default();
        parsed.parse(Buffer::from(wire.clone())).unwrap();

        assert_eq!(parsed.header().dst, frame.header().dst);
        assert_eq!(parsed.header().ty, EthernetHeader::TYPE_IPV4);
        assert_eq!(parsed.payload().concat(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parsed.serialize().concat(), wire);
    }

    #[test]
    fn test_parse_truncated() {
        let mut parsed = EthernetFrame::default();
        assert!(parsed.parse(Buffer::from(vec![0u8; 5])).is_err());
    }
}
