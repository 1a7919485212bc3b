use crate::{Buffer, BufferList, IPv4Header, NetParser, ParseError};

/// A parsed IPv4 datagram: header plus opaque payload.
#[derive(Default, Clone, Debug)]
pub struct IPv4Datagram {
    header: IPv4Header,
    payload: BufferList,
}

pub type InternetDatagram = IPv4Datagram;

impl IPv4Datagram {
    pub fn new(header: IPv4Header, payload: BufferList) -> Self {
        IPv4Datagram { header, payload }
    }

    pub fn parse(&mut self, buf: Buffer) -> Result<(), ParseError> {
        let mut p = NetParser::new(buf);
        self.header.parse(&mut p)?;
        self.payload = p.take_buffer().into();

        if self.payload.len() != self.header.payload_length() as usize {
            return Err(ParseError::TruncatedPacket);
        }

        p.get_result()
    }

    pub fn serialize(&self) -> Result<BufferList, ParseError> {
        if self.payload.len() != self.header.payload_length() as usize {
            return Err(ParseError::PayloadSizeMismatch);
        }

        // Emitted datagrams always carry a freshly computed header checksum.
        let mut header_out = self.header;
        header_out.compute_checksum();

        let mut ret = BufferList::from(header_out.serialize()?);
        ret.append(self.payload.clone());
        Ok(ret)
    }

    pub fn header(&self) -> &IPv4Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut IPv4Header {
        &mut self.header
    }

    pub fn payload(&self) -> &BufferList {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut BufferList {
        &mut self.payload
    }
}
