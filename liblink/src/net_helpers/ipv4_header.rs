use std::fmt::{self, Display, Formatter};

use crate::{Address, InternetChecksum, NetParser, NetUnparser, ParseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IPv4Header {
    pub ver: u8,
    pub hlen: u8,
    pub tos: u8,
    pub len: u16,
    pub id: u16,
    pub df: bool,
    pub mf: bool,
    pub offset: u16,
    pub ttl: u8,
    pub proto: u8,
    pub cksum: u16,
    pub src: u32,
    pub dst: u32,
}

impl IPv4Header {
    pub const LENGTH: usize = 20;
    pub const DEFAULT_TTL: u8 = 128;
}

impl Default for IPv4Header {
    fn default() -> Self {
        Self {
            ver: 4,
            hlen: (Self::LENGTH / 4) as u8,
            tos: 0,
            len: 0,
            id: 0,
            df: true,
            mf: false,
            offset: 0,
            ttl: Self::DEFAULT_TTL,
            proto: 0,
            cksum: 0,
            src: 0,
            dst: 0,
        }
    }
}

impl IPv4Header {
    pub fn parse(&mut self, p: &mut NetParser) -> Result<(), ParseError> {
        // Snapshot the raw bytes so the checksum can be verified after the
        // fields have been consumed.
        let raw = p.buffer().as_ref().to_vec();
        if raw.len() < Self::LENGTH {
            return Err(ParseError::PacketTooShort);
        }

        let first_byte = p.parse_u8();
        self.ver = first_byte >> 4;
        self.hlen = first_byte & 0x0f;
        self.tos = p.parse_u8();
        self.len = p.parse_u16();
        self.id = p.parse_u16();
        let fo_val = p.parse_u16();
        self.df = (fo_val & 0x4000) != 0;
        self.mf = (fo_val & 0x2000) != 0;
        self.offset = fo_val & 0x1fff;
        self.ttl = p.parse_u8();
        self.proto = p.parse_u8();
        self.cksum = p.parse_u16();
        self.src = p.parse_u32();
        self.dst = p.parse_u32();

        if self.ver != 4 {
            return Err(ParseError::WrongIPVersion);
        }
        if self.hlen < 5 {
            return Err(ParseError::HeaderTooShort);
        }
        let header_len = 4 * self.hlen as usize;
        if (self.len as usize) < header_len {
            return Err(ParseError::PacketTooShort);
        }

        // Skip options.
        p.remove_prefix(header_len - Self::LENGTH);
        p.get_result()?;

        let mut checksum = InternetChecksum::default();
        checksum.add(&raw[..header_len]);
        if checksum.value() != 0 {
            return Err(ParseError::BadChecksum);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        if self.ver != 4 {
            return Err(ParseError::WrongIPVersion);
        }
        if (self.hlen as usize) * 4 < Self::LENGTH {
            return Err(ParseError::HeaderTooShort);
        }
        Ok(self.serialize_raw())
    }

    fn serialize_raw(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(4 * self.hlen as usize);
        let first_byte = (self.ver << 4) | (self.hlen & 0xf);
        NetUnparser::u8(&mut ret, first_byte);
        NetUnparser::u8(&mut ret, self.tos);
        NetUnparser::u16(&mut ret, self.len);
        NetUnparser::u16(&mut ret, self.id);
        let fo_val = if self.df { 0x4000 } else { 0 }
            | if self.mf { 0x2000 } else { 0 }
            | (self.offset & 0x1fff);
        NetUnparser::u16(&mut ret, fo_val);
        NetUnparser::u8(&mut ret, self.ttl);
        NetUnparser::u8(&mut ret, self.proto);
        NetUnparser::u16(&mut ret, self.cksum);
        NetUnparser::u32(&mut ret, self.src);
        NetUnparser::u32(&mut ret, self.dst);
        ret.resize(4 * self.hlen as usize, 0);
        ret
    }

    /// Recomputes `cksum` from the rest of the header.
    pub fn compute_checksum(&mut self) {
        self.cksum = 0;
        let mut checksum = InternetChecksum::default();
        checksum.add(&self.serialize_raw());
        self.cksum = checksum.value();
    }

    #[inline(always)]
    pub fn payload_length(&self) -> u16 {
        self.len - 4 * self.hlen as u16
    }
}

impl Display for IPv4Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IPv{}, len={}, proto={}, ttl={}, src={}, dst={}",
            self.ver,
            self.len,
            self.proto,
            self.ttl,
            Address::from_ipv4_numeric(self.src).ip(),
            Address::from_ipv4_numeric(self.dst).ip(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Buffer;

    fn sample_header() -> IPv4Header {
        let mut header = IPv4Header {
            len: (IPv4Header::LENGTH + 9) as u16,
            ttl: 64,
            proto: 17,
            src: 0x0a00_0001,
            dst: 0x0a00_0002,
            ..IPv4Header::default()
        };
        header.compute_checksum();
        header
    }

    fn parse(wire: Vec<u8>) -> Result<IPv4Header, ParseError> {
        let mut parsed = IPv4Header::default();
        let mut p = NetParser::new(Buffer::from(wire));
        parsed.parse(&mut p).map(|()| parsed)
    }

    #[test]
    fn test_parse_round_trip() {
        let header = sample_header();
        let parsed = parse(header.serialize().unwrap()).unwrap();
        assert_eq!(parsed.ttl, 64);
        assert_eq!(parsed.src, header.src);
        assert_eq!(parsed.dst, header.dst);
        assert_eq!(parsed.cksum, header.cksum);
        assert_eq!(parsed.payload_length(), 9);
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let mut wire = sample_header().serialize().unwrap();
        wire[10] ^= 0xff;
        assert_eq!(parse(wire), Err(ParseError::BadChecksum));
    }

    #[test]
    fn test_parse_rejects_wrong_version() {
        let mut header = sample_header();
        header.ver = 6;
        let mut wire = header.serialize_raw();
        // Redo the checksum so only the version is at fault.
        header.compute_checksum();
        wire[10] = (header.cksum >> 8) as u8;
        wire[11] = header.cksum as u8;
        assert_eq!(parse(wire), Err(ParseError::WrongIPVersion));
    }

    #[test]
    fn test_checksum_revalidates_after_ttl_decrement() {
        let mut header = sample_header();
        header.ttl -= 1;
        header.compute_checksum();
        let parsed = parse(header.serialize().unwrap()).unwrap();
        assert_eq!(parsed.ttl, 63);
    }
}
