use crate::{Address, EthernetAddress, NetParser, NetUnparser, ParseError};

use std::fmt::{self, Display, Formatter};

/// An ARP message for IPv4 over Ethernet (RFC 826).
#[derive(Default, Clone, Copy, Debug)]
pub struct ARPMessage {
    pub opcode: u16,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ARPMessage {
    pub const LENGTH: usize = 28;
    pub const OPCODE_REQUEST: u16 = 1;
    pub const OPCODE_REPLY: u16 = 2;

    const TYPE_ETHERNET: u16 = 1;
    const TYPE_IPV4: u16 = 0x800;
    const ETHERNET_ADDRESS_SIZE: u8 = 6;
    const IPV4_ADDRESS_SIZE: u8 = 4;

    pub fn parse(&mut self, p: &mut NetParser) -> Result<(), ParseError> {
        if p.buffer().len() < Self::LENGTH {
            return Err(ParseError::PacketTooShort);
        }

        let hardware_type = p.parse_u16();
        let protocol_type = p.parse_u16();
        let hardware_address_size = p.parse_u8();
        let protocol_address_size = p.parse_u8();
        self.opcode = p.parse_u16();
        self.sender_ethernet_address
            .iter_mut()
            .for_each(|byte| *byte = p.parse_u8());
        self.sender_ip_address = p.parse_u32();
        self.target_ethernet_address
            .iter_mut()
            .for_each(|byte| *byte = p.parse_u8());
        self.target_ip_address = p.parse_u32();
        p.get_result()?;

        let supported = hardware_type == Self::TYPE_ETHERNET
            && protocol_type == Self::TYPE_IPV4
            && hardware_address_size == Self::ETHERNET_ADDRESS_SIZE
            && protocol_address_size == Self::IPV4_ADDRESS_SIZE
            && (self.opcode == Self::OPCODE_REQUEST || self.opcode == Self::OPCODE_REPLY);
        if !supported {
            return Err(ParseError::Unsupported);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut ser = Vec::with_capacity(Self::LENGTH);
        NetUnparser::u16(&mut ser, Self::TYPE_ETHERNET);
        NetUnparser::u16(&mut ser, Self::TYPE_IPV4);
        NetUnparser::u8(&mut ser, Self::ETHERNET_ADDRESS_SIZE);
        NetUnparser::u8(&mut ser, Self::IPV4_ADDRESS_SIZE);
        NetUnparser::u16(&mut ser, self.opcode);
        self.sender_ethernet_address
            .iter()
            .for_each(|&b| NetUnparser::u8(&mut ser, b));
        NetUnparser::u32(&mut ser, self.sender_ip_address);
        self.target_ethernet_address
            .iter()
            .for_each(|&b| NetUnparser::u8(&mut ser, b));
        NetUnparser::u32(&mut ser, self.target_ip_address);
        ser
    }
}

impl Display for ARPMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode={}, sender={}/{}, target={}/{}",
            match self.opcode {
                Self::OPCODE_REQUEST => "REQUEST",
                Self::OPCODE_REPLY => "REPLY",
                _ => "(unknown)",
            },
            self.sender_ethernet_address,
            Address::from_ipv4_numeric(self.sender_ip_address).ip(),
            self.target_ethernet_address,
            Address::from_ipv4_numeric(self.target_ip_address).ip(),
        )
    }
}
