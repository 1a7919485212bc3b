use anyhow::{bail, Context, Result};
use libc::{in_addr, sa_family_t, sockaddr_in, AF_INET};

use std::fmt;

/// An IPv4 address, stored in the kernel's `sockaddr_in` form.
#[derive(Clone, Copy)]
pub struct Address {
    addr: sockaddr_in,
}

impl Address {
    /// Constructs from a 32-bit raw numeric IP address (host byte order).
    pub fn from_ipv4_numeric(ip_address: u32) -> Self {
        Self {
            addr: sockaddr_in {
                sin_family: AF_INET as sa_family_t,
                sin_port: 0,
                sin_addr: in_addr {
                    s_addr: ip_address.to_be(),
                },
                sin_zero: [0; 8],
            },
        }
    }

    /// The 32-bit raw numeric IP address (host byte order).
    #[inline(always)]
    pub fn ipv4_numeric(&self) -> u32 {
        u32::from_be(self.addr.sin_addr.s_addr)
    }

    /// Parses a dotted-quad string, e.g. `"10.0.0.1"`.
    pub fn try_from_string(ip: &str) -> Result<Self> {
        let octets: Vec<&str> = ip.split('.').collect();
        if octets.len() != 4 {
            bail!("not a dotted-quad IPv4 address: {:?}", ip);
        }

        let mut numeric: u32 = 0;
        for octet in octets {
            let byte: u8 = octet
                .parse()
                .with_context(|| format!("bad octet {:?} in address {:?}", octet, ip))?;
            numeric = (numeric << 8) | byte as u32;
        }
        Ok(Self::from_ipv4_numeric(numeric))
    }

    /// Dotted-quad representation of the address.
    pub fn ip(&self) -> String {
        let ip = self.ipv4_numeric();
        format!(
            "{}.{}.{}.{}",
            (ip >> 24) & 0xff,
            (ip >> 16) & 0xff,
            (ip >> 8) & 0xff,
            ip & 0xff
        )
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.ipv4_numeric() == other.ipv4_numeric()
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.ip())
    }
}
