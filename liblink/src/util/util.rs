use std::ops::{AddAssign, Sub};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Milliseconds(u64);

impl From<u64> for Milliseconds {
    fn from(millis: u64) -> Self {
        Milliseconds(millis)
    }
}

impl From<Milliseconds> for u64 {
    fn from(millis: Milliseconds) -> Self {
        millis.0
    }
}

impl AddAssign for Milliseconds {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Milliseconds {
    type Output = Milliseconds;

    fn sub(self, other: Self) -> Self::Output {
        Milliseconds(self.0 - other.0)
    }
}

pub fn timestamp_ms() -> Milliseconds {
    (SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64)
        .into()
}

/// RFC 1071 ones-complement checksum accumulator.
#[derive(Debug, Clone, Default)]
pub struct InternetChecksum {
    sum: u32,
}

impl InternetChecksum {
    pub fn new(initial_sum: u32) -> Self {
        Self { sum: initial_sum }
    }

    pub fn add(&mut self, data: &[u8]) {
        for chunk in data.chunks(2) {
            let word = if chunk.len() == 2 {
                u16::from_be_bytes([chunk[0], chunk[1]])
            } else {
                u16::from_be_bytes([chunk[0], 0])
            };
            self.sum = self.sum.wrapping_add(word as u32);
        }
    }

    pub fn value(&self) -> u16 {
        let mut sum = self.sum;
        while (sum >> 16) != 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        !(sum as u16)
    }
}

pub fn hexdump(data: &[u8], indent: usize) -> String {
    let indent_str = " ".repeat(indent);
    let mut output = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        output.push_str(&format!("{}{:08x}: ", indent_str, i * 16));

        for (j, &byte) in chunk.iter().enumerate() {
            if j == 8 {
                output.push(' ');
            }
            output.push_str(&format!("{:02x} ", byte));
        }

        if chunk.len() < 16 {
            let spaces = (16 - chunk.len()) * 3 + if chunk.len() <= 8 { 1 } else { 0 };
            output.push_str(&" ".repeat(spaces));
        }

        output.push_str(" ");

        for &byte in chunk {
            output.push(if (32..127).contains(&byte) {
                byte as char
            } else {
                '.'
            });
        }

        output.push('\n');
    }

    output
}
