use byteorder::{
    NetworkEndian,
    ReadBytesExt,
    WriteBytesExt,
};

use {
    Error,
    Result,
};
use core::check::pseudo_header_checksum;
use core::repr::{
    ipv4_protocols,
    Ipv4Address,
};

/// [https://en.wikipedia.org/wiki/Transmission_Control_Protocol#TCP_segment_structure](https://en.wikipedia.org/wiki/Transmission_Control_Protocol#TCP_segment_structure)
mod fields {
    use std::ops::Range;

    pub const SRC_PORT: Range<usize> = 0 .. 2;

    pub const DST_PORT: Range<usize> = 2 .. 4;

    pub const CHECKSUM: Range<usize> = 16 .. 18;
}

/// View of a byte buffer as a TCP segment.
///
/// The router only rewrites endpoints, so just the ports and the checksum are
/// exposed; everything else passes through untouched.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const MIN_HEADER_LEN: usize = 20;

    /// Tries to create a TCP segment view over a byte buffer.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        if buffer.as_ref().len() < Self::MIN_HEADER_LEN {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    pub fn src_port(&self) -> u16 {
        (&self.buffer.as_ref()[fields::SRC_PORT])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn dst_port(&self) -> u16 {
        (&self.buffer.as_ref()[fields::DST_PORT])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn checksum(&self) -> u16 {
        (&self.buffer.as_ref()[fields::CHECKSUM])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    /// Calculates the checksum over the segment and its IPv4 pseudo header.
    pub fn gen_packet_checksum(&self, src_addr: &Ipv4Address, dst_addr: &Ipv4Address) -> u16 {
        pseudo_header_checksum(
            src_addr,
            dst_addr,
            ipv4_protocols::TCP,
            self.buffer.as_ref(),
        )
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_src_port(&mut self, port: u16) {
        (&mut self.buffer.as_mut()[fields::SRC_PORT])
            .write_u16::<NetworkEndian>(port)
            .unwrap()
    }

    pub fn set_dst_port(&mut self, port: u16) {
        (&mut self.buffer.as_mut()[fields::DST_PORT])
            .write_u16::<NetworkEndian>(port)
            .unwrap()
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        (&mut self.buffer.as_mut()[fields::CHECKSUM])
            .write_u16::<NetworkEndian>(checksum)
            .unwrap()
    }

    /// Zeroes the checksum field, recomputes it with the pseudo header for
    /// the supplied endpoint addresses and writes it back.
    pub fn fill_checksum(&mut self, src_addr: &Ipv4Address, dst_addr: &Ipv4Address) {
        self.set_checksum(0);
        let checksum = self.gen_packet_checksum(src_addr, dst_addr);
        self.set_checksum(checksum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_buffer_too_small() {
        let buffer: [u8; 19] = [0; 19];
        assert_matches!(Packet::try_new(&buffer[..]), Err(Error::Exhausted));
    }

    #[test]
    fn test_rewrite_ports_and_checksum() {
        let src_addr = Ipv4Address::new([10, 0, 0, 2]);
        let dst_addr = Ipv4Address::new([192, 168, 1, 9]);
        let mut buffer: [u8; 20] = [0; 20];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            packet.set_src_port(50000);
            packet.set_dst_port(80);
            packet.fill_checksum(&src_addr, &dst_addr);
        }

        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_eq!(50000, packet.src_port());
        assert_eq!(80, packet.dst_port());
        assert_eq!(0, packet.gen_packet_checksum(&src_addr, &dst_addr));
    }
}
