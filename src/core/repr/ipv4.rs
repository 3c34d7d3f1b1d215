use std::fmt::{
    Display,
    Formatter,
    Result as FmtResult,
};
use std::io::Write;
use std::result::Result as StdResult;
use std::str::FromStr;

use byteorder::{
    NetworkEndian,
    ReadBytesExt,
    WriteBytesExt,
};

use {
    Error,
    Result,
};
use core::check::internet_checksum;

/// [IPv4 address](https://en.wikipedia.org/wiki/IPv4) in network byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address([u8; 4]);

impl Address {
    /// Creates an IPv4 address from a network byte order buffer.
    pub fn new(addr: [u8; 4]) -> Address {
        Address(addr)
    }

    /// Tries to create an IPv4 address from a network byte order slice.
    pub fn try_new(addr: &[u8]) -> Result<Address> {
        if addr.len() != 4 {
            return Err(Error::Exhausted);
        }

        let mut _addr: [u8; 4] = [0; 4];
        _addr.clone_from_slice(addr);
        Ok(Address(_addr))
    }

    /// Returns a reference to the network byte order representation of the
    /// address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the address as a host byte order integer.
    pub fn as_u32(&self) -> u32 {
        (&self.0[..]).read_u32::<NetworkEndian>().unwrap()
    }

    /// Counts the contiguous high bits set when the address is a subnet mask.
    pub fn mask_len(&self) -> u32 {
        (!self.as_u32()).leading_zeros()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl FromStr for Address {
    type Err = ();

    /// Parses an IPv4 address from four dot separated decimal octets.
    fn from_str(addr: &str) -> StdResult<Address, Self::Err> {
        let mut octets: [u8; 4] = [0; 4];
        let mut tokens = addr.split('.');

        for octet in octets.iter_mut() {
            let token = tokens.next().ok_or(())?;
            *octet = token.parse::<u8>().map_err(|_| ())?;
        }

        if tokens.next().is_some() {
            return Err(());
        }

        Ok(Address::new(octets))
    }
}

/// [https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml](https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml)
pub mod ipv4_protocols {
    pub const ICMP: u8 = 1;

    pub const TCP: u8 = 6;
}

pub mod flags {
    pub const DONT_FRAGMENT: u8 = 0b00000010;
}

/// Hop limit used for datagrams the router originates.
pub const DEFAULT_TTL: u8 = 64;

/// [https://en.wikipedia.org/wiki/IPv4](https://en.wikipedia.org/wiki/IPv4)
mod fields {
    use std::ops::Range;

    pub const VERSION_AND_HEADER_LEN: usize = 0;

    pub const DSCP_AND_ECN: usize = 1;

    pub const PACKET_LEN: Range<usize> = 2 .. 4;

    pub const IDENTIFICATION: Range<usize> = 4 .. 6;

    pub const FLAGS: usize = 6;

    pub const FRAG_OFFSET: Range<usize> = 6 .. 8;

    pub const TTL: usize = 8;

    pub const PROTOCOL: usize = 9;

    pub const CHECKSUM: Range<usize> = 10 .. 12;

    pub const SRC_ADDR: Range<usize> = 12 .. 16;

    pub const DST_ADDR: Range<usize> = 16 .. 20;
}

/// View of a byte buffer as an IPv4 packet.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Packet<T> {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const MIN_HEADER_LEN: usize = 20;

    /// Tries to create an IPv4 packet view over a byte buffer.
    ///
    /// NOTE: Use check_encoding() before operating on the packet if the
    /// buffer originates from an untrusted source such as a link.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        let buffer_len = buffer.as_ref().len();

        if buffer_len < Self::MIN_HEADER_LEN || buffer_len > u16::max_value() as usize {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of an IPv4 packet with no options and the specified
    /// payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::MIN_HEADER_LEN + payload_len
    }

    /// Checks if the packet encoding is valid, including the header checksum.
    ///
    /// The buffer is left exactly as received so any later quoting of the
    /// datagram in an ICMP error sees the original bytes.
    pub fn check_encoding(&self) -> Result<()> {
        if self.ip_version() != 4 || self.header_len() < 5 {
            return Err(Error::Malformed);
        }

        let header_len = (self.header_len() * 4) as usize;
        let packet_len = self.packet_len() as usize;

        if header_len > self.buffer.as_ref().len() || packet_len > self.buffer.as_ref().len()
            || packet_len < header_len
        {
            return Err(Error::Malformed);
        }

        if self.gen_header_checksum() != 0 {
            return Err(Error::Checksum);
        }

        Ok(())
    }

    /// Calculates a checksum over the entire header, options included.
    pub fn gen_header_checksum(&self) -> u16 {
        let header_len = (self.header_len() * 4) as usize;
        internet_checksum(&self.buffer.as_ref()[.. header_len])
    }

    pub fn ip_version(&self) -> u8 {
        (self.buffer.as_ref()[fields::VERSION_AND_HEADER_LEN] & 0xF0) >> 4
    }

    /// Header length in 32 bit words.
    pub fn header_len(&self) -> u8 {
        self.buffer.as_ref()[fields::VERSION_AND_HEADER_LEN] & 0x0F
    }

    pub fn packet_len(&self) -> u16 {
        (&self.buffer.as_ref()[fields::PACKET_LEN])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn identification(&self) -> u16 {
        (&self.buffer.as_ref()[fields::IDENTIFICATION])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn flags(&self) -> u8 {
        (self.buffer.as_ref()[fields::FLAGS] & 0xE0) >> 5
    }

    pub fn ttl(&self) -> u8 {
        self.buffer.as_ref()[fields::TTL]
    }

    pub fn protocol(&self) -> u8 {
        self.buffer.as_ref()[fields::PROTOCOL]
    }

    pub fn header_checksum(&self) -> u16 {
        (&self.buffer.as_ref()[fields::CHECKSUM])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    pub fn src_addr(&self) -> Address {
        Address::try_new(&self.buffer.as_ref()[fields::SRC_ADDR]).unwrap()
    }

    pub fn dst_addr(&self) -> Address {
        Address::try_new(&self.buffer.as_ref()[fields::DST_ADDR]).unwrap()
    }

    /// Returns an immutable view of the payload, excluding any link padding
    /// past the encoded packet length.
    pub fn payload(&self) -> &[u8] {
        let header_len = (self.header_len() * 4) as usize;
        let packet_len = self.packet_len() as usize;
        &self.buffer.as_ref()[header_len .. packet_len]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_ip_version(&mut self, version: u8) {
        self.buffer.as_mut()[fields::VERSION_AND_HEADER_LEN] &= !0xF0;
        self.buffer.as_mut()[fields::VERSION_AND_HEADER_LEN] |= version << 4;
    }

    pub fn set_header_len(&mut self, header_len: u8) {
        self.buffer.as_mut()[fields::VERSION_AND_HEADER_LEN] &= !0x0F;
        self.buffer.as_mut()[fields::VERSION_AND_HEADER_LEN] |= header_len & 0x0F;
    }

    pub fn set_dscp_and_ecn(&mut self, dscp_and_ecn: u8) {
        self.buffer.as_mut()[fields::DSCP_AND_ECN] = dscp_and_ecn;
    }

    pub fn set_packet_len(&mut self, packet_len: u16) {
        (&mut self.buffer.as_mut()[fields::PACKET_LEN])
            .write_u16::<NetworkEndian>(packet_len)
            .unwrap()
    }

    pub fn set_identification(&mut self, id: u16) {
        (&mut self.buffer.as_mut()[fields::IDENTIFICATION])
            .write_u16::<NetworkEndian>(id)
            .unwrap()
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.buffer.as_mut()[fields::FLAGS] &= 0x1F;
        self.buffer.as_mut()[fields::FLAGS] |= flags << 5;
    }

    pub fn set_fragment_offset(&mut self, frag_offset: u16) {
        let flags = self.flags();
        (&mut self.buffer.as_mut()[fields::FRAG_OFFSET])
            .write_u16::<NetworkEndian>(frag_offset)
            .unwrap();
        self.set_flags(flags);
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.buffer.as_mut()[fields::TTL] = ttl;
    }

    pub fn set_protocol(&mut self, protocol: u8) {
        self.buffer.as_mut()[fields::PROTOCOL] = protocol;
    }

    pub fn set_header_checksum(&mut self, header_checksum: u16) {
        (&mut self.buffer.as_mut()[fields::CHECKSUM])
            .write_u16::<NetworkEndian>(header_checksum)
            .unwrap()
    }

    pub fn set_src_addr(&mut self, addr: Address) {
        (&mut self.buffer.as_mut()[fields::SRC_ADDR])
            .write(addr.as_bytes())
            .unwrap();
    }

    pub fn set_dst_addr(&mut self, addr: Address) {
        (&mut self.buffer.as_mut()[fields::DST_ADDR])
            .write(addr.as_bytes())
            .unwrap();
    }

    /// Zeroes the checksum field, recomputes it over the header and writes it
    /// back.
    pub fn fill_header_checksum(&mut self) {
        self.set_header_checksum(0);
        let checksum = self.gen_header_checksum();
        self.set_header_checksum(checksum);
    }

    /// Returns a mutable view of the payload.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let header_len = (self.header_len() * 4) as usize;
        let packet_len = self.packet_len() as usize;
        &mut self.buffer.as_mut()[header_len .. packet_len]
    }
}

/// An IPv4 header builder for datagrams the router originates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repr {
    pub src_addr: Address,
    pub dst_addr: Address,
    pub protocol: u8,
    pub ttl: u8,
    pub dont_fragment: bool,
    pub identification: u16,
    pub payload_len: usize,
}

impl Repr {
    /// Returns the buffer size needed to serialize the header and payload.
    pub fn buffer_len(&self) -> usize {
        Packet::<&[u8]>::MIN_HEADER_LEN + self.payload_len
    }

    /// Serializes the header into a packet, writing a valid checksum.
    ///
    /// NOTE: Serialize before touching payload_mut() so the header length is
    /// in place when locating the payload.
    pub fn serialize<T>(&self, packet: &mut Packet<T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        packet.set_ip_version(4);
        packet.set_header_len(5);
        packet.set_dscp_and_ecn(0);
        packet.set_packet_len(self.buffer_len() as u16);
        packet.set_identification(self.identification);
        packet.set_flags(if self.dont_fragment {
            flags::DONT_FRAGMENT
        } else {
            0
        });
        packet.set_fragment_offset(0);
        packet.set_ttl(self.ttl);
        packet.set_protocol(self.protocol);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.fill_header_checksum();
    }
}
