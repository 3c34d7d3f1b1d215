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

/// Bytes of the offending datagram quoted in an ICMP error: the IP header
/// plus the first 8 payload bytes.
pub const QUOTED_DATAGRAM_LEN: usize = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationUnreachable {
    HostUnreachable,
    PortUnreachable,
}

/// An ICMP message the router understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repr {
    EchoRequest {
        id: u16,
        seq: u16,
        payload_len: usize,
    },
    EchoReply {
        id: u16,
        seq: u16,
        payload_len: usize,
    },
    /// Carries a quoted copy of the offending datagram in its payload.
    DestinationUnreachable(DestinationUnreachable),
    /// TTL expired in transit; quotes the offending datagram too.
    TimeExceeded,
}

impl Repr {
    /// Returns the buffer size needed to serialize the ICMP message,
    /// payload included.
    pub fn buffer_len(&self) -> usize {
        Packet::<&[u8]>::HEADER_LEN + match *self {
            Repr::EchoRequest { payload_len, .. } | Repr::EchoReply { payload_len, .. } => {
                payload_len
            }
            Repr::DestinationUnreachable(_) | Repr::TimeExceeded => QUOTED_DATAGRAM_LEN,
        }
    }

    /// Tries to deserialize a packet into an ICMP message.
    pub fn deserialize<T>(packet: &Packet<T>) -> Result<Repr>
    where
        T: AsRef<[u8]>,
    {
        let payload_len = packet.payload().len();

        let (id, seq) = (
            (&packet.header()[0 .. 2])
                .read_u16::<NetworkEndian>()
                .unwrap(),
            (&packet.header()[2 .. 4])
                .read_u16::<NetworkEndian>()
                .unwrap(),
        );

        match (packet.message_type(), packet.code()) {
            (0, 0) => Ok(Repr::EchoReply {
                id,
                seq,
                payload_len,
            }),
            (8, 0) => Ok(Repr::EchoRequest {
                id,
                seq,
                payload_len,
            }),
            (3, 1) => Ok(Repr::DestinationUnreachable(
                DestinationUnreachable::HostUnreachable,
            )),
            (3, 3) => Ok(Repr::DestinationUnreachable(
                DestinationUnreachable::PortUnreachable,
            )),
            (11, 0) => Ok(Repr::TimeExceeded),
            _ => Err(Error::Malformed),
        }
    }

    /// Serializes the ICMP message into a packet.
    ///
    /// The caller writes the payload (echo data or quoted datagram) after
    /// serializing, then calls fill_checksum() on the packet.
    pub fn serialize<T>(&self, packet: &mut Packet<T>) -> Result<()>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        match *self {
            Repr::EchoRequest { id, seq, .. } => {
                packet.set_message_type(8);
                packet.set_code(0);
                Self::serialize_echo_header(packet, id, seq);
            }
            Repr::EchoReply { id, seq, .. } => {
                packet.set_message_type(0);
                packet.set_code(0);
                Self::serialize_echo_header(packet, id, seq);
            }
            Repr::DestinationUnreachable(reason) => {
                packet.set_message_type(3);
                packet.set_code(match reason {
                    DestinationUnreachable::HostUnreachable => 1,
                    DestinationUnreachable::PortUnreachable => 3,
                });
                Self::serialize_unused_header(packet);
            }
            Repr::TimeExceeded => {
                packet.set_message_type(11);
                packet.set_code(0);
                Self::serialize_unused_header(packet);
            }
        }

        Ok(())
    }

    fn serialize_echo_header<T>(packet: &mut Packet<T>, id: u16, seq: u16)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        (&mut packet.header_mut()[0 .. 2])
            .write_u16::<NetworkEndian>(id)
            .unwrap();
        (&mut packet.header_mut()[2 .. 4])
            .write_u16::<NetworkEndian>(seq)
            .unwrap();
    }

    fn serialize_unused_header<T>(packet: &mut Packet<T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        let zeros = [0; 4];
        packet.header_mut().copy_from_slice(&zeros[..]);
    }
}

/// [https://en.wikipedia.org/wiki/Internet_Control_Message_Protocol](https://en.wikipedia.org/wiki/Internet_Control_Message_Protocol)
mod fields {
    use std::ops::{
        Range,
        RangeFrom,
    };

    pub const TYPE: usize = 0;

    pub const CODE: usize = 1;

    pub const CHECKSUM: Range<usize> = 2 .. 4;

    pub const HEADER: Range<usize> = 4 .. 8;

    pub const PAYLOAD: RangeFrom<usize> = 8 ..;
}

/// View of a byte buffer as an ICMP packet.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const HEADER_LEN: usize = 8;

    /// Tries to create an ICMP packet view over a byte buffer.
    ///
    /// NOTE: Use check_encoding() before operating on the packet if the
    /// buffer originates from an untrusted source such as a link.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        if buffer.as_ref().len() < Self::HEADER_LEN {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of an ICMP packet with the specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::HEADER_LEN + payload_len
    }

    /// Checks that the checksum over the entire message is valid.
    pub fn check_encoding(&self) -> Result<()> {
        if self.gen_packet_checksum() != 0 {
            Err(Error::Checksum)
        } else {
            Ok(())
        }
    }

    /// Calculates the checksum over the entire message.
    pub fn gen_packet_checksum(&self) -> u16 {
        internet_checksum(self.buffer.as_ref())
    }

    pub fn message_type(&self) -> u8 {
        self.buffer.as_ref()[fields::TYPE]
    }

    pub fn code(&self) -> u8 {
        self.buffer.as_ref()[fields::CODE]
    }

    pub fn checksum(&self) -> u16 {
        (&self.buffer.as_ref()[fields::CHECKSUM])
            .read_u16::<NetworkEndian>()
            .unwrap()
    }

    /// Returns the 4 bytes following the checksum, whose meaning depends on
    /// the message type.
    pub fn header(&self) -> &[u8] {
        &self.buffer.as_ref()[fields::HEADER]
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[fields::PAYLOAD]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_message_type(&mut self, message_type: u8) {
        self.buffer.as_mut()[fields::TYPE] = message_type;
    }

    pub fn set_code(&mut self, code: u8) {
        self.buffer.as_mut()[fields::CODE] = code;
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        (&mut self.buffer.as_mut()[fields::CHECKSUM])
            .write_u16::<NetworkEndian>(checksum)
            .unwrap()
    }

    pub fn header_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[fields::HEADER]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[fields::PAYLOAD]
    }

    /// Zeroes the checksum field, recomputes it over the entire message and
    /// writes it back.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = self.gen_packet_checksum();
        self.set_checksum(checksum);
    }
}
