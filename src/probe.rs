// RULAT: Measuring the Latency Impact of Live Rule-Table Updates
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Module building correlatable ICMP echo-request frames and recognizing their replies.
//!
//! Replies are correlated through a random token at the start of the echo payload. The
//! native ICMP identifier and sequence number are fixed constants, as some devices on the
//! measured path rewrite or discard them.

use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use pnet_packet::{
    ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket},
    icmp::{
        self, echo_reply::EchoReplyPacket, echo_request::MutableEchoRequestPacket, IcmpPacket,
        IcmpTypes,
    },
    ip::IpNextHeaderProtocols,
    ipv4::{self, Ipv4Packet, MutableIpv4Packet},
    Packet,
};
use rand::RngCore;

/// Length of the random correlation token at the start of the echo payload.
pub const TOKEN_LEN: usize = 16;
/// Random filler after the token, padding the probe to a fixed size.
const FILLER_LEN: usize = 40;
const ICMP_PAYLOAD_LEN: usize = TOKEN_LEN + FILLER_LEN;

const ETHERNET_HEADER_LEN: usize = 14;
const IPV4_HEADER_LEN: usize = 20;
const ICMP_HEADER_LEN: usize = 8;

/// On-wire size of every probe frame.
pub const PROBE_PACKET_SIZE: usize =
    ETHERNET_HEADER_LEN + IPV4_HEADER_LEN + ICMP_HEADER_LEN + ICMP_PAYLOAD_LEN;

/// Fixed echo identifier, not used for correlation.
pub const ECHO_IDENT: u16 = 0x1234;
/// Fixed echo sequence number, not used for correlation.
pub const ECHO_SEQ: u16 = 1;

/// Build one ICMP echo-request frame with a fresh random correlation token.
///
/// Returns the ready-to-send frame and the token to hand to [`match_reply`].
pub fn build_probe(
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
) -> (Vec<u8>, [u8; TOKEN_LEN]) {
    let mut payload = [0u8; ICMP_PAYLOAD_LEN];
    rand::thread_rng().fill_bytes(&mut payload);
    let token: [u8; TOKEN_LEN] = payload[..TOKEN_LEN].try_into().unwrap();

    let mut frame = vec![0u8; PROBE_PACKET_SIZE];

    let mut eth = MutableEthernetPacket::new(&mut frame).unwrap();
    eth.set_destination(dst_mac);
    eth.set_source(src_mac);
    eth.set_ethertype(EtherTypes::Ipv4);

    let mut ip = MutableIpv4Packet::new(&mut frame[ETHERNET_HEADER_LEN..]).unwrap();
    ip.set_version(4);
    ip.set_header_length((IPV4_HEADER_LEN / 4) as u8);
    ip.set_total_length((IPV4_HEADER_LEN + ICMP_HEADER_LEN + ICMP_PAYLOAD_LEN) as u16);
    ip.set_ttl(64);
    ip.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
    ip.set_source(src_ip);
    ip.set_destination(dst_ip);
    let ip_checksum = ipv4::checksum(&ip.to_immutable());
    ip.set_checksum(ip_checksum);

    let mut echo =
        MutableEchoRequestPacket::new(&mut frame[ETHERNET_HEADER_LEN + IPV4_HEADER_LEN..])
            .unwrap();
    echo.set_icmp_type(IcmpTypes::EchoRequest);
    echo.set_icmp_code(icmp::echo_request::IcmpCodes::NoCode);
    echo.set_identifier(ECHO_IDENT);
    echo.set_sequence_number(ECHO_SEQ);
    echo.set_payload(&payload);
    let echo_checksum = icmp::checksum(&IcmpPacket::new(echo.packet()).unwrap());
    echo.set_checksum(echo_checksum);

    (frame, token)
}

/// Check whether a received frame is the echo reply to the probe carrying `token`.
///
/// Anything that is not an IPv4 ICMP echo reply with the token at the start of its
/// payload is rejected, including malformed or truncated frames.
pub fn match_reply(frame: &[u8], token: &[u8; TOKEN_LEN]) -> bool {
    let Some(eth) = EthernetPacket::new(frame) else {
        return false;
    };
    if eth.get_ethertype() != EtherTypes::Ipv4 {
        return false;
    }
    let Some(ip) = Ipv4Packet::new(eth.payload()) else {
        return false;
    };
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return false;
    }
    let Some(reply) = EchoReplyPacket::new(ip.payload()) else {
        return false;
    };
    if reply.get_icmp_type() != IcmpTypes::EchoReply {
        return false;
    }
    reply.payload().starts_with(token)
}

#[cfg(test)]
mod test {
    use super::*;
    use pnet_packet::icmp::echo_reply::MutableEchoReplyPacket;

    const SRC_MAC: MacAddr = MacAddr(0xde, 0xad, 0xbe, 0xef, 0x00, 0x00);
    const DST_MAC: MacAddr = MacAddr(0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa);
    const SRC_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 42, 1);
    const DST_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 42, 42);

    fn probe() -> (Vec<u8>, [u8; TOKEN_LEN]) {
        build_probe(SRC_MAC, DST_MAC, SRC_IP, DST_IP)
    }

    /// Turn a probe frame into the echo reply a remote host would send back.
    fn reply_to(request: &[u8]) -> Vec<u8> {
        let mut frame = request.to_vec();

        let mut eth = MutableEthernetPacket::new(&mut frame).unwrap();
        eth.set_destination(SRC_MAC);
        eth.set_source(DST_MAC);

        let mut ip = MutableIpv4Packet::new(&mut frame[ETHERNET_HEADER_LEN..]).unwrap();
        ip.set_source(DST_IP);
        ip.set_destination(SRC_IP);
        let ip_checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(ip_checksum);

        let mut echo =
            MutableEchoReplyPacket::new(&mut frame[ETHERNET_HEADER_LEN + IPV4_HEADER_LEN..])
                .unwrap();
        echo.set_icmp_type(IcmpTypes::EchoReply);
        let echo_checksum = icmp::checksum(&IcmpPacket::new(echo.packet()).unwrap());
        echo.set_checksum(echo_checksum);

        frame
    }

    #[test]
    fn probe_frame_layout() {
        let (frame, token) = probe();
        assert_eq!(frame.len(), PROBE_PACKET_SIZE);

        let eth = EthernetPacket::new(&frame).unwrap();
        assert_eq!(eth.get_destination(), DST_MAC);
        assert_eq!(eth.get_source(), SRC_MAC);
        assert_eq!(eth.get_ethertype(), EtherTypes::Ipv4);

        let ip = Ipv4Packet::new(eth.payload()).unwrap();
        assert_eq!(ip.get_version(), 4);
        assert_eq!(ip.get_source(), SRC_IP);
        assert_eq!(ip.get_destination(), DST_IP);
        assert_eq!(ip.get_next_level_protocol(), IpNextHeaderProtocols::Icmp);
        assert_eq!(
            ip.get_total_length() as usize,
            PROBE_PACKET_SIZE - ETHERNET_HEADER_LEN
        );
        assert_eq!(ipv4::checksum(&ip), ip.get_checksum());

        let icmp_packet = IcmpPacket::new(ip.payload()).unwrap();
        assert_eq!(icmp_packet.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(icmp::checksum(&icmp_packet), icmp_packet.get_checksum());

        let echo = pnet_packet::icmp::echo_request::EchoRequestPacket::new(ip.payload()).unwrap();
        assert_eq!(echo.get_identifier(), ECHO_IDENT);
        assert_eq!(echo.get_sequence_number(), ECHO_SEQ);
        // the token sits at the very start of the echo payload
        assert_eq!(&echo.payload()[..TOKEN_LEN], &token);
        assert_eq!(echo.payload().len(), TOKEN_LEN + FILLER_LEN);
    }

    #[test]
    fn tokens_are_fresh_per_probe() {
        let (_, a) = probe();
        let (_, b) = probe();
        assert_ne!(a, b);
    }

    #[test]
    fn matches_genuine_reply() {
        let (request, token) = probe();
        assert!(match_reply(&reply_to(&request), &token));
    }

    #[test]
    fn rejects_own_request() {
        let (request, token) = probe();
        // echo request, not echo reply
        assert!(!match_reply(&request, &token));
    }

    #[test]
    fn rejects_foreign_token() {
        let (request, _) = probe();
        let (_, other_token) = probe();
        assert!(!match_reply(&reply_to(&request), &other_token));
    }

    #[test]
    fn rejects_truncated_frame() {
        let (request, token) = probe();
        let reply = reply_to(&request);
        assert!(!match_reply(&reply[..ETHERNET_HEADER_LEN + 4], &token));
        assert!(!match_reply(&[], &token));
    }

    #[test]
    fn rejects_non_ipv4() {
        let (request, token) = probe();
        let mut reply = reply_to(&request);
        let mut eth = MutableEthernetPacket::new(&mut reply).unwrap();
        eth.set_ethertype(EtherTypes::Arp);
        assert!(!match_reply(&reply, &token));
    }

    #[test]
    fn rejects_non_icmp_protocol() {
        let (request, token) = probe();
        let mut reply = reply_to(&request);
        let mut ip = MutableIpv4Packet::new(&mut reply[ETHERNET_HEADER_LEN..]).unwrap();
        ip.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        assert!(!match_reply(&reply, &token));
    }

    #[test]
    fn rejects_other_icmp_types() {
        let (request, token) = probe();
        let mut reply = reply_to(&request);
        let mut echo =
            MutableEchoReplyPacket::new(&mut reply[ETHERNET_HEADER_LEN + IPV4_HEADER_LEN..])
                .unwrap();
        echo.set_icmp_type(IcmpTypes::DestinationUnreachable);
        assert!(!match_reply(&reply, &token));
    }
}
