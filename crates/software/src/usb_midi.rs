//! USB-MIDI Event Packet encoding.
//!
//! Every message the console produces is a channel-voice message of two or three bytes, which
//! fits a single 32-bit USB-MIDI Event Packet: a header byte carrying the cable number and the
//! Code Index Number, then the MIDI bytes, zero-padded.

use wmidi::MidiMessage;

/// Cable number used for all console traffic; the device exposes a single virtual cable.
pub const CABLE: u8 = 0;

/// Encodes a message into one USB-MIDI Event Packet.
///
/// For channel-voice messages the Code Index Number equals the status high nibble, so it is
/// derived from the encoded bytes rather than matched per variant. Returns `None` for messages
/// that do not fit a single packet (system exclusive), which the scan engine never produces.
pub fn event_packet(cable: u8, message: &MidiMessage<'_>) -> Option<[u8; 4]> {
    let mut packet = [0u8; 4];
    message.copy_to_slice(&mut packet[1..]).ok()?;
    packet[0] = (cable & 0x0F) << 4 | packet[1] >> 4;
    Some(packet)
}
