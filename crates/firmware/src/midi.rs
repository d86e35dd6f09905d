//! Paced transmission of scan events over the USB-MIDI class.

use crate::UsbDriver;
use embassy_time::Timer;
use embassy_usb::class::midi::MidiClass;
use vox_humana_lib::usb_midi::{CABLE, event_packet};
use wmidi::MidiMessage;

/// Events gathered while scanning one bank, sent as a burst afterwards. A bank has at most 64
/// keys, so one scan can never overflow this.
pub type EventQueue = heapless::Vec<MidiMessage<'static>, 64>;

/// Breathing room between packets so a slow host-side synth is never flooded.
const SEND_PACING_MICROS: u64 = 100;

/// Sends every queued event in order, then clears the queue.
///
/// Sends are fire-and-forget: if the host is gone the endpoint errors out and the remaining
/// events of this burst are dropped; the scan state already reflects them, so no retry is
/// possible or useful.
pub async fn send_all(class: &mut MidiClass<'static, UsbDriver>, events: &mut EventQueue) {
    for message in events.iter() {
        let Some(packet) = event_packet(CABLE, message) else {
            continue;
        };
        if class.write_packet(&packet).await.is_err() {
            break;
        }
        Timer::after_micros(SEND_PACING_MICROS).await;
    }
    events.clear();
}
