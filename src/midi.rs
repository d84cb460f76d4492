// MIDI output boundary
// Maps classifier label indices to note triggers and renders them as live
// MIDI bytes. Sending is fire-and-forget: no acknowledgment is expected.

use midly::live::LiveEvent;
use midly::MidiMessage;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Fire-and-forget MIDI consumer called once per classified capture.
pub trait MidiSink {
    fn send(&mut self, label_index: usize);
}

/// One note trigger assigned to a label index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiTrigger {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

/// Label index to note-trigger mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiMap {
    triggers: Vec<MidiTrigger>,
}

impl MidiMap {
    pub fn new(triggers: Vec<MidiTrigger>) -> Self {
        MidiMap { triggers }
    }

    pub fn trigger(&self, label_index: usize) -> Option<&MidiTrigger> {
        self.triggers.get(label_index)
    }

    /// Render the note-on/note-off byte pair for a label index, or `None`
    /// when the index has no mapping.
    pub fn live_bytes(&self, label_index: usize) -> Option<Vec<u8>> {
        let trigger = self.trigger(label_index)?;
        let channel = (trigger.channel & 0x0F).into();
        let key = (trigger.note & 0x7F).into();

        let mut bytes = Vec::with_capacity(6);
        let on = LiveEvent::Midi {
            channel,
            message: MidiMessage::NoteOn {
                key,
                vel: (trigger.velocity & 0x7F).into(),
            },
        };
        let off = LiveEvent::Midi {
            channel,
            message: MidiMessage::NoteOff { key, vel: 0.into() },
        };

        // Vec<u8> cannot fail as a write target
        on.write_std(&mut bytes).ok()?;
        off.write_std(&mut bytes).ok()?;
        Some(bytes)
    }
}

impl Default for MidiMap {
    fn default() -> Self {
        MidiMap {
            triggers: (0..5)
                .map(|i| MidiTrigger {
                    channel: 0,
                    note: 36 + i * 2, // GM percussion range, kick upward
                    velocity: 100,
                })
                .collect(),
        }
    }
}

/// Sink that writes rendered trigger bytes into any `io::Write` (a raw
/// MIDI port, a pipe, or a test buffer). Write failures are logged and
/// swallowed; the capture pipeline never stalls on its MIDI consumer.
pub struct WriterSink<W: Write> {
    map: MidiMap,
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(map: MidiMap, writer: W) -> Self {
        WriterSink { map, writer }
    }

    pub fn map(&self) -> &MidiMap {
        &self.map
    }
}

impl<W: Write> MidiSink for WriterSink<W> {
    fn send(&mut self, label_index: usize) {
        let bytes = match self.map.live_bytes(label_index) {
            Some(bytes) => bytes,
            None => {
                log::warn!("No MIDI trigger mapped to label index {}", label_index);
                return;
            }
        };
        if let Err(e) = self.writer.write_all(&bytes) {
            log::warn!("MIDI send failed: {}", e);
        }
    }
}

/// Sink that drops every message; useful when no MIDI consumer is wired.
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, _label_index: usize) {}
}
