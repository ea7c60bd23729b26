//! Message history carried by the reserved `history` event.

use std::any::Any;

use shuttle_wire::{ValueIn, ValueOut, WireError, WireObject};

/// Event name that carries history instead of addressing an operation.
pub const HISTORY: &str = "history";

/// Provenance of the message being read.
///
/// Written upstream as a sequence of two nested sequences: the `(source
/// id, source index)` pairs of every hop, then the timings in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHistory {
    sources: Vec<(i32, i64)>,
    timings: Vec<i64>,
}

impl MessageHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            timings: Vec::new(),
        }
    }

    /// Records a hop.
    pub fn add_source(&mut self, id: i32, index: i64) {
        self.sources.push((id, index));
    }

    /// Records a timing.
    pub fn add_timing(&mut self, nanos: i64) {
        self.timings.push(nanos);
    }

    /// Returns the recorded hops.
    #[must_use]
    pub fn sources(&self) -> &[(i32, i64)] {
        &self.sources
    }

    /// Returns the recorded timings.
    #[must_use]
    pub fn timings(&self) -> &[i64] {
        &self.timings
    }

    /// Forgets everything recorded.
    pub fn reset(&mut self) {
        self.sources.clear();
        self.timings.clear();
    }
}

impl WireObject for MessageHistory {
    fn read_fields(&mut self, input: &mut dyn ValueIn) -> Result<(), WireError> {
        self.reset();
        let sources = &mut self.sources;
        input.sequence(&mut |hops| {
            while hops.has_remaining() {
                let id = hops.int32()?;
                let index = hops.int64()?;
                sources.push((id, index));
            }
            Ok(())
        })?;
        let timings = &mut self.timings;
        input.sequence(&mut |values| {
            while values.has_remaining() {
                timings.push(values.int64()?);
            }
            Ok(())
        })
    }

    fn write_fields(&self, out: &mut dyn ValueOut) {
        out.sequence(&mut |hops| {
            for &(id, index) in &self.sources {
                hops.int32(id);
                hops.int64(index);
            }
        });
        out.sequence(&mut |values| {
            for &nanos in &self.timings {
                values.int64(nanos);
            }
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use shuttle_wire::{BinaryWire, JsonWire, WireIn, WireOut};

    use super::*;

    fn sample() -> MessageHistory {
        let mut history = MessageHistory::new();
        history.add_source(1, 128);
        history.add_source(3, 9_000);
        history.add_timing(10);
        history.add_timing(25);
        history
    }

    #[test]
    fn history_survives_binary_wire() {
        let written = sample();
        let mut wire = BinaryWire::new();
        wire.write_named(HISTORY, &mut |out| out.object(&written));

        let mut reader = wire.reader();
        let mut name = String::new();
        reader.read_event(&mut name).expect("header");
        let mut read = MessageHistory::new();
        read.add_timing(99);
        reader
            .value_in()
            .sequence(&mut |fields| read.read_fields(fields))
            .expect("decode history");
        assert_eq!(read, written);
    }

    #[test]
    fn history_survives_json_wire() {
        let written = sample();
        let mut wire = JsonWire::new();
        wire.write_named(HISTORY, &mut |out| out.object(&written));
        assert_eq!(wire.to_text(), "{\"history\":[[1,128,3,9000],[10,25]]}\n");
    }
}
