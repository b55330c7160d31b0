//! Recorder lifecycle, grounded on `original_source/Rdf.c`'s
//! `RdfCreate`/`RdfOpen`/`RdfClose`/`RdfVariableWrite`/`RdfWriteData`:
//! a fixed array of per-motor slots, each staging values until
//! `write_data` packs the selected ones and posts them to the logger.
//!
//! Open/close/write_data never block the caller; a queue-full post is
//! counted rather than surfaced as an error, matching the original's
//! `TotalDroppedRDFPackets += 1` path.

use crate::queue::{EventSink, LoggerEvent};
use crate::variables::{self, StreamValue, MAX_VARS};
use kernel::errorcode::ErrorCode;
use kernel::sync::NamedMutex;

/// Statically-allocated recorder slots, mirroring `RDF_OBJECT_MAX`.
pub const MAX_RECORDERS: usize = 3;

#[derive(Clone)]
struct Recorder {
    name: String,
    sample_rate_ms: u32,
    stream_vars: u16,
    staging: [StreamValue; MAX_VARS],
    created: bool,
    opened: bool,
}

impl Recorder {
    fn empty() -> Recorder {
        Recorder {
            name: String::new(),
            sample_rate_ms: 0,
            stream_vars: 0,
            staging: std::array::from_fn(variables::zero_for),
            created: false,
            opened: false,
        }
    }
}

struct Inner<S: EventSink> {
    slots: [Recorder; MAX_RECORDERS],
    dropped_packets: u32,
    sink: S,
}

/// Owns every motor's recorder slot and the queue to the logger task.
pub struct RdfRecorders<S: EventSink> {
    inner: NamedMutex<Inner<S>>,
}

impl<S: EventSink> RdfRecorders<S> {
    pub fn new(sink: S) -> RdfRecorders<S> {
        RdfRecorders {
            inner: NamedMutex::new(
                "rdf_recorders",
                Inner {
                    slots: std::array::from_fn(|_| Recorder::empty()),
                    dropped_packets: 0,
                    sink,
                },
            ),
        }
    }

    pub fn dropped_packets(&self) -> u32 {
        self.inner.lock().dropped_packets
    }

    /// Fills in a recorder slot for `motor`. Rejects a motor number
    /// outside `MAX_RECORDERS` and rejects re-creating a slot that is
    /// still open or created but not yet closed — the source does not
    /// document overwrite semantics for this case, so recreation before
    /// an intervening close is treated as a caller error.
    pub fn create(
        &self,
        motor: u8,
        name: String,
        sample_rate_ms: u32,
        stream_vars: u16,
    ) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock();
        let slot = slot_mut(&mut inner.slots, motor)?;
        if slot.created {
            return Err(ErrorCode::ALREADY);
        }
        *slot = Recorder {
            name,
            sample_rate_ms,
            stream_vars,
            staging: std::array::from_fn(variables::zero_for),
            created: true,
            opened: false,
        };
        Ok(())
    }

    /// Posts an `Open` event for `motor`'s file. Non-blocking: a full
    /// queue is counted as a dropped packet, not returned as an error.
    pub fn open(&self, motor: u8) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock();
        let headers;
        let name;
        let sample_rate_ms;
        {
            let slot = slot_mut(&mut inner.slots, motor)?;
            if !slot.created {
                return Err(ErrorCode::INVAL);
            }
            if slot.opened {
                return Err(ErrorCode::ALREADY);
            }
            slot.opened = true;
            headers = variables::selected_indices(slot.stream_vars)
                .map(|idx| {
                    let def = &variables::ITEM_DEFINITIONS[idx];
                    (def.name.to_string(), def.kind.tag())
                })
                .collect();
            name = slot.name.clone();
            sample_rate_ms = slot.sample_rate_ms;
        }
        post_or_drop(
            &mut inner,
            LoggerEvent::Open {
                motor,
                name,
                sample_rate_ms,
                headers,
            },
        );
        Ok(())
    }

    /// Stages `value` for streaming parameter `idx`, ready to be packed
    /// by the next `write_data`. Fails if `value`'s width does not match
    /// the parameter's declared type.
    pub fn write_variable(&self, motor: u8, idx: usize, value: StreamValue) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock();
        let slot = slot_mut(&mut inner.slots, motor)?;
        if !slot.created {
            return Err(ErrorCode::INVAL);
        }
        let entry = variables::ITEM_DEFINITIONS
            .get(idx)
            .ok_or(ErrorCode::INVAL)?;
        if entry.kind.tag() != kind_tag_of(&value) {
            return Err(ErrorCode::INVAL);
        }
        slot.staging[idx] = value;
        Ok(())
    }

    /// Packs the selected parameters, in ascending bit order, into a
    /// single sample and posts it to the logger. Non-blocking: a full
    /// queue is counted as a dropped packet, not returned as an error.
    pub fn write_data(&self, motor: u8) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock();
        let bytes;
        {
            let slot = slot_mut(&mut inner.slots, motor)?;
            if !slot.created || !slot.opened {
                return Err(ErrorCode::INVAL);
            }
            let mut out = Vec::new();
            for idx in variables::selected_indices(slot.stream_vars) {
                slot.staging[idx].encode(&mut out);
            }
            bytes = out;
        }
        post_or_drop(&mut inner, LoggerEvent::Data { motor, bytes });
        Ok(())
    }

    /// Posts a `Close` event and frees the slot for reuse by a later
    /// `create`.
    pub fn close(&self, motor: u8) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock();
        {
            let slot = slot_mut(&mut inner.slots, motor)?;
            if !slot.created {
                return Err(ErrorCode::INVAL);
            }
            slot.created = false;
            slot.opened = false;
        }
        post_or_drop(&mut inner, LoggerEvent::Close { motor });
        Ok(())
    }
}

fn kind_tag_of(value: &StreamValue) -> u8 {
    match value {
        StreamValue::Int16u(_) => 3,
        StreamValue::Int32u(_) => 5,
        StreamValue::Int32s(_) => 6,
        StreamValue::Fp32(_) => 7,
    }
}

fn slot_mut(slots: &mut [Recorder; MAX_RECORDERS], motor: u8) -> Result<&mut Recorder, ErrorCode> {
    slots.get_mut(motor as usize).ok_or(ErrorCode::INVAL)
}

fn post_or_drop<S: EventSink>(inner: &mut Inner<S>, event: LoggerEvent) {
    if inner.sink.post(event).is_err() {
        inner.dropped_packets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::variables::{AVG_SPEED, RAW_SG, TIME};

    #[test]
    fn create_then_recreate_without_close_is_rejected() {
        let (sink, _rx) = queue::channel(8);
        let recorders = RdfRecorders::new(sink);
        recorders.create(0, "m0.rdf".to_string(), 10, 1).unwrap();
        assert_eq!(
            recorders.create(0, "m0.rdf".to_string(), 10, 1),
            Err(ErrorCode::ALREADY)
        );
    }

    #[test]
    fn create_after_close_succeeds() {
        let (sink, _rx) = queue::channel(8);
        let recorders = RdfRecorders::new(sink);
        recorders.create(0, "m0.rdf".to_string(), 10, 1).unwrap();
        recorders.close(0).unwrap();
        assert!(recorders.create(0, "m0.rdf".to_string(), 10, 1).is_ok());
    }

    #[test]
    fn write_variable_rejects_a_mismatched_type() {
        let (sink, _rx) = queue::channel(8);
        let recorders = RdfRecorders::new(sink);
        recorders.create(0, "m0.rdf".to_string(), 10, 1 << TIME).unwrap();
        assert_eq!(
            recorders.write_variable(0, TIME, StreamValue::Int16u(5)),
            Err(ErrorCode::INVAL)
        );
    }

    #[test]
    fn write_data_packs_selected_fields_in_ascending_bit_order() {
        let (sink, rx) = queue::channel(8);
        let recorders = RdfRecorders::new(sink);
        let mask = (1 << TIME) | (1 << AVG_SPEED) | (1 << RAW_SG);
        recorders.create(0, "m0.rdf".to_string(), 10, mask).unwrap();
        recorders.open(0).unwrap();
        let _ = rx.try_recv(); // drain the Open event
        recorders.write_variable(0, TIME, StreamValue::Int32u(100)).unwrap();
        recorders
            .write_variable(0, AVG_SPEED, StreamValue::Int32u(1500))
            .unwrap();
        recorders.write_variable(0, RAW_SG, StreamValue::Int16u(1234)).unwrap();
        recorders.write_data(0).unwrap();

        match rx.try_recv().unwrap() {
            LoggerEvent::Data { motor, bytes } => {
                assert_eq!(motor, 0);
                assert_eq!(
                    bytes,
                    vec![0x64, 0x00, 0x00, 0x00, 0xDC, 0x05, 0x00, 0x00, 0xD2, 0x04]
                );
            }
            other => panic!("expected a Data event, got {other:?}"),
        }
    }

    #[test]
    fn a_full_queue_counts_a_dropped_packet_instead_of_erroring() {
        let (sink, rx) = queue::channel(1);
        let recorders = RdfRecorders::new(sink);
        recorders.create(0, "m0.rdf".to_string(), 10, 1 << TIME).unwrap();
        recorders.open(0).unwrap(); // fills the one-deep queue
        assert!(recorders.write_data(0).is_ok());
        assert_eq!(recorders.dropped_packets(), 1);
        drop(rx);
    }
}
