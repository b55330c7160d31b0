//! The single-producer/single-consumer posting path between a recorder
//! and the logger task, grounded on `original_source/Rdf.c`'s
//! `RdfOpen`/`RdfClose`/`RdfWriteData`: each posts a small event to
//! `AO_Logger`'s queue and bumps `TotalDroppedRDFPackets` if the post is
//! refused because the queue is full, rather than blocking the caller.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

/// Largest payload a single `Data` event carries, mirroring
/// `QEVENT_RDF_DATA::Data`'s fixed 64-byte array.
pub const MAX_SAMPLE_BYTES: usize = 64;

#[derive(Debug, Clone)]
pub enum LoggerEvent {
    Open {
        motor: u8,
        name: String,
        sample_rate_ms: u32,
        headers: Vec<(String, u8)>,
    },
    Data {
        motor: u8,
        bytes: Vec<u8>,
    },
    Close {
        motor: u8,
    },
}

/// Posts events without blocking the caller; refused posts are the
/// caller's signal to count a dropped packet.
pub trait EventSink {
    fn post(&self, event: LoggerEvent) -> Result<(), LoggerEvent>;
}

/// A bounded channel pairing a recorder-side [`LoggerQueue`] (the
/// `EventSink`) with the logger task's [`Receiver`].
pub fn channel(capacity: usize) -> (LoggerQueue, Receiver<LoggerEvent>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (LoggerQueue { tx }, rx)
}

#[derive(Clone)]
pub struct LoggerQueue {
    tx: SyncSender<LoggerEvent>,
}

impl EventSink for LoggerQueue {
    fn post(&self, event: LoggerEvent) -> Result<(), LoggerEvent> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => Err(event),
            Err(TrySendError::Disconnected(event)) => Err(event),
        }
    }
}
