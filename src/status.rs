// Snapshot store: rolling previous/current counter pairs per interface, and
// the delta/rate computation that turns them into emittable fields.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::models::{IoSnapshot, MetricValue};

/// Process-wide registry mapping interface name to its status record.
///
/// Constructed once at startup and shared by reference into every collection
/// cycle; records are never removed for the lifetime of the process. An
/// interface that disappears from the OS simply stops being filled and is not
/// re-emitted unless rediscovered. The registry map has its own lock, distinct
/// from the per-record locks, so two first observations of the same new
/// interface cannot race into two records.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    records: Mutex<HashMap<String, Arc<InterfaceStatus>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `name`, inserting an empty one if absent.
    pub fn get_or_create(&self, name: &str) -> Arc<InterfaceStatus> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InterfaceStatus::new(name)))
            .clone()
    }

    /// Number of tracked interfaces.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rolling status for one interface: the snapshot from the prior cycle and
/// the most recent one, each with its observation time.
///
/// Each record guards itself with its own lock, so overlapping cycles only
/// contend when they touch the same interface. A fill shifts both halves of
/// the pair atomically; readers see either the pre-fill or post-fill state as
/// a whole, never a mix.
#[derive(Debug)]
pub struct InterfaceStatus {
    name: String,
    inner: Mutex<StatusInner>,
}

#[derive(Debug, Default)]
struct StatusInner {
    prev: Option<(IoSnapshot, Instant)>,
    curr: Option<(IoSnapshot, Instant)>,
}

impl InterfaceStatus {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Mutex::new(StatusInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records a freshly observed snapshot, shifting the current one into the
    /// previous slot. Never fails.
    pub fn fill(&self, io: IoSnapshot) {
        self.fill_at(io, Instant::now());
    }

    /// [`fill`](Self::fill) with an explicit observation time, for
    /// deterministic tests.
    pub fn fill_at(&self, io: IoSnapshot, at: Instant) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.prev = inner.curr.take();
        inner.curr = Some((io, at));
    }

    /// Computes the emittable fields from the previous/current pair.
    ///
    /// Returns `None` on the first observation (no previous snapshot, so no
    /// meaningful delta) - callers omit the interface rather than treating
    /// this as a failure. Otherwise:
    ///
    /// - error/drop fields carry the raw delta since the last cycle, as an
    ///   absolute count of new occurrences;
    /// - byte/packet fields carry the delta divided by the elapsed time in
    ///   fractional seconds, a per-second rate. If the two observations share
    ///   the same instant these fields are omitted instead of dividing by
    ///   zero.
    ///
    /// Deltas saturate at zero, so an OS counter reset (interface restart)
    /// yields one cycle of zeros rather than a negative spike.
    pub fn rate_fields(&self) -> Option<BTreeMap<String, MetricValue>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (curr, curr_at) = inner.curr.as_ref()?;
        let (prev, prev_at) = inner.prev.as_ref()?;
        let elapsed = curr_at.duration_since(*prev_at).as_secs_f64();

        let mut fields = BTreeMap::new();
        for (name, delta) in [
            ("err_in", curr.err_in.saturating_sub(prev.err_in)),
            ("err_out", curr.err_out.saturating_sub(prev.err_out)),
            ("drop_in", curr.drop_in.saturating_sub(prev.drop_in)),
            ("drop_out", curr.drop_out.saturating_sub(prev.drop_out)),
        ] {
            fields.insert(name.to_string(), MetricValue::Int(delta as i64));
        }

        if elapsed > 0.0 {
            for (name, delta) in [
                ("bytes_sent", curr.bytes_sent.saturating_sub(prev.bytes_sent)),
                ("bytes_recv", curr.bytes_recv.saturating_sub(prev.bytes_recv)),
                (
                    "packets_sent",
                    curr.packets_sent.saturating_sub(prev.packets_sent),
                ),
                (
                    "packets_recv",
                    curr.packets_recv.saturating_sub(prev.packets_recv),
                ),
            ] {
                fields.insert(name.to_string(), MetricValue::Float(delta as f64 / elapsed));
            }
        }

        Some(fields)
    }
}
