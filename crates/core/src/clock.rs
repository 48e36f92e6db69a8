//! Vector clocks over thread identifiers
//!
//! A vector clock maps each [`ThreadId`] to a logical counter, with an implicit
//! zero for every thread it does not mention. Clocks form a lattice:
//!
//! - `a ≤ b` iff `∀ t: a[t] ≤ b[t]`
//! - `merge(a, b)` is the pointwise maximum (least upper bound)
//! - `a ∥ b` (concurrent) iff neither `a ≤ b` nor `b ≤ a`
//!
//! Zero components are never stored, so two clocks compare equal exactly
//! when they agree on every thread.

use crate::types::ThreadId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A vector clock: `ThreadId → u64`, zero where absent
///
/// Backed by a BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ThreadId, u64>",
    into = "BTreeMap<ThreadId, u64>"
)]
pub struct VectorClock {
    components: BTreeMap<ThreadId, u64>,
}

impl VectorClock {
    /// Create the all-zero clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the clock of a freshly observed thread: own component 1
    ///
    /// A thread's first logical event is timestamp 1, so "no prior event"
    /// (0) and "first event" stay distinguishable.
    pub fn for_thread(thread: ThreadId) -> Self {
        let mut clock = Self::new();
        clock.set(thread, 1);
        clock
    }

    /// Component for `thread`, 0 if absent
    pub fn get(&self, thread: ThreadId) -> u64 {
        self.components.get(&thread).copied().unwrap_or(0)
    }

    /// Set exactly one component
    pub fn set(&mut self, thread: ThreadId, value: u64) {
        if value == 0 {
            self.components.remove(&thread);
        } else {
            self.components.insert(thread, value);
        }
    }

    /// Increment the component for `thread`, returning the new value
    pub fn increment(&mut self, thread: ThreadId) -> u64 {
        let entry = self.components.entry(thread).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Pointwise maximum of `self` and `other`
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_into(other);
        merged
    }

    /// Merge `other` into `self` in place (pointwise maximum)
    pub fn merge_into(&mut self, other: &Self) {
        for (&thread, &value) in &other.components {
            let entry = self.components.entry(thread).or_insert(0);
            if value > *entry {
                *entry = value;
            }
        }
    }

    /// `self ≤ other`: every component of `self` is at most the matching
    /// component of `other`
    ///
    /// Only threads present in `self` need checking; an absent component is
    /// 0 and bounded by anything.
    pub fn leq(&self, other: &Self) -> bool {
        self.components
            .iter()
            .all(|(&thread, &value)| value <= other.get(thread))
    }

    /// `!(self ≤ other)`: `self` is concurrent with or strictly after `other`
    pub fn gt(&self, other: &Self) -> bool {
        !self.leq(other)
    }

    /// True if every component is zero
    pub fn is_zero(&self) -> bool {
        self.components.is_empty()
    }

    /// Threads with a non-zero component, in id order
    pub fn threads(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.components.keys().copied()
    }

    /// Non-zero `(thread, component)` pairs, in id order
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, u64)> + '_ {
        self.components.iter().map(|(&t, &v)| (t, v))
    }

    /// Render positionally over `threads`: `<1,0,2>`
    ///
    /// Absent components print as 0.
    pub fn render_dense(&self, threads: &[ThreadId]) -> String {
        let mut out = String::from("<");
        for (i, &thread) in threads.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&self.get(thread).to_string());
        }
        out.push('>');
        out
    }
}

impl PartialOrd for VectorClock {
    /// `None` when the clocks are concurrent
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.leq(other), other.leq(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl FromIterator<(ThreadId, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (ThreadId, u64)>>(iter: I) -> Self {
        let mut clock = Self::new();
        for (thread, value) in iter {
            clock.set(thread, value);
        }
        clock
    }
}

impl From<BTreeMap<ThreadId, u64>> for VectorClock {
    fn from(components: BTreeMap<ThreadId, u64>) -> Self {
        components.into_iter().collect()
    }
}

impl From<VectorClock> for BTreeMap<ThreadId, u64> {
    fn from(clock: VectorClock) -> Self {
        clock.components
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for (i, (thread, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", thread, value)?;
        }
        f.write_str(">")
    }
}
