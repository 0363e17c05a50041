//! Fixed-capacity ring buffer of accepted location samples.

use presence_types::LocationSample;

/// Bounded FIFO of the most recent accepted samples.
///
/// Slots are allocated once; `head` is the next write index. When full, a push
/// overwrites (and returns) the oldest sample.
#[derive(Clone, Debug)]
pub struct SampleHistory {
    slots: Vec<Option<LocationSample>>,
    head: usize,
    len: usize,
}

impl SampleHistory {
    /// Create an empty history. A zero capacity is bumped to one slot.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a sample, returning the evicted oldest sample when at capacity.
    pub fn push(&mut self, sample: LocationSample) -> Option<LocationSample> {
        let evicted = self.slots[self.head].replace(sample);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
            None
        } else {
            evicted
        }
    }

    /// Sample `age` positions back from the newest (0 = newest).
    pub fn get(&self, age: usize) -> Option<&LocationSample> {
        if age >= self.len {
            return None;
        }
        let cap = self.capacity();
        let index = (self.head + cap - 1 - age) % cap;
        self.slots[index].as_ref()
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.get(0)
    }

    /// The sample accepted just before the newest one.
    pub fn previous(&self) -> Option<&LocationSample> {
        self.get(1)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LocationSample> + '_ {
        let cap = self.capacity();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).filter_map(move |i| self.slots[(start + i) % cap].as_ref())
    }
}
