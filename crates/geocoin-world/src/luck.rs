//! Seeded value sources: deterministic floats in `[0, 1)` keyed by strings.
//!
//! Cache generation never touches an ambient RNG. Every random-looking
//! decision is a pure function of a key string (see [`Cell::spawn_key`] and
//! [`Cell::initial_coins_key`]), so the same world appears on every run and
//! every platform.
//!
//! # `Arc4Luck`
//!
//! The default source keys an RC4 stream with the key string, exactly the
//! way the `seedrandom` JavaScript generator does:
//!
//! 1. The key's UTF-16 code units are smeared into a key schedule of at most
//!    256 bytes.
//! 2. An RC4 state is initialised from that schedule and its first 256
//!    output bytes are discarded.
//! 3. Six output bytes form the leading digits of a base-256 fraction;
//!    further bytes are appended until 52 bits of significance are reached,
//!    then the value is scaled back below 2^53.
//!
//! Matching it bit for bit keeps cache layouts consistent with existing
//! `gameState` saves.
//!
//! [`Cell::spawn_key`]: geocoin_types::Cell::spawn_key
//! [`Cell::initial_coins_key`]: geocoin_types::Cell::initial_coins_key

use std::collections::BTreeMap;

/// A pure mapping from key strings to values in `[0, 1)`.
///
/// Implementations must not carry mutable state that affects output: the
/// same key always yields the same value.
pub trait ValueSource {
    /// Return the value for `key`, in `[0, 1)`.
    fn value_for(&self, key: &str) -> f64;
}

impl<T: ValueSource + ?Sized> ValueSource for &T {
    fn value_for(&self, key: &str) -> f64 {
        (**self).value_for(key)
    }
}

/// Number of entries in the RC4 state table.
const WIDTH: usize = 256;

/// Bytes drawn for the leading digits of each value.
const CHUNKS: u32 = 6;

/// `256^6`: denominator matching the leading digits.
const START_DENOM: f64 = 281_474_976_710_656.0;

/// `2^52`: precision target for the mantissa.
const SIGNIFICANCE: f64 = 4_503_599_627_370_496.0;

/// `2^53`: values at or above this can no longer be represented exactly.
const OVERFLOW: f64 = 9_007_199_254_740_992.0;

/// The RC4-keyed value source used for cache generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Arc4Luck;

impl ValueSource for Arc4Luck {
    fn value_for(&self, key: &str) -> f64 {
        let schedule = key_schedule(key);
        let mut stream = Arc4::new(&schedule);

        let mut n: f64 = 0.0;
        for _ in 0..CHUNKS {
            n = n.mul_add(256.0, f64::from(stream.next_byte()));
        }
        let mut d = START_DENOM;
        let mut x: f64 = 0.0;

        while n < SIGNIFICANCE {
            n = (n + x) * 256.0;
            d *= 256.0;
            x = f64::from(stream.next_byte());
        }
        while n >= OVERFLOW {
            n /= 2.0;
            d /= 2.0;
            x = (x / 2.0).floor();
        }

        (n + x) / d
    }
}

/// Smear the key's UTF-16 code units into an RC4 key schedule.
///
/// Keys longer than [`WIDTH`] units wrap around and fold into earlier
/// entries. The empty key yields the single-byte schedule `[0]`.
fn key_schedule(key: &str) -> Vec<u8> {
    let mut schedule: Vec<u8> = Vec::with_capacity(WIDTH);
    let mut smear: u32 = 0;

    for (position, unit) in key.encode_utf16().enumerate() {
        let slot = position % WIDTH;
        let previous = schedule.get(slot).copied().unwrap_or(0);
        smear ^= u32::from(previous).saturating_mul(19);
        let mixed = low_byte(smear.wrapping_add(u32::from(unit)));
        if let Some(entry) = schedule.get_mut(slot) {
            *entry = mixed;
        } else {
            schedule.push(mixed);
        }
    }

    if schedule.is_empty() {
        schedule.push(0);
    }
    schedule
}

/// Keep the low eight bits.
const fn low_byte(value: u32) -> u8 {
    value.to_le_bytes()[0]
}

/// RC4 keystream state.
struct Arc4 {
    i: u8,
    j: u8,
    state: [u8; WIDTH],
}

// Every index below is a `u8`, so lookups into the 256-entry table are
// always in bounds.
#[allow(clippy::indexing_slicing)]
impl Arc4 {
    /// Run the key-scheduling algorithm and discard the first 256 bytes.
    fn new(schedule: &[u8]) -> Self {
        let mut state = [0_u8; WIDTH];
        for (slot, value) in state.iter_mut().zip(0..=u8::MAX) {
            *slot = value;
        }

        let mut j: u8 = 0;
        for (i, &key_byte) in (0..=u8::MAX).zip(schedule.iter().cycle()) {
            let t = state[usize::from(i)];
            j = j.wrapping_add(key_byte).wrapping_add(t);
            state.swap(usize::from(i), usize::from(j));
        }

        let mut stream = Self { i: 0, j: 0, state };
        for _ in 0..WIDTH {
            stream.next_byte();
        }
        stream
    }

    /// Produce the next keystream byte.
    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        let t = self.state[usize::from(self.i)];
        self.j = self.j.wrapping_add(t);
        self.state.swap(usize::from(self.i), usize::from(self.j));
        let index = self.state[usize::from(self.i)].wrapping_add(self.state[usize::from(self.j)]);
        self.state[usize::from(index)]
    }
}

/// A fixed table of key values, for scripted worlds and tests.
///
/// Keys not in the table map to the fallback value. Callers are responsible
/// for keeping every value in `[0, 1)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableLuck {
    values: BTreeMap<String, f64>,
    fallback: f64,
}

impl TableLuck {
    /// Create a table where every key maps to `fallback`.
    pub const fn new(fallback: f64) -> Self {
        Self {
            values: BTreeMap::new(),
            fallback,
        }
    }

    /// Add or replace the value for `key`, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Add or replace the value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }
}

impl ValueSource for TableLuck {
    fn value_for(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(self.fallback)
    }
}
