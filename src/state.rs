// MAST node: byte-keyed transitions, per-edge outputs, tail outputs, finality,
// and an incrementally maintained 64-bit signature.

use std::collections::BTreeSet;

use hashbrown::HashMap;

/// Sentinel successor id for an edge whose target is still a mutable ring
/// buffer slot. Replaced with the real arena id when that slot freezes.
pub(crate) const PENDING: u32 = u32::MAX;

const TRANS_HASH_MUL: i64 = 1001;
const OUTPUT_HASH_MUL: i64 = 8191;

#[inline]
fn trans_hash(ch: u8, next: u32) -> i64 {
    (i64::from(ch) + i64::from(next)).wrapping_mul(TRANS_HASH_MUL)
}

#[inline]
fn output_hash(ch: u8, out: i32) -> i64 {
    (i64::from(ch) + i64::from(out)).wrapping_mul(OUTPUT_HASH_MUL)
}

/// A single MAST state.
///
/// `trans` maps a transition byte to the arena id of the successor state and
/// `output` maps the same byte to the edge's output value. Only nonzero
/// outputs are stored; an absent entry reads as zero. `tail` holds the extra
/// output values attached to a final state when duplicate keys or collapsed
/// suffixes leave more than one value on it, in ascending order.
///
/// `hcode` is a commutative additive signature over the transition and output
/// maps. Every mutation applies a reversible update, so the signature does
/// not depend on insertion order. It is only a registry bucket key;
/// equivalence is always decided by [`State::eq`].
#[derive(Debug, Clone, Default)]
pub struct State {
    pub trans: HashMap<u8, u32>,
    pub output: HashMap<u8, i32>,
    pub tail: BTreeSet<i32>,
    pub is_final: bool,
    pub hcode: i64,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// The edge output for `ch`, zero if unset.
    #[inline]
    pub fn output(&self, ch: u8) -> i32 {
        self.output.get(&ch).copied().unwrap_or(0)
    }

    /// Point the edge for `ch` at `next`, replacing any previous target.
    pub fn set_transition(&mut self, ch: u8, next: u32) {
        if let Some(old) = self.trans.insert(ch, next) {
            self.hcode = self.hcode.wrapping_sub(trans_hash(ch, old));
        }
        self.hcode = self.hcode.wrapping_add(trans_hash(ch, next));
    }

    /// Assign the edge output for `ch`. A zero value clears the entry, so
    /// "only nonzero outputs are stored" stays a structural invariant.
    pub fn set_output(&mut self, ch: u8, out: i32) {
        self.remove_output(ch);
        if out != 0 {
            self.output.insert(ch, out);
            self.hcode = self.hcode.wrapping_add(output_hash(ch, out));
        }
    }

    /// Add `delta` to the edge output for `ch`.
    pub fn add_output(&mut self, ch: u8, delta: i32) {
        let sum = self.output(ch).wrapping_add(delta);
        self.set_output(ch, sum);
    }

    pub fn remove_output(&mut self, ch: u8) {
        if let Some(old) = self.output.remove(&ch) {
            self.hcode = self.hcode.wrapping_sub(output_hash(ch, old));
        }
    }

    pub fn add_tail(&mut self, t: i32) {
        self.tail.insert(t);
    }

    pub fn has_tail(&self) -> bool {
        !self.tail.is_empty()
    }

    /// Reset the state to empty so its ring buffer slot can be reused.
    pub fn renew(&mut self) {
        self.trans.clear();
        self.output.clear();
        self.tail.clear();
        self.is_final = false;
        self.hcode = 0;
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // signature first: unequal buckets can never hold equal states
        self.hcode == other.hcode
            && self.is_final == other.is_final
            && self.trans == other.trans
            && self.output == other.output
            && self.tail == other.tail
    }
}

impl Eq for State {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent() {
        let mut a = State::new();
        a.set_transition(b'x', 1);
        a.set_transition(b'y', 2);
        a.set_output(b'x', 10);

        let mut b = State::new();
        b.set_output(b'x', 10);
        b.set_transition(b'y', 2);
        b.set_transition(b'x', 1);

        assert_eq!(a.hcode, b.hcode);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_update_is_reversible() {
        let mut s = State::new();
        s.set_transition(b'a', 3);
        let before = s.hcode;

        s.set_output(b'a', 42);
        assert_ne!(s.hcode, before);
        s.remove_output(b'a');
        assert_eq!(s.hcode, before);

        // replacing a target cancels the old contribution exactly
        s.set_transition(b'a', PENDING);
        s.set_transition(b'a', 3);
        assert_eq!(s.hcode, before);
    }

    #[test]
    fn zero_output_is_not_stored() {
        let mut s = State::new();
        s.set_output(b'a', 0);
        assert!(s.output.is_empty());
        assert_eq!(s.hcode, 0);

        s.set_output(b'a', 7);
        s.add_output(b'a', -7);
        assert!(s.output.is_empty());
        assert_eq!(s.hcode, 0);
        assert_eq!(s.output(b'a'), 0);
    }

    #[test]
    fn add_output_accumulates() {
        let mut s = State::new();
        s.add_output(b'k', 5);
        s.add_output(b'k', 5);
        assert_eq!(s.output(b'k'), 10);
    }

    #[test]
    fn equality_checks_structure_not_just_signature() {
        let mut a = State::new();
        a.set_transition(b'a', 1);
        let mut b = State::new();
        b.set_transition(b'a', 1);
        assert_eq!(a, b);

        b.is_final = true;
        assert_ne!(a, b);

        b.is_final = false;
        b.add_tail(3);
        assert_ne!(a, b);
    }

    #[test]
    fn renew_clears_everything() {
        let mut s = State::new();
        s.set_transition(b'a', 1);
        s.set_output(b'a', 2);
        s.add_tail(3);
        s.is_final = true;

        s.renew();
        assert_eq!(s, State::new());
        assert_eq!(s.hcode, 0);
    }
}
