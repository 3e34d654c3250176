// Incremental construction of a Minimal Acyclic Subsequential Transducer
// from sorted (key, output) pairs.

use crate::registry::Registry;
use crate::state::{State, PENDING};

/// A dictionary entry: an opaque byte-sequence key and its output value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub input: Vec<u8>,
    pub output: i32,
}

impl Pair {
    pub fn new(input: impl AsRef<[u8]>, output: i32) -> Self {
        Self {
            input: input.as_ref().to_vec(),
            output,
        }
    }
}

/// A frozen MAST: an arena of states in freeze order, the initial state id
/// and the ids of the final states.
///
/// States address each other by arena index. Shared suffixes make the graph
/// a DAG, so a state may appear under many parents; the arena keeps that
/// sharing flat instead of threading ownership through the graph.
///
/// The initial state is always the last one interned, so the compiler's
/// reversed program starts executing at its code block.
#[derive(Debug)]
pub struct Mast {
    pub states: Vec<State>,
    pub initial: u32,
    pub finals: Vec<u32>,
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Intern a work state: reuse a structurally equal frozen state if the
/// registry has one, otherwise clone it into the arena and register it.
fn freeze(
    states: &mut Vec<State>,
    finals: &mut Vec<u32>,
    registry: &mut Registry,
    work: &State,
) -> u32 {
    if let Some(id) = registry.find(work.hcode, |id| states[id as usize] == *work) {
        return id;
    }
    let id = states.len() as u32;
    if work.is_final {
        finals.push(id);
    }
    states.push(work.clone());
    registry.insert(work.hcode, id);
    id
}

impl Mast {
    /// Build a minimal transducer from a set of pairs.
    ///
    /// The pairs are sorted internally (stable, by key bytes), so callers may
    /// pass them in any order. Duplicate keys with distinct outputs collect
    /// into the accepting state's tail set; exact duplicates are idempotent.
    ///
    /// One pass over the sorted entries maintains a ring buffer
    /// `buf[0..=max_key_len]` holding the path of the previous key, of which
    /// only the suffix beyond the common prefix with the next key is still
    /// mutable. That suffix is frozen (deduplicated through the registry)
    /// before the next key extends the buffer again, and edge outputs are
    /// pushed down the common prefix so that every key's value is carried by
    /// the first edge where its path diverges, or by the tail set of its
    /// accepting state.
    pub fn from_pairs(mut pairs: Vec<Pair>) -> Self {
        pairs.sort_by(|a, b| a.input.cmp(&b.input));

        let max_len = pairs.iter().map(|p| p.input.len()).max().unwrap_or(0);
        let mut buf: Vec<State> = vec![State::new(); max_len + 1];
        let mut states: Vec<State> = Vec::new();
        let mut finals: Vec<u32> = Vec::new();
        let mut registry = Registry::new();

        let mut prev: Vec<u8> = Vec::new();
        for pair in &pairs {
            let input = &pair.input;
            let mut out = pair.output;
            let explicit_zero = out == 0;
            let p = common_prefix_len(input, &prev);

            // Freeze the suffix of prev beyond the common prefix, deepest
            // first, re-pointing each parent edge at the frozen id.
            for i in (p + 1..=prev.len()).rev() {
                let id = freeze(&mut states, &mut finals, &mut registry, &buf[i]);
                buf[i].renew();
                buf[i - 1].set_transition(prev[i - 1], id);
            }

            // Extend the path with the new suffix. The successors are still
            // mutable ring slots, so the edges carry the pending sentinel
            // until the freeze above replaces it.
            for i in p + 1..=input.len() {
                buf[i - 1].set_transition(input[i - 1], PENDING);
            }

            if *input != prev {
                buf[input.len()].is_final = true;
            }

            // Redistribute outputs along the common prefix: where the edge
            // already carries a different value, push that value one level
            // down onto every outgoing edge (and into the tail of a final
            // state). A nonzero value matching the remaining output covers
            // it exactly and nothing deeper on the prefix can still carry
            // one, so the walk stops there. A zero-on-zero match must keep
            // walking: a deeper edge may hold a value parked by a sibling
            // key, which this key's path must not pick up.
            for j in 1..=p {
                let existing = buf[j - 1].output(input[j - 1]);
                if existing == out && existing != 0 {
                    out = 0;
                    break;
                }
                buf[j - 1].remove_output(input[j - 1]);
                let edges: Vec<u8> = buf[j].trans.keys().copied().collect();
                for ch in edges {
                    buf[j].add_output(ch, existing);
                }
                if buf[j].is_final && existing != 0 {
                    buf[j].add_tail(existing);
                }
            }

            // Place the residual output on the divergence edge, or in the
            // accepting state's tail for a duplicate key. An explicitly
            // zero-valued key stores nothing on its edge, so the zero goes
            // into the tail directly; a later duplicate with a different
            // value must still find it there.
            if *input != prev {
                buf[p].set_output(input[p], out);
                if explicit_zero {
                    buf[input.len()].add_tail(0);
                }
            } else if explicit_zero || out != 0 {
                buf[input.len()].add_tail(out);
            }

            prev = input.clone();
        }

        // Flush the path of the last key.
        for i in (1..=prev.len()).rev() {
            let id = freeze(&mut states, &mut finals, &mut registry, &buf[i]);
            buf[i].renew();
            buf[i - 1].set_transition(prev[i - 1], id);
        }

        // The initial state is interned directly, without registry lookup,
        // and last, so that program counter 0 lands in its code block.
        let root = buf[0].clone();
        let initial = states.len() as u32;
        if root.is_final {
            finals.push(initial);
        }
        states.push(root);

        Mast {
            states,
            initial,
            finals,
        }
    }

    /// Walk `input` through the state graph, collecting edge outputs and the
    /// tail of the state reached. `None` if the path leaves the graph.
    ///
    /// Debug aid for inspecting the builder without compiling; finality of
    /// the reached state is not checked.
    pub fn run(&self, input: &[u8]) -> Option<Vec<i32>> {
        let mut out = Vec::new();
        let mut s = self.initial as usize;
        for &ch in input {
            let state = &self.states[s];
            let o = state.output(ch);
            if o != 0 {
                out.push(o);
            }
            s = *state.trans.get(&ch)? as usize;
        }
        out.extend(self.states[s].tail.iter().copied());
        Some(out)
    }

    /// Whether `input` leads from the initial state to a final state.
    pub fn accepts(&self, input: &[u8]) -> bool {
        let mut s = self.initial as usize;
        for &ch in input {
            match self.states[s].trans.get(&ch) {
                Some(&next) => s = next as usize,
                None => return false,
            }
        }
        self.states[s].is_final
    }

    /// Render the state graph as a Graphviz digraph. The textual output is
    /// for inspection only and not a stable format.
    pub fn to_dot(&self) -> String {
        let mut g = String::new();
        g.push_str("digraph mast {\n");
        g.push_str("\trankdir=LR;\n");
        g.push_str("\tnode [shape=circle];\n");
        for &id in &self.finals {
            g.push_str(&format!("\t{id} [peripheries=2];\n"));
        }
        for (id, state) in self.states.iter().enumerate() {
            let mut edges: Vec<u8> = state.trans.keys().copied().collect();
            edges.sort_unstable();
            for ch in edges {
                let next = state.trans[&ch];
                let mut label = format!("{ch:02X}/{}", state.output(ch));
                let target = &self.states[next as usize];
                if target.has_tail() {
                    let tails: Vec<String> =
                        target.tail.iter().map(|t| t.to_string()).collect();
                    label.push_str(&format!(" ({})", tails.join(", ")));
                }
                g.push_str(&format!("\t{id} -> {next} [label=\"{label}\"];\n"));
            }
        }
        g.push_str("}\n");
        g
    }
}
