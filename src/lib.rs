//! FST dictionary engine.
//!
//! Builds a Minimal Acyclic Subsequential Transducer (MAST) from a set of
//! (byte-string key, i32 output) pairs, compiles it into a compact program
//! of 32-bit instruction cells, and interprets that program to answer
//! exact-match, longest-prefix and common-prefix queries. The compiled
//! program serializes to a stable little-endian byte stream.
//!
//! # Architecture
//!
//! - [`state`] -- the MAST node: transitions, edge outputs, tail outputs,
//!   incremental signature
//! - [`registry`] -- signature-bucketed equivalence index used to share
//!   suffixes during construction
//! - [`mast`] -- the incremental sorted-input builder and the state arena
//! - [`compile`] -- linearization into the backward-addressed instruction
//!   stream
//! - [`fst`] -- instruction cells, the interpreter and the query API
//! - [`codec`] -- binary reader/writer for compiled programs
//!
//! # Example
//!
//! ```
//! use fst_dict::{build_fst, Pair};
//!
//! let fst = build_fst(vec![
//!     Pair::new("apple", 1),
//!     Pair::new("applet", 2),
//! ])?;
//! assert_eq!(fst.search("apple"), vec![1]);
//! assert_eq!(fst.common_prefix_search("applets").len(), 2);
//! # Ok::<(), fst_dict::FstError>(())
//! ```

pub mod codec;
pub mod compile;
pub mod fst;
pub mod mast;
pub mod registry;
pub mod state;

pub use fst::{Cell, Configuration, Fst, Opcode};
pub use mast::{Mast, Pair};
pub use state::State;

/// Error type for compilation and serialization.
///
/// Query misses are not errors; they come back as empty output lists or
/// `None` prefix lengths.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    /// A transition points at a state that was never interned. The source
    /// graph is corrupt and the program cannot be produced.
    #[error("next addr is undefined: state({state}), input({input:#04x})")]
    UndefinedAddress { state: u32, input: u8 },
    /// An opcode byte outside the known set was met while reading.
    #[error("invalid format: undefined operation {0:#04x}")]
    UnknownOperation(u8),
    /// An op cell's operand slot does not hold a raw cell.
    #[error("malformed program: expected a raw cell at pc {pc}")]
    CorruptProgram { pc: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Build a queryable FST from a collection of pairs.
///
/// The pairs may arrive unsorted; construction sorts them by key bytes.
pub fn build_fst(pairs: Vec<Pair>) -> Result<Fst, FstError> {
    Mast::from_pairs(pairs).compile()
}
