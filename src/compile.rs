// Linearizes a MAST into the backward-addressed instruction stream.

use hashbrown::HashMap;

use crate::fst::{Cell, Fst, Opcode};
use crate::mast::Mast;
use crate::FstError;

impl Mast {
    /// Compile the state graph into an executable program.
    ///
    /// States are emitted in arena order, so every successor's code block is
    /// already emitted (and its address recorded) when an edge referring to
    /// it is encoded; the provisional stream is reversed once at the end,
    /// which turns those backward distances into the forward jumps the
    /// interpreter takes from program counter 0.
    ///
    /// Per state, outgoing edges are emitted in descending byte order. The
    /// largest byte gets the Break variant of its opcode: the interpreter
    /// scans a block in ascending order, so a mismatch there proves no edge
    /// of the state can match. A jump distance that overflows the op cell's
    /// 16-bit field is moved to a raw cell and the field zeroed as the
    /// "read the next cell" sentinel.
    pub fn compile(&self) -> Result<Fst, FstError> {
        let mut prog: Vec<Cell> = Vec::new();
        let mut data: Vec<i32> = Vec::new();
        let mut addr: HashMap<u32, usize> = HashMap::with_capacity(self.states.len());

        for (id, state) in self.states.iter().enumerate() {
            let mut edges: Vec<u8> = state.trans.keys().copied().collect();
            edges.sort_unstable();

            for (k, &ch) in edges.iter().rev().enumerate() {
                let next = state.trans[&ch];
                let out = state.output(ch);
                let target = *addr.get(&next).ok_or(FstError::UndefinedAddress {
                    state: id as u32,
                    input: ch,
                })?;
                let mut jump = prog.len() - target + 1;

                let breaking = k == 0;
                let op = match (out != 0, breaking) {
                    (true, true) => Opcode::OutputBreak,
                    (true, false) => Opcode::Output,
                    (false, true) => Opcode::Break,
                    (false, false) => Opcode::Match,
                };

                if jump > u16::MAX as usize {
                    prog.push(Cell::Raw(jump as i32));
                    jump = 0;
                }
                if out != 0 {
                    prog.push(Cell::Raw(out));
                }
                prog.push(Cell::Op {
                    op,
                    ch,
                    jump: jump as u16,
                });
            }

            if state.is_final {
                let ranged = state.has_tail();
                if ranged {
                    // Emitted begin-first so the reversed program reads the
                    // range end, then the range begin, after the accept cell.
                    prog.push(Cell::Raw(data.len() as i32));
                    data.extend(state.tail.iter().copied());
                    prog.push(Cell::Raw(data.len() as i32));
                }
                let op = if state.trans.is_empty() {
                    Opcode::AcceptBreak
                } else {
                    Opcode::Accept
                };
                prog.push(Cell::Op {
                    op,
                    ch: ranged as u8,
                    jump: 0,
                });
            }

            addr.insert(id as u32, prog.len());
        }

        prog.reverse();
        Ok(Fst { prog, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mast::Pair;
    use crate::state::State;

    fn compile(entries: &[(&str, i32)]) -> Fst {
        Mast::from_pairs(entries.iter().map(|&(k, v)| Pair::new(k, v)).collect())
            .compile()
            .unwrap()
    }

    #[test]
    fn empty_dictionary_compiles_to_empty_program() {
        let fst = compile(&[]);
        assert!(fst.prog.is_empty());
        assert!(fst.data.is_empty());
    }

    #[test]
    fn single_pair_program_layout() {
        // Root block first (entry point), accept block last.
        let fst = compile(&[("a", 1)]);
        assert_eq!(
            fst.prog,
            vec![
                Cell::Op {
                    op: Opcode::OutputBreak,
                    ch: b'a',
                    jump: 1,
                },
                Cell::Raw(1),
                Cell::Op {
                    op: Opcode::AcceptBreak,
                    ch: 0,
                    jump: 0,
                },
            ]
        );
        assert!(fst.data.is_empty());
    }

    #[test]
    fn largest_byte_carries_the_break_variant() {
        let fst = compile(&[("a", 1), ("b", 2), ("c", 3)]);
        let ops: Vec<(Opcode, u8)> = fst
            .prog
            .iter()
            .filter_map(|c| match *c {
                Cell::Op { op, ch, .. } => Some((op, ch)),
                Cell::Raw(_) => None,
            })
            .collect();
        // Ascending scan order at runtime: a, b, then c as the Break edge.
        assert_eq!(
            ops,
            vec![
                (Opcode::Output, b'a'),
                (Opcode::Output, b'b'),
                (Opcode::OutputBreak, b'c'),
                (Opcode::AcceptBreak, 0),
            ]
        );
    }

    #[test]
    fn tail_range_lands_in_data_array() {
        let fst = compile(&[("k", 333), ("k", 444)]);
        assert_eq!(fst.data, vec![333, 444]);
        // Accept cell flags the range, followed by end then begin raw cells.
        assert_eq!(
            fst.prog[1..].to_vec(),
            vec![
                Cell::Op {
                    op: Opcode::AcceptBreak,
                    ch: 1,
                    jump: 0,
                },
                Cell::Raw(2),
                Cell::Raw(0),
            ]
        );
    }

    #[test]
    fn unregistered_successor_is_an_error() {
        let mut broken = State::new();
        broken.set_transition(b'a', 7);
        let mast = Mast {
            states: vec![broken],
            initial: 0,
            finals: Vec::new(),
        };
        let err = mast.compile().unwrap_err();
        assert!(matches!(
            err,
            FstError::UndefinedAddress {
                state: 0,
                input: b'a'
            }
        ));
    }
}
