// Binary serialization of a compiled program.
//
// Little-endian throughout, untagged, length-prefixed: the data array (u64
// count, then u32 values), then the program as one record per logical
// instruction (u64 count of op cells; raw cells are operands of the record
// they belong to). All 32-bit values travel unsigned and are reinterpreted
// as signed on load.

use std::io::{Read, Write};

use crate::fst::{Cell, Fst, Opcode};
use crate::FstError;

fn write_u8<W: Write>(w: &mut W, v: u8) -> std::io::Result<()> {
    w.write_all(&[v])
}

fn write_u16<W: Write>(w: &mut W, v: u16) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64<W: Write>(w: &mut W, v: u64) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u8<R: Read>(r: &mut R) -> std::io::Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u16<R: Read>(r: &mut R) -> std::io::Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_u64<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

impl Fst {
    /// The raw operand at `pc`, or a [`FstError::CorruptProgram`] when the
    /// stream does not hold one there.
    fn operand(&self, pc: usize) -> Result<i32, FstError> {
        self.raw(pc).ok_or(FstError::CorruptProgram { pc })
    }

    /// Serialize the program and data array to `w`.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), FstError> {
        write_u64(w, self.data.len() as u64)?;
        for &v in &self.data {
            write_u32(w, v as u32)?;
        }

        let logical = self
            .prog
            .iter()
            .filter(|c| matches!(c, Cell::Op { .. }))
            .count();
        write_u64(w, logical as u64)?;

        let mut pc = 0;
        while pc < self.prog.len() {
            let Cell::Op { op, ch, jump } = self.prog[pc] else {
                return Err(FstError::CorruptProgram { pc });
            };
            write_u8(w, op as u8)?;
            write_u8(w, ch)?;
            match op {
                Opcode::Accept | Opcode::AcceptBreak => {
                    pc += 1;
                    if ch != 0 {
                        write_u32(w, self.operand(pc)? as u32)?;
                        write_u32(w, self.operand(pc + 1)? as u32)?;
                        pc += 2;
                    }
                }
                Opcode::Match | Opcode::Break => {
                    write_u16(w, jump)?;
                    pc += 1;
                    if jump == 0 {
                        write_u32(w, self.operand(pc)? as u32)?;
                        pc += 1;
                    }
                }
                Opcode::Output | Opcode::OutputBreak => {
                    write_u16(w, jump)?;
                    write_u32(w, self.operand(pc + 1)? as u32)?;
                    if jump == 0 {
                        write_u32(w, self.operand(pc + 2)? as u32)?;
                        pc += 3;
                    } else {
                        pc += 2;
                    }
                }
            }
        }
        Ok(())
    }

    /// Deserialize a program previously produced by [`Fst::write`].
    pub fn read<R: Read>(r: &mut R) -> Result<Self, FstError> {
        let data_len = read_u64(r)? as usize;
        // capacity is a hint only; a hostile length prefix must fail at
        // end-of-stream, not at allocation
        let mut data = Vec::with_capacity(data_len.min(4096));
        for _ in 0..data_len {
            data.push(read_u32(r)? as i32);
        }

        let logical = read_u64(r)? as usize;
        let mut prog = Vec::with_capacity(logical.min(4096));
        for _ in 0..logical {
            let byte = read_u8(r)?;
            let op = Opcode::from_u8(byte).ok_or(FstError::UnknownOperation(byte))?;
            let ch = read_u8(r)?;
            match op {
                Opcode::Accept | Opcode::AcceptBreak => {
                    prog.push(Cell::Op { op, ch, jump: 0 });
                    if ch != 0 {
                        let to = read_u32(r)? as i32;
                        let from = read_u32(r)? as i32;
                        prog.push(Cell::Raw(to));
                        prog.push(Cell::Raw(from));
                    }
                }
                Opcode::Match | Opcode::Break => {
                    let jump = read_u16(r)?;
                    prog.push(Cell::Op { op, ch, jump });
                    if jump == 0 {
                        prog.push(Cell::Raw(read_u32(r)? as i32));
                    }
                }
                Opcode::Output | Opcode::OutputBreak => {
                    let jump = read_u16(r)?;
                    prog.push(Cell::Op { op, ch, jump });
                    prog.push(Cell::Raw(read_u32(r)? as i32));
                    if jump == 0 {
                        prog.push(Cell::Raw(read_u32(r)? as i32));
                    }
                }
            }
        }
        Ok(Fst { prog, data })
    }
}
