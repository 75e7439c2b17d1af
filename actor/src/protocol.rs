//! Binary protocol spoken with the external trainer.
//!
//! Commands arrive on stdin, results leave on stdout. Everything is
//! little-endian and every message starts with an `i32` tag:
//!
//! ```text
//! stdin   0  self-play   i32 generation
//!         1  compare     i32 generation, i32 len, len bytes of weights
//!
//! stdout  1  comparison done
//!         2  scalar      i32 len, tag, f32 value, i32 step
//!         3  scalars     i32 len, main tag, i32 n, n x (i32 len, tag, f32), i32 step
//!         4  dataset     i32 count, i32 input_len, i32 policy_len,
//!                        inputs, legal masks (i32), policies, values
//! ```
//!
//! A compare command is answered by the scalar `Comparision/win rate`
//! (spelled as existing dashboards expect) and then `comparison done`.
//!
//! Logging goes to stderr so it never mixes with these frames.

use std::io::{self, ErrorKind, Read, Write};

use mcts::Sample;
use thiserror::Error;

const OP_SELF_PLAY: i32 = 0;
const OP_COMPARE: i32 = 1;

const MSG_COMPARISON_DONE: i32 = 1;
const MSG_SCALAR: i32 = 2;
const MSG_SCALARS: i32 = 3;
const MSG_DATASET: i32 = 4;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(i32),

    #[error("negative payload length {0}")]
    NegativeLength(i32),

    #[error("protocol I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A request from the trainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelfPlay { generation: i32 },
    Compare { generation: i32, model: Vec<u8> },
}

impl Command {
    pub fn generation(&self) -> i32 {
        match self {
            Command::SelfPlay { generation } | Command::Compare { generation, .. } => *generation,
        }
    }
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read the opcode, or `None` if the stream ends before its first byte.
fn read_opcode<R: Read>(reader: &mut R) -> io::Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(i32::from_le_bytes(buf)))
}

/// Read the next command. `Ok(None)` on a clean end of input.
pub fn read_command<R: Read>(reader: &mut R) -> Result<Option<Command>, ProtocolError> {
    let Some(opcode) = read_opcode(reader)? else {
        return Ok(None);
    };

    match opcode {
        OP_SELF_PLAY => Ok(Some(Command::SelfPlay {
            generation: read_i32(reader)?,
        })),
        OP_COMPARE => {
            let generation = read_i32(reader)?;
            let len = read_i32(reader)?;
            if len < 0 {
                return Err(ProtocolError::NegativeLength(len));
            }
            let mut model = vec![0u8; len as usize];
            reader.read_exact(&mut model)?;
            Ok(Some(Command::Compare { generation, model }))
        }
        other => Err(ProtocolError::UnknownOpcode(other)),
    }
}

/// Writes result frames, flushing after each one.
#[derive(Debug)]
pub struct Emitter<W: Write> {
    out: W,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn i32(&mut self, v: i32) -> io::Result<()> {
        self.out.write_all(&v.to_le_bytes())
    }

    fn f32(&mut self, v: f32) -> io::Result<()> {
        self.out.write_all(&v.to_le_bytes())
    }

    fn str(&mut self, s: &str) -> io::Result<()> {
        self.i32(s.len() as i32)?;
        self.out.write_all(s.as_bytes())
    }

    pub fn comparison_done(&mut self) -> io::Result<()> {
        self.i32(MSG_COMPARISON_DONE)?;
        self.out.flush()
    }

    pub fn scalar(&mut self, tag: &str, value: f32, step: i32) -> io::Result<()> {
        self.i32(MSG_SCALAR)?;
        self.str(tag)?;
        self.f32(value)?;
        self.i32(step)?;
        self.out.flush()
    }

    pub fn scalars<S: AsRef<str>>(
        &mut self,
        main_tag: &str,
        values: &[(S, f32)],
        step: i32,
    ) -> io::Result<()> {
        self.i32(MSG_SCALARS)?;
        self.str(main_tag)?;
        self.i32(values.len() as i32)?;
        for (tag, value) in values {
            self.str(tag.as_ref())?;
            self.f32(*value)?;
        }
        self.i32(step)?;
        self.out.flush()
    }

    /// All samples as one block per field, in sample order.
    pub fn dataset(
        &mut self,
        samples: &[Sample],
        input_len: usize,
        policy_len: usize,
    ) -> io::Result<()> {
        self.i32(MSG_DATASET)?;
        self.i32(samples.len() as i32)?;
        self.i32(input_len as i32)?;
        self.i32(policy_len as i32)?;

        for sample in samples {
            for &x in &sample.input {
                self.f32(x)?;
            }
        }
        for sample in samples {
            for &m in &sample.legal_moves {
                self.i32(m)?;
            }
        }
        for sample in samples {
            for &p in &sample.policy {
                self.f32(p)?;
            }
        }
        for sample in samples {
            self.f32(sample.value)?;
        }
        self.out.flush()
    }
}

/// Decoding of emitted frames for assertions.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Frame {
        ComparisonDone,
        Scalar(String, f32, i32),
        Scalars(String, Vec<(String, f32)>, i32),
        Dataset {
            count: usize,
            input_len: usize,
            policy_len: usize,
            values: Vec<f32>,
        },
    }

    fn f32_of(reader: &mut Cursor<&[u8]>) -> f32 {
        f32::from_bits(read_i32(reader).unwrap() as u32)
    }

    fn str_of(reader: &mut Cursor<&[u8]>) -> String {
        let len = read_i32(reader).unwrap() as usize;
        let mut buf = vec![0; len];
        reader.read_exact(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    /// Split an output stream into frames, panicking on malformed input.
    pub fn parse_frames(bytes: &[u8]) -> Vec<Frame> {
        let mut reader = Cursor::new(bytes);
        let mut frames = Vec::new();
        while (reader.position() as usize) < bytes.len() {
            let frame = match read_i32(&mut reader).unwrap() {
                MSG_COMPARISON_DONE => Frame::ComparisonDone,
                MSG_SCALAR => {
                    let tag = str_of(&mut reader);
                    let value = f32_of(&mut reader);
                    Frame::Scalar(tag, value, read_i32(&mut reader).unwrap())
                }
                MSG_SCALARS => {
                    let main = str_of(&mut reader);
                    let n = read_i32(&mut reader).unwrap();
                    let values = (0..n)
                        .map(|_| (str_of(&mut reader), f32_of(&mut reader)))
                        .collect();
                    Frame::Scalars(main, values, read_i32(&mut reader).unwrap())
                }
                MSG_DATASET => {
                    let count = read_i32(&mut reader).unwrap() as usize;
                    let input_len = read_i32(&mut reader).unwrap() as usize;
                    let policy_len = read_i32(&mut reader).unwrap() as usize;
                    let skip = count * (input_len + 2 * policy_len) * 4;
                    reader.set_position(reader.position() + skip as u64);
                    let values = (0..count).map(|_| f32_of(&mut reader)).collect();
                    Frame::Dataset {
                        count,
                        input_len,
                        policy_len,
                        values,
                    }
                }
                other => panic!("unknown frame type {other}"),
            };
            frames.push(frame);
        }
        frames
    }
}
