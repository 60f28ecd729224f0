use {
  crate::error::{IoSnafu, ParseError, VarintOverflowSnafu},
  byteorder::{LittleEndian, ReadBytesExt},
  snafu::{ResultExt, ensure},
  std::io::Read,
};

/// Largest count any CompactSize field is allowed to carry. Anything above
/// this is garbage, not a block.
const MAX_COUNT: u64 = 1 << 53;

const SCRATCH_SIZE: usize = 4096;

/// A decoded CompactSize integer together with the exact bytes it was
/// encoded as, needed verbatim for txid preimages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VarInt {
  pub(crate) value: u64,
  bytes: [u8; 9],
  len: u8,
}

impl VarInt {
  pub(crate) fn as_bytes(&self) -> &[u8] {
    &self.bytes[..usize::from(self.len)]
  }
}

/// Byte-level reader over one block file.
///
/// Owns the cursor and a fixed scratch buffer reused for skips, so decoding
/// never touches process-wide state. Every read advances `position`, which
/// is an absolute offset into the file.
pub(crate) struct Reader<R> {
  inner: R,
  file: u16,
  position: u64,
  scratch: [u8; SCRATCH_SIZE],
}

impl<R: Read> Reader<R> {
  pub(crate) fn new(inner: R, file: u16, position: u64) -> Self {
    Self {
      inner,
      file,
      position,
      scratch: [0; SCRATCH_SIZE],
    }
  }

  pub(crate) fn position(&self) -> u64 {
    self.position
  }

  pub(crate) fn read_u8(&mut self) -> Result<u8, ParseError> {
    let value = self.inner.read_u8().context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += 1;
    Ok(value)
  }

  pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
    let value = self.inner.read_u16::<LittleEndian>().context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += 2;
    Ok(value)
  }

  pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
    let value = self.inner.read_u32::<LittleEndian>().context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += 4;
    Ok(value)
  }

  pub(crate) fn read_u64(&mut self) -> Result<u64, ParseError> {
    let value = self.inner.read_u64::<LittleEndian>().context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += 8;
    Ok(value)
  }

  pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
    let mut buffer = [0; N];
    self.inner.read_exact(&mut buffer).context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += N as u64;
    Ok(buffer)
  }

  pub(crate) fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
    let mut buffer = vec![0; len];
    self.inner.read_exact(&mut buffer).context(IoSnafu {
      file: self.file,
      offset: self.position,
    })?;
    self.position += len as u64;
    Ok(buffer)
  }

  /// Advance the cursor without keeping the bytes. Works on plain `Read`
  /// streams, draining through the scratch buffer.
  pub(crate) fn skip(&mut self, mut len: u64) -> Result<(), ParseError> {
    while len > 0 {
      let chunk = len.min(SCRATCH_SIZE as u64) as usize;
      self.inner.read_exact(&mut self.scratch[..chunk]).context(IoSnafu {
        file: self.file,
        offset: self.position,
      })?;
      self.position += chunk as u64;
      len -= chunk as u64;
    }
    Ok(())
  }

  /// Read a Bitcoin CompactSize integer: one byte `b`, with `b == 253`,
  /// `254` and `255` escaping to little-endian u16, u32 and u64.
  pub(crate) fn read_varint(&mut self) -> Result<VarInt, ParseError> {
    let first = self.read_u8()?;
    self.read_varint_after(first)
  }

  /// Continue a CompactSize whose first byte the caller already consumed,
  /// as happens after probing for the segwit marker.
  pub(crate) fn read_varint_after(&mut self, first: u8) -> Result<VarInt, ParseError> {
    let offset = self.position - 1;

    let mut bytes = [0; 9];
    bytes[0] = first;

    let (value, len) = match first {
      0..=252 => (u64::from(first), 1),
      253 => {
        let value = self.read_u16()?;
        bytes[1..3].copy_from_slice(&value.to_le_bytes());
        (u64::from(value), 3)
      }
      254 => {
        let value = self.read_u32()?;
        bytes[1..5].copy_from_slice(&value.to_le_bytes());
        (u64::from(value), 5)
      }
      255 => {
        let value = self.read_u64()?;
        bytes[1..9].copy_from_slice(&value.to_le_bytes());
        (value, 9)
      }
    };

    ensure!(
      value <= MAX_COUNT,
      VarintOverflowSnafu {
        file: self.file,
        offset,
        value,
      }
    );

    Ok(VarInt { value, bytes, len })
  }
}
