use {
  snafu::Snafu,
  std::{io, path::PathBuf},
};

/// Failures raised while reading and decoding `blk*.dat` files.
///
/// Decode failures are fatal for the run; I/O failures during a header scan
/// are fatal for the file being scanned but let the run continue with the
/// next file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
  #[snafu(display("listing block files in {}: {source}", path.display()))]
  BlocksDir { path: PathBuf, source: io::Error },

  #[snafu(display("no blk*.dat files in {}", path.display()))]
  NoBlockFiles { path: PathBuf },

  #[snafu(display("block file {number} is not on disk"))]
  MissingBlockFile { number: u16 },

  #[snafu(display("opening block file {number}: {source}"))]
  OpenBlockFile {
    number: u16,
    source: io::Error,
  },

  #[snafu(display("reading block file {file} at offset {offset}: {source}"))]
  Io {
    file: u16,
    offset: u64,
    source: io::Error,
  },

  #[snafu(display("varint {value:#x} in block file {file} at offset {offset} exceeds 2^53"))]
  VarintOverflow { file: u16, offset: u64, value: u64 },

  #[snafu(display(
    "declared length {declared} in block file {file} at offset {offset} overruns the frame by {overrun} bytes"
  ))]
  LengthOverrun {
    file: u16,
    offset: u64,
    declared: u64,
    overrun: u64,
  },

  #[snafu(display(
    "block frame in file {file} at offset {offset} declares {declared} payload bytes but decoding consumed {consumed}"
  ))]
  PayloadMismatch {
    file: u16,
    offset: u32,
    declared: u32,
    consumed: u64,
  },

  #[snafu(display(
    "witness marker in block file {file} at offset {offset} followed by flag {flag:#04x}, expected 0x01"
  ))]
  WitnessFlag { file: u16, offset: u64, flag: u8 },
}

impl ParseError {
  /// True when the error is a clean end-of-file hit while looking for the
  /// next frame, as opposed to running dry in the middle of one.
  pub(crate) fn is_unexpected_eof(&self) -> bool {
    matches!(
      self,
      Self::Io { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof
    )
  }
}
