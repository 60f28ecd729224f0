//! Reader for the node's on-disk `blk*.dat` block files.
//!
//! Each file holds a sequence of frames: 4 bytes of network magic, a
//! little-endian u32 payload size, then the raw serialized block. Frames
//! appear in the order the node saw them, which is not chain order.
//!
//! Two modes: a *scan* walks whole files cheaply and yields one
//! [`HeaderRecord`] per frame for chain assembly; a *deep* read seeks to a
//! known [`BlockLocator`] and decodes the full transaction payload.

use {
  self::reader::Reader,
  super::*,
  crate::error::{
    BlocksDirSnafu, IoSnafu, LengthOverrunSnafu, MissingBlockFileSnafu, NoBlockFilesSnafu,
    OpenBlockFileSnafu, ParseError, PayloadMismatchSnafu, WitnessFlagSnafu,
  },
  regex::Regex,
  snafu::{OptionExt, ResultExt, ensure},
  std::io::Read,
};

pub mod reader;

/// Where a resumed scan picks up: the locator of the first frame to read
/// and the chain height it is known to sit at (telemetry only).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStart {
  pub file_number: u16,
  pub file_position: u32,
  pub height: u64,
}

impl From<BlockLocator> for ScanStart {
  fn from(locator: BlockLocator) -> Self {
    Self {
      file_number: locator.file_number,
      file_position: locator.file_position,
      height: 0,
    }
  }
}

pub struct BlockFileReader {
  files: BTreeMap<u16, PathBuf>,
  open: Option<(u16, BufReader<File>)>,
}

impl BlockFileReader {
  /// List `blk<NNNNN>.dat` files (1-5 decimal digits) under `blocks_dir`.
  pub fn open(blocks_dir: &Path) -> Result<Self, ParseError> {
    let pattern = Regex::new(r"^blk(\d{1,5})\.dat$").unwrap();

    let mut files = BTreeMap::new();

    for entry in
      ResultExt::context(fs::read_dir(blocks_dir), BlocksDirSnafu { path: blocks_dir })?
    {
      let entry = ResultExt::context(entry, BlocksDirSnafu { path: blocks_dir })?;

      let name = entry.file_name();

      let Some(name) = name.to_str() else {
        continue;
      };

      if let Some(captures) = pattern.captures(name)
        && let Ok(number) = captures[1].parse::<u16>()
      {
        files.insert(number, entry.path());
      }
    }

    ensure!(!files.is_empty(), NoBlockFilesSnafu { path: blocks_dir });

    Ok(Self { files, open: None })
  }

  /// Scan mode: iterate frames from `start`, reading only the 80-byte
  /// header of each block. A short read stops the file being scanned, not
  /// the run.
  pub fn scan(&self, start: ScanStart) -> Result<Vec<HeaderRecord>, ParseError> {
    let mut records = Vec::new();

    let mut position = u64::from(start.file_position);

    for (&number, path) in self.files.range(start.file_number..) {
      self.scan_file(number, path, position, &mut records)?;
      position = 0;
    }

    log::info!(
      "scanned {} block headers from height {} on",
      records.len(),
      start.height,
    );

    Ok(records)
  }

  fn scan_file(
    &self,
    number: u16,
    path: &Path,
    start_position: u64,
    records: &mut Vec<HeaderRecord>,
  ) -> Result<(), ParseError> {
    let mut file = ResultExt::context(File::open(path), OpenBlockFileSnafu { number })?;

    if start_position > 0 {
      ResultExt::context(
        file.seek(SeekFrom::Start(start_position)),
        IoSnafu {
          file: number,
          offset: start_position,
        },
      )?;
    }

    let mut reader = Reader::new(BufReader::new(file), number, start_position);

    loop {
      match scan_frame(&mut reader, number) {
        Ok(Some(record)) => records.push(record),
        Ok(None) => break,
        Err(err) => {
          log::warn!("stopping scan of blk{number:05}.dat: {err}");
          break;
        }
      }
    }

    Ok(())
  }

  /// Deep mode: seek to `locator` and decode the full block. The file
  /// handle is kept open until a locator in a different file comes along.
  pub fn read_block(&mut self, locator: BlockLocator) -> Result<Block, ParseError> {
    let mut reader = self.frame_reader(locator)?;

    let frame_start = reader.position();

    let _magic = reader.read_u32()?;
    let payload_size = reader.read_u32()?;

    let block = parse_block_body(&mut reader, payload_size, locator.file_number)?;

    let consumed = reader.position() - frame_start;

    ensure!(
      consumed == u64::from(payload_size) + 8,
      PayloadMismatchSnafu {
        file: locator.file_number,
        offset: locator.file_position,
        declared: payload_size,
        consumed: consumed - 8,
      }
    );

    Ok(block)
  }

  fn frame_reader(
    &mut self,
    locator: BlockLocator,
  ) -> Result<Reader<&mut BufReader<File>>, ParseError> {
    let position = u64::from(locator.file_position);

    let already_open = matches!(&self.open, Some((number, _)) if *number == locator.file_number);

    let file = if already_open {
      &mut self.open.as_mut().unwrap().1
    } else {
      let path = OptionExt::context(
        self.files.get(&locator.file_number),
        MissingBlockFileSnafu {
          number: locator.file_number,
        },
      )?;

      let file = ResultExt::context(
        File::open(path),
        OpenBlockFileSnafu {
          number: locator.file_number,
        },
      )?;

      &mut self.open.insert((locator.file_number, BufReader::new(file))).1
    };

    ResultExt::context(
      file.seek(SeekFrom::Start(position)),
      IoSnafu {
        file: locator.file_number,
        offset: position,
      },
    )?;

    Ok(Reader::new(file, locator.file_number, position))
  }
}

fn scan_frame<R: Read>(
  reader: &mut Reader<R>,
  number: u16,
) -> Result<Option<HeaderRecord>, ParseError> {
  let frame_start = reader.position();

  // End of file between frames is the normal way a scan ends.
  let _magic = match reader.read_u32() {
    Err(err) if err.is_unexpected_eof() => return Ok(None),
    other => other?,
  };

  let payload_size = reader.read_u32()?;

  // Zeroed tail space after the last frame.
  if payload_size == 0 {
    return Ok(None);
  }

  ensure!(
    payload_size >= 81,
    LengthOverrunSnafu {
      file: number,
      offset: frame_start + 4,
      declared: u64::from(payload_size),
      overrun: u64::from(81 - payload_size),
    }
  );

  let header: [u8; 80] = reader.read_array()?;

  let record = header_record(
    &header,
    payload_size,
    BlockLocator {
      file_number: number,
      file_position: frame_start as u32,
    },
  );

  reader.skip(u64::from(payload_size) - 80)?;

  Ok(Some(record))
}

fn header_record(header: &[u8; 80], payload_size: u32, locator: BlockLocator) -> HeaderRecord {
  HeaderRecord::new(
    BlockHash::from_raw_hash(sha256d::Hash::hash(header)),
    BlockHash::from_byte_array(array32(&header[4..36])),
    payload_size,
    locator,
  )
}

fn parse_block_body<R: Read>(
  reader: &mut Reader<R>,
  payload_size: u32,
  file: u16,
) -> Result<Block, ParseError> {
  let body_start = reader.position();
  let frame_end = body_start + u64::from(payload_size);

  let header: [u8; 80] = reader.read_array()?;

  let tx_count = reader.read_varint()?;
  check_overrun(tx_count.value, frame_end, reader.position(), file)?;

  let mut transactions = Vec::new();

  for _ in 0..tx_count.value {
    transactions.push(parse_transaction(reader, frame_end, file)?);
  }

  Ok(Block {
    hash: BlockHash::from_raw_hash(sha256d::Hash::hash(&header)),
    size: payload_size,
    version: le_u32(&header[0..4]),
    prev_hash: BlockHash::from_byte_array(array32(&header[4..36])),
    merkle_root: array32(&header[36..68]),
    timestamp: le_u32(&header[68..72]),
    bits: [header[72], header[73], header[74], header[75]],
    nonce: le_u32(&header[76..80]),
    transactions,
  })
}

fn parse_transaction<R: Read>(
  reader: &mut Reader<R>,
  frame_end: u64,
  file: u16,
) -> Result<Transaction, ParseError> {
  // Every byte of the transaction in read order; txid and wtxid preimages
  // are carved out of this buffer by offset.
  let mut raw: Vec<u8> = Vec::with_capacity(256);

  let version = reader.read_u32()?;
  raw.extend_from_slice(&version.to_le_bytes());

  // A zero where the input count belongs is the BIP141 marker: no
  // transaction has zero inputs.
  let mut witness = false;
  let mut first = reader.read_u8()?;
  if first == 0 {
    let flag = reader.read_u8()?;
    ensure!(
      flag == 1,
      WitnessFlagSnafu {
        file,
        offset: reader.position() - 1,
        flag,
      }
    );
    witness = true;
    raw.extend_from_slice(&[0x00, 0x01]);
    first = reader.read_u8()?;
  }

  let input_count = read_count(reader, first, &mut raw, frame_end, file)?;

  let mut inputs = Vec::new();

  for _ in 0..input_count {
    let source: [u8; 32] = reader.read_array()?;
    raw.extend_from_slice(&source);

    let output_index = reader.read_u32()?;
    raw.extend_from_slice(&output_index.to_le_bytes());

    let script = read_buffer(reader, &mut raw, frame_end, file)?;

    let sequence = reader.read_u32()?;
    raw.extend_from_slice(&sequence.to_le_bytes());

    inputs.push(TxInput {
      source_txid: Txid::from_byte_array(source),
      output_index,
      script: ScriptBuf::from_bytes(script),
      sequence,
    });
  }

  let first = reader.read_u8()?;
  let output_count = read_count(reader, first, &mut raw, frame_end, file)?;

  let mut outputs = Vec::new();

  for _ in 0..output_count {
    let value = reader.read_u64()?;
    raw.extend_from_slice(&value.to_le_bytes());

    let script = read_buffer(reader, &mut raw, frame_end, file)?;

    outputs.push(TxOutput {
      value,
      script: ScriptBuf::from_bytes(script),
    });
  }

  let witness_start = raw.len();

  let mut witness_items: Vec<WitnessStack> = Vec::new();

  if witness {
    for _ in 0..input_count {
      let first = reader.read_u8()?;
      let stack_len = read_count(reader, first, &mut raw, frame_end, file)?;

      let mut stack = WitnessStack::new();

      for _ in 0..stack_len {
        stack.push(read_buffer(reader, &mut raw, frame_end, file)?);
      }

      witness_items.push(stack);
    }
  }

  let witness_end = raw.len();

  let locktime = reader.read_u32()?;
  raw.extend_from_slice(&locktime.to_le_bytes());

  let size = raw.len() as u64;

  let base_size = if witness {
    size - 2 - (witness_end - witness_start) as u64
  } else {
    size
  };

  // The txid preimage is the non-witness serialization: marker, flag and
  // witness stacks are excluded. The wtxid covers every byte.
  let (txid, wtxid) = if witness {
    let mut engine = sha256d::Hash::engine();
    engine.input(&raw[0..4]);
    engine.input(&raw[6..witness_start]);
    engine.input(&raw[witness_end..]);
    let txid = Txid::from_raw_hash(sha256d::Hash::from_engine(engine));
    let wtxid = Wtxid::from_raw_hash(sha256d::Hash::hash(&raw));
    (txid, wtxid)
  } else {
    let digest = sha256d::Hash::hash(&raw);
    (
      Txid::from_raw_hash(digest),
      Wtxid::from_raw_hash(digest),
    )
  };

  let weight = base_size * 3 + size;

  Ok(Transaction {
    txid,
    wtxid,
    version,
    witness,
    size,
    base_size,
    weight,
    vsize: weight.div_ceil(4),
    inputs,
    outputs,
    witness_items,
    locktime,
  })
}

/// Finish a CompactSize whose first byte is already in hand, append its
/// exact encoding to the preimage buffer, and bound it by the frame.
fn read_count<R: Read>(
  reader: &mut Reader<R>,
  first: u8,
  raw: &mut Vec<u8>,
  frame_end: u64,
  file: u16,
) -> Result<u64, ParseError> {
  let varint = reader.read_varint_after(first)?;
  raw.extend_from_slice(varint.as_bytes());
  check_overrun(varint.value, frame_end, reader.position(), file)?;
  Ok(varint.value)
}

/// Read a varint-prefixed byte buffer, appending prefix and contents to the
/// preimage buffer.
fn read_buffer<R: Read>(
  reader: &mut Reader<R>,
  raw: &mut Vec<u8>,
  frame_end: u64,
  file: u16,
) -> Result<Vec<u8>, ParseError> {
  let len = reader.read_varint()?;
  raw.extend_from_slice(len.as_bytes());
  check_overrun(len.value, frame_end, reader.position(), file)?;

  let buffer = reader.read_vec(len.value as usize)?;
  raw.extend_from_slice(&buffer);

  Ok(buffer)
}

fn check_overrun(declared: u64, frame_end: u64, position: u64, file: u16) -> Result<(), ParseError> {
  let remaining = frame_end.saturating_sub(position);
  ensure!(
    declared <= remaining,
    LengthOverrunSnafu {
      file,
      offset: position,
      declared,
      overrun: declared - remaining,
    }
  );
  Ok(())
}

fn le_u32(bytes: &[u8]) -> u32 {
  let mut buffer = [0; 4];
  buffer.copy_from_slice(bytes);
  u32::from_le_bytes(buffer)
}

fn array32(bytes: &[u8]) -> [u8; 32] {
  let mut buffer = [0; 32];
  buffer.copy_from_slice(bytes);
  buffer
}

#[cfg(test)]
mod tests {
  use {super::*, std::io::Cursor, tempfile::TempDir};

  const MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

  /// The 285-byte mainnet genesis block, exactly as framed in blk00000.dat.
  const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

  const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

  const GENESIS_COINBASE_TXID: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

  fn frame(body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
  }

  fn write_blk(dir: &TempDir, number: u16, contents: &[u8]) {
    fs::write(dir.path().join(format!("blk{number:05}.dat")), contents).unwrap();
  }

  fn genesis_body() -> Vec<u8> {
    hex::decode(GENESIS).unwrap()
  }

  #[test]
  fn scan_yields_genesis_header() {
    let dir = TempDir::new().unwrap();
    write_blk(&dir, 0, &frame(&genesis_body()));

    let reader = BlockFileReader::open(dir.path()).unwrap();
    let records = reader.scan(ScanStart::default()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].hash.to_string(), GENESIS_HASH);
    assert!(records[0].is_genesis());
    assert_eq!(records[0].payload_size, 285);
    assert_eq!(
      records[0].locator,
      BlockLocator {
        file_number: 0,
        file_position: 0,
      }
    );
  }

  #[test]
  fn deep_parse_of_genesis_block() {
    let dir = TempDir::new().unwrap();
    write_blk(&dir, 0, &frame(&genesis_body()));

    let mut reader = BlockFileReader::open(dir.path()).unwrap();
    let block = reader
      .read_block(BlockLocator {
        file_number: 0,
        file_position: 0,
      })
      .unwrap();

    assert_eq!(block.hash.to_string(), GENESIS_HASH);
    assert_eq!(block.version, 1);
    assert_eq!(block.timestamp, 0x495fab29);
    assert_eq!(block.bits, [0xff, 0xff, 0x00, 0x1d]);
    assert_eq!(block.nonce, 0x7c2bac1d);
    assert_eq!(block.size, 285);
    assert_eq!(block.transactions.len(), 1);

    let coinbase = &block.transactions[0];
    assert_eq!(coinbase.txid.to_string(), GENESIS_COINBASE_TXID);
    assert_eq!(coinbase.txid.to_byte_array(), block.merkle_root);
    assert!(!coinbase.witness);
    assert_eq!(coinbase.txid, Txid::from_raw_hash(coinbase.wtxid.to_raw_hash()));
    assert_eq!(coinbase.size, 204);
    assert_eq!(coinbase.base_size, 204);
    assert_eq!(coinbase.weight, 816);
    assert_eq!(coinbase.vsize, 204);
    assert_eq!(coinbase.outputs[0].value, 50 * 100_000_000);
  }

  fn witness_transaction() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u32.to_le_bytes()); // version
    bytes.extend_from_slice(&[0x00, 0x01]); // marker, flag
    bytes.push(0x01); // input count
    bytes.extend_from_slice(&[0xaa; 32]); // source txid
    bytes.extend_from_slice(&1u32.to_le_bytes()); // output index
    bytes.push(0x00); // empty input script
    bytes.extend_from_slice(&0xffffffffu32.to_le_bytes()); // sequence
    bytes.push(0x01); // output count
    bytes.extend_from_slice(&50_000u64.to_le_bytes()); // value
    bytes.push(0x16); // script length 22
    bytes.push(0x00); // OP_0
    bytes.push(0x14); // push 20
    bytes.extend_from_slice(&[0xbb; 20]);
    bytes.push(0x02); // witness stack of two items
    bytes.push(0x02);
    bytes.extend_from_slice(&[0xcc, 0xdd]);
    bytes.push(0x01);
    bytes.push(0xee);
    bytes.extend_from_slice(&0u32.to_le_bytes()); // locktime
    bytes
  }

  fn parse_lone_transaction(bytes: &[u8]) -> Transaction {
    let mut reader = Reader::new(Cursor::new(bytes), 0, 0);
    parse_transaction(&mut reader, bytes.len() as u64, 0).unwrap()
  }

  #[test]
  fn witness_marker_sets_witness_and_splits_ids() {
    let bytes = witness_transaction();
    assert_eq!(bytes[4], 0x00);
    assert_eq!(bytes[5], 0x01);

    let transaction = parse_lone_transaction(&bytes);

    assert!(transaction.witness);
    assert_eq!(transaction.inputs.len(), 1);
    assert_eq!(transaction.outputs.len(), 1);
    assert_eq!(transaction.witness_items.len(), 1);
    assert_eq!(transaction.witness_items[0].len(), 2);
    assert_eq!(transaction.witness_items[0][0], vec![0xcc, 0xdd]);
    assert_ne!(
      transaction.txid.to_byte_array(),
      transaction.wtxid.to_byte_array(),
    );
    assert_eq!(transaction.size, bytes.len() as u64);
    // marker + flag plus the six bytes of witness section
    assert_eq!(transaction.base_size, bytes.len() as u64 - 2 - 6);
    assert_eq!(
      transaction.weight,
      transaction.base_size * 3 + transaction.size,
    );
    assert_eq!(transaction.vsize, transaction.weight.div_ceil(4));
  }

  #[test]
  fn identifiers_agree_with_reference_deserializer() {
    for bytes in [witness_transaction(), {
      let body = genesis_body();
      body[81..].to_vec()
    }] {
      let ours = parse_lone_transaction(&bytes);
      let reference: bitcoin::Transaction =
        bitcoin::consensus::encode::deserialize(&bytes).unwrap();

      assert_eq!(ours.txid, reference.compute_txid());
      assert_eq!(ours.wtxid, reference.compute_wtxid());
      assert_eq!(ours.weight, reference.weight().to_wu());
      assert_eq!(ours.vsize, reference.vsize() as u64);
    }
  }

  #[test]
  fn nonwitness_txid_equals_wtxid() {
    let body = genesis_body();
    let transaction = parse_lone_transaction(&body[81..]);
    assert!(!transaction.witness);
    assert_eq!(
      transaction.txid.to_byte_array(),
      transaction.wtxid.to_byte_array(),
    );
  }

  #[test]
  fn scan_stops_at_zeroed_tail() {
    let dir = TempDir::new().unwrap();
    let mut contents = frame(&genesis_body());
    contents.extend_from_slice(&[0; 64]);
    write_blk(&dir, 0, &contents);

    let reader = BlockFileReader::open(dir.path()).unwrap();
    let records = reader.scan(ScanStart::default()).unwrap();

    assert_eq!(records.len(), 1);
  }

  #[test]
  fn scan_resumes_mid_file() {
    let dir = TempDir::new().unwrap();
    let first = frame(&genesis_body());
    let mut contents = first.clone();
    contents.extend_from_slice(&frame(&genesis_body()));
    write_blk(&dir, 0, &contents);

    let reader = BlockFileReader::open(dir.path()).unwrap();

    let all = reader.scan(ScanStart::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].locator.file_position, first.len() as u32);

    let resumed = reader
      .scan(ScanStart {
        file_number: 0,
        file_position: first.len() as u32,
        height: 1,
      })
      .unwrap();
    assert_eq!(resumed.len(), 1);
    assert_eq!(resumed[0].locator.file_position, first.len() as u32);
  }

  #[test]
  fn scan_spans_files_in_numeric_order() {
    let dir = TempDir::new().unwrap();
    write_blk(&dir, 1, &frame(&genesis_body()));
    write_blk(&dir, 0, &frame(&genesis_body()));

    let reader = BlockFileReader::open(dir.path()).unwrap();
    let records = reader.scan(ScanStart::default()).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].locator.file_number, 0);
    assert_eq!(records[1].locator.file_number, 1);
  }

  #[test]
  fn truncated_frame_stops_file_without_failing_scan() {
    let dir = TempDir::new().unwrap();
    let mut contents = frame(&genesis_body());
    contents.truncate(contents.len() - 10);
    write_blk(&dir, 0, &contents);
    write_blk(&dir, 1, &frame(&genesis_body()));

    let reader = BlockFileReader::open(dir.path()).unwrap();
    let records = reader.scan(ScanStart::default()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].locator.file_number, 1);
  }

  #[test]
  fn payload_size_mismatch_is_fatal_in_deep_mode() {
    let dir = TempDir::new().unwrap();
    let mut body = genesis_body();
    body.extend_from_slice(&[0x00; 4]); // slack the decoder will not consume
    write_blk(&dir, 0, &frame(&body));

    let mut reader = BlockFileReader::open(dir.path()).unwrap();
    let error = reader
      .read_block(BlockLocator {
        file_number: 0,
        file_position: 0,
      })
      .unwrap_err();

    assert!(matches!(
      error,
      ParseError::PayloadMismatch {
        declared: 289,
        consumed: 285,
        ..
      }
    ));
  }

  #[test]
  fn script_length_overrunning_frame_is_fatal() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.push(0x01);
    bytes.extend_from_slice(&[0x00; 32]);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.push(0xfd); // declares a 0x4000-byte script in a tiny frame
    bytes.extend_from_slice(&[0x00, 0x40]);

    let mut reader = Reader::new(Cursor::new(bytes.as_slice()), 0, 0);
    let error = parse_transaction(&mut reader, bytes.len() as u64, 0).unwrap_err();

    assert!(matches!(error, ParseError::LengthOverrun { .. }));
  }

  #[test]
  fn bad_witness_flag_is_fatal() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&[0x00, 0x02]);

    let mut reader = Reader::new(Cursor::new(bytes.as_slice()), 0, 0);
    let error = parse_transaction(&mut reader, bytes.len() as u64, 0).unwrap_err();

    assert!(matches!(error, ParseError::WitnessFlag { flag: 0x02, .. }));
  }

  #[test]
  fn missing_block_file_reported() {
    let dir = TempDir::new().unwrap();
    write_blk(&dir, 0, &frame(&genesis_body()));

    let mut reader = BlockFileReader::open(dir.path()).unwrap();
    let error = reader
      .read_block(BlockLocator {
        file_number: 3,
        file_position: 0,
      })
      .unwrap_err();

    assert!(matches!(error, ParseError::MissingBlockFile { number: 3 }));
  }
}
