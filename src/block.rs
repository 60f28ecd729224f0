use super::*;

/// Where a framed block sits on disk: which `blkNNNNN.dat` file, and the
/// byte offset of the frame's magic marker within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockLocator {
  pub file_number: u16,
  pub file_position: u32,
}

impl Display for BlockLocator {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "blk{:05}.dat@{}", self.file_number, self.file_position)
  }
}

/// Header-only scan result: just enough to assemble chains and to find the
/// frame again for a deep parse.
///
/// `prev`, `next` and `part_of_chain` are scratch fields owned by the chain
/// assembler; they index into the scan-order arena the record lives in.
#[derive(Debug, Clone)]
pub struct HeaderRecord {
  pub hash: BlockHash,
  pub prev_hash: BlockHash,
  pub payload_size: u32,
  pub locator: BlockLocator,
  pub(crate) prev: Option<u32>,
  pub(crate) next: Option<u32>,
  pub(crate) part_of_chain: bool,
}

impl HeaderRecord {
  pub(crate) fn new(
    hash: BlockHash,
    prev_hash: BlockHash,
    payload_size: u32,
    locator: BlockLocator,
  ) -> Self {
    Self {
      hash,
      prev_hash,
      payload_size,
      locator,
      prev: None,
      next: None,
      part_of_chain: false,
    }
  }

  pub fn is_genesis(&self) -> bool {
    self.prev_hash == BlockHash::all_zeros()
  }
}

/// A fully deserialized block.
///
/// Hashes are kept in the byte order they appear on disk; `Display` on the
/// `bitcoin` hash types renders the conventional byte-reversed hex form.
#[derive(Debug, Clone)]
pub struct Block {
  pub hash: BlockHash,
  pub size: u32,
  pub version: u32,
  pub prev_hash: BlockHash,
  pub merkle_root: [u8; 32],
  pub timestamp: u32,
  pub bits: [u8; 4],
  pub nonce: u32,
  pub transactions: Vec<Transaction>,
}

/// One witness stack, as pushed for a single input.
pub type WitnessStack = Vec<Vec<u8>>;

#[derive(Debug, Clone)]
pub struct Transaction {
  pub txid: Txid,
  pub wtxid: Wtxid,
  pub version: u32,
  pub witness: bool,
  pub size: u64,
  pub base_size: u64,
  pub weight: u64,
  pub vsize: u64,
  pub inputs: Vec<TxInput>,
  pub outputs: Vec<TxOutput>,
  /// One stack per input when `witness` is set, empty otherwise.
  pub witness_items: Vec<WitnessStack>,
  pub locktime: u32,
}

#[derive(Debug, Clone)]
pub struct TxInput {
  pub source_txid: Txid,
  pub output_index: u32,
  pub script: ScriptBuf,
  pub sequence: u32,
}

#[derive(Debug, Clone)]
pub struct TxOutput {
  /// Satoshis.
  pub value: u64,
  pub script: ScriptBuf,
}
