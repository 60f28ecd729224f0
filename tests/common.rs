use super::*;

pub(crate) const MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

pub(crate) fn p2pkh_script(seed: u8) -> Vec<u8> {
  let mut script = vec![0x76, 0xa9, 0x14];
  script.extend_from_slice(&[seed; 20]);
  script.extend_from_slice(&[0x88, 0xac]);
  script
}

/// The address the script from [`p2pkh_script`] pays to.
pub(crate) fn p2pkh_address(seed: u8) -> String {
  Address::p2pkh(PubkeyHash::from_byte_array([seed; 20]), Network::Bitcoin).to_string()
}

/// A minimal non-witness transaction with one input (so `seed` makes the
/// txid unique) and one p2pkh output per output seed.
pub(crate) fn transaction(seed: u8, output_seeds: &[u8]) -> (Vec<u8>, Txid) {
  let mut bytes = Vec::new();

  bytes.extend_from_slice(&1u32.to_le_bytes());
  bytes.push(0x01);
  bytes.extend_from_slice(&[seed; 32]);
  bytes.extend_from_slice(&0xffffffffu32.to_le_bytes());
  bytes.push(0x01);
  bytes.push(seed);
  bytes.extend_from_slice(&0xffffffffu32.to_le_bytes());

  bytes.push(output_seeds.len() as u8);
  for &output_seed in output_seeds {
    bytes.extend_from_slice(&50_000u64.to_le_bytes());
    let script = p2pkh_script(output_seed);
    bytes.push(script.len() as u8);
    bytes.extend_from_slice(&script);
  }

  bytes.extend_from_slice(&0u32.to_le_bytes());

  let txid = Txid::from_raw_hash(sha256d::Hash::hash(&bytes));

  (bytes, txid)
}

pub(crate) fn block(
  prev: BlockHash,
  transactions: &[(Vec<u8>, Txid)],
  nonce: u32,
) -> (Vec<u8>, BlockHash) {
  let mut header = Vec::new();

  header.extend_from_slice(&2u32.to_le_bytes());
  header.extend_from_slice(&prev.to_byte_array());
  header.extend_from_slice(&transactions[0].1.to_byte_array());
  header.extend_from_slice(&0x60000000u32.to_le_bytes());
  header.extend_from_slice(&[0xff, 0xff, 0x00, 0x1d]);
  header.extend_from_slice(&nonce.to_le_bytes());

  let hash = BlockHash::from_raw_hash(sha256d::Hash::hash(&header));

  let mut body = header;
  body.push(transactions.len() as u8);
  for (bytes, _) in transactions {
    body.extend_from_slice(bytes);
  }

  (body, hash)
}

pub(crate) fn frame(body: &[u8]) -> Vec<u8> {
  let mut bytes = Vec::new();
  bytes.extend_from_slice(&MAGIC);
  bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
  bytes.extend_from_slice(body);
  bytes
}

/// A synthetic node data directory: builds chains of one-transaction blocks,
/// writes them as `blk*.dat` files, and runs the indexer over them.
pub(crate) struct TestNode {
  pub(crate) blocks: TempDir,
  pub(crate) home: TempDir,
  frames: Vec<(u16, Vec<u8>)>,
  pub(crate) hashes: Vec<BlockHash>,
  pub(crate) txids: Vec<Txid>,
  pub(crate) seeds: Vec<u8>,
  next_seed: u8,
}

impl TestNode {
  pub(crate) fn new() -> Self {
    Self {
      blocks: TempDir::new().unwrap(),
      home: TempDir::new().unwrap(),
      frames: Vec::new(),
      hashes: Vec::new(),
      txids: Vec::new(),
      seeds: Vec::new(),
      next_seed: 1,
    }
  }

  pub(crate) fn tip(&self) -> BlockHash {
    self.hashes.last().copied().unwrap_or_else(BlockHash::all_zeros)
  }

  pub(crate) fn add_block(&mut self) -> BlockHash {
    self.add_block_to_file(0)
  }

  pub(crate) fn add_block_to_file(&mut self, file: u16) -> BlockHash {
    let prev = self.tip();
    self.add_block_with_prev(file, prev)
  }

  /// Append a block extending `prev`, which lets tests write stale forks.
  pub(crate) fn add_block_with_prev(&mut self, file: u16, prev: BlockHash) -> BlockHash {
    let seed = self.next_seed;
    self.next_seed += 1;

    let transaction = transaction(seed, &[seed]);
    let (body, hash) = block(prev, &[transaction.clone()], u32::from(seed));

    self.frames.push((file, frame(&body)));
    self.hashes.push(hash);
    self.txids.push(transaction.1);
    self.seeds.push(seed);

    self.flush();

    hash
  }

  pub(crate) fn add_blocks(&mut self, count: usize) {
    for _ in 0..count {
      self.add_block();
    }
  }

  /// Drop every block past the first `keep`, rewriting the files as a
  /// reorganizing node would.
  pub(crate) fn truncate_chain(&mut self, keep: usize) {
    self.frames.truncate(keep);
    self.hashes.truncate(keep);
    self.txids.truncate(keep);
    self.seeds.truncate(keep);
    self.flush();
  }

  fn flush(&self) {
    let mut files: BTreeMap<u16, Vec<u8>> = BTreeMap::new();

    for (file, frame) in &self.frames {
      files.entry(*file).or_default().extend_from_slice(frame);
    }

    for (file, contents) in files {
      fs::write(
        self.blocks.path().join(format!("blk{file:05}.dat")),
        contents,
      )
      .unwrap();
    }
  }

  pub(crate) fn index_path(&self) -> PathBuf {
    self.home.path().join("index.redb")
  }

  pub(crate) fn open_index(&self, reorg_window: u64) -> AddressIndex {
    AddressIndex::open(&self.index_path(), Network::Bitcoin, reorg_window).unwrap()
  }

  pub(crate) fn run(&self, reorg_window: u64) -> magpie::index::Summary {
    self.try_run(reorg_window).unwrap()
  }

  pub(crate) fn try_run(&self, reorg_window: u64) -> magpie::Result<magpie::index::Summary> {
    let mut index = self.open_index(reorg_window);
    let reader = BlockFileReader::open(self.blocks.path())?;
    Updater::new(&mut index, reader, reorg_window).run()
  }
}
