//! The persistent address/transaction index.
//!
//! One redb database, five tables playing the role of column families:
//!
//! | table       | key                  | value                              |
//! |-------------|----------------------|------------------------------------|
//! | `meta`      | marker name          | 32-byte hash or u64 LE count       |
//! | `blockinfo` | block hash           | 112-byte [`BlockInfo`] record      |
//! | `block`     | block hash           | concatenated txids (reorg window)  |
//! | `tx`        | txid                 | packed address list (reorg window) |
//! | `address`   | address string bytes | concatenated txids, append-only    |
//!
//! `address` rows grow forever; `block` and `tx` rows are only retained for
//! the trailing reorg window so a reorganization can be undone without
//! re-reading disk.

use {
  super::*,
  redb::{Database, ReadableDatabase, ReadableTable, TableDefinition},
};

pub use self::{
  entry::BlockInfo,
  search::IndexSearch,
  updater::{Summary, Updater},
};

pub mod entry;
pub mod search;
pub mod updater;

use self::entry::BlockInfoValue;

type HashValue = [u8; 32];

const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const ADDRESS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("address");
const TX: TableDefinition<HashValue, &[u8]> = TableDefinition::new("tx");
const BLOCK: TableDefinition<HashValue, &[u8]> = TableDefinition::new("block");
const BLOCKINFO: TableDefinition<HashValue, BlockInfoValue> = TableDefinition::new("blockinfo");

const GENESIS_KEY: &str = "genesisBlockHash";
const TIP_KEY: &str = "tipBlockHash";
const BLOCK_COUNT_KEY: &str = "blockCount";

/// The callback surface the chain walk drives. The engine depends on this
/// interface only; [`AddressIndex`] is one implementation.
pub trait Indexer {
  fn should_parse_block_info(&self) -> bool;

  fn should_parse_block_body(&self) -> bool;

  /// Called once per block during the header pass, in height order.
  fn on_block_header(&mut self, height: u64, total: u64, info: &BlockInfo) -> Result;

  /// Called once per block during the deep pass, in height order.
  fn on_block(&mut self, height: u64, total: u64, block: &Block) -> Result;

  fn genesis(&self) -> Result<Option<BlockHash>>;

  fn tip(&self) -> Result<Option<BlockHash>>;

  fn block_count(&self) -> Result<Option<u64>>;

  fn block_info(&self, hash: BlockHash) -> Result<Option<BlockInfo>>;

  /// Walk the indexed chain tip → genesis and verify every block's
  /// `blockinfo` row exists and links up. Any mismatch is fatal.
  fn check_consistency(&self, tip: BlockHash, count: u64) -> Result;

  /// Drop `block` and `tx` rows for blocks that have fallen out of the
  /// reorg window.
  fn cleanup_reorg_cache(&mut self, tip: BlockHash) -> Result;

  /// Drop `block` and `tx` rows for blocks abandoned by a reorganization.
  fn evict_blocks(&mut self, hashes: &[BlockHash]) -> Result;
}

pub struct AddressIndex {
  database: Database,
  network: Network,
  reorg_window: u64,
}

impl AddressIndex {
  pub fn open(path: &Path, network: Network, reorg_window: u64) -> Result<Self> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }

    let database = Database::create(path)?;

    // TODO: batch blocks into one write transaction per commit interval
    // instead of committing per callback
    let wtx = database.begin_write()?;
    {
      wtx.open_table(META)?;
      wtx.open_table(ADDRESS)?;
      wtx.open_table(TX)?;
      wtx.open_table(BLOCK)?;
      wtx.open_table(BLOCKINFO)?;
    }
    wtx.commit()?;

    Ok(Self {
      database,
      network,
      reorg_window,
    })
  }

  fn meta_hash(&self, key: &str) -> Result<Option<BlockHash>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(META)?;

    let Some(guard) = table.get(key)? else {
      return Ok(None);
    };

    let bytes: [u8; 32] = guard
      .value()
      .try_into()
      .with_context(|| format!("malformed {key} entry in meta table"))?;

    Ok(Some(BlockHash::from_byte_array(bytes)))
  }

  fn evict_block_rows(&self, hash: BlockHash) -> Result<bool> {
    let wtx = self.database.begin_write()?;

    let removed;
    {
      let mut block_table = wtx.open_table(BLOCK)?;
      let mut tx_table = wtx.open_table(TX)?;

      match block_table.remove(&hash.to_byte_array())? {
        Some(guard) => {
          let txids = guard.value().to_vec();
          drop(guard);

          for chunk in txids.chunks_exact(32) {
            let mut txid = [0; 32];
            txid.copy_from_slice(chunk);
            tx_table.remove(&txid)?;
          }

          removed = true;
        }
        None => removed = false,
      }
    }
    wtx.commit()?;

    Ok(removed)
  }
}

impl Indexer for AddressIndex {
  fn should_parse_block_info(&self) -> bool {
    true
  }

  fn should_parse_block_body(&self) -> bool {
    true
  }

  fn on_block_header(&mut self, height: u64, total: u64, info: &BlockInfo) -> Result {
    let wtx = self.database.begin_write()?;
    {
      let mut blockinfo = wtx.open_table(BLOCKINFO)?;
      blockinfo.insert(&info.hash.to_byte_array(), &info.store())?;

      let mut meta = wtx.open_table(META)?;

      if info.is_genesis() {
        meta.insert(GENESIS_KEY, info.hash.to_byte_array().as_slice())?;
      }

      if info.is_tip() {
        meta.insert(TIP_KEY, info.hash.to_byte_array().as_slice())?;
      }

      if height + 1 == total {
        meta.insert(BLOCK_COUNT_KEY, total.to_le_bytes().as_slice())?;
      }
    }
    wtx.commit()?;

    Ok(())
  }

  fn on_block(&mut self, height: u64, total: u64, block: &Block) -> Result {
    let in_window = height + self.reorg_window >= total;

    let wtx = self.database.begin_write()?;
    {
      let mut address_table = wtx.open_table(ADDRESS)?;
      let mut tx_table = wtx.open_table(TX)?;

      for tx in &block.transactions {
        let mut tx_addresses: Vec<Vec<u8>> = Vec::new();

        for output in &tx.outputs {
          if output.script.is_empty() {
            continue;
          }

          for address in script::decode(&output.script, self.network).addresses {
            let key = address.to_string().into_bytes();

            // append-only: duplicates within a transaction are kept
            let mut row = match address_table.get(key.as_slice())? {
              Some(guard) => guard.value().to_vec(),
              None => Vec::new(),
            };
            row.extend_from_slice(&tx.txid.to_byte_array());
            address_table.insert(key.as_slice(), row.as_slice())?;

            if in_window {
              tx_addresses.push(key);
            }
          }
        }

        if in_window && !tx_addresses.is_empty() {
          tx_table.insert(&tx.txid.to_byte_array(), pack(&tx_addresses).as_slice())?;
        }
      }

      if in_window {
        let mut block_table = wtx.open_table(BLOCK)?;

        let mut txids = Vec::with_capacity(block.transactions.len() * 32);
        for tx in &block.transactions {
          txids.extend_from_slice(&tx.txid.to_byte_array());
        }

        block_table.insert(&block.hash.to_byte_array(), txids.as_slice())?;
      }
    }
    wtx.commit()?;

    Ok(())
  }

  fn genesis(&self) -> Result<Option<BlockHash>> {
    self.meta_hash(GENESIS_KEY)
  }

  fn tip(&self) -> Result<Option<BlockHash>> {
    self.meta_hash(TIP_KEY)
  }

  fn block_count(&self) -> Result<Option<u64>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(META)?;

    let Some(guard) = table.get(BLOCK_COUNT_KEY)? else {
      return Ok(None);
    };

    let bytes: [u8; 8] = guard
      .value()
      .try_into()
      .context("malformed blockCount entry in meta table")?;

    Ok(Some(u64::from_le_bytes(bytes)))
  }

  fn block_info(&self, hash: BlockHash) -> Result<Option<BlockInfo>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(BLOCKINFO)?;

    let Some(guard) = table.get(&hash.to_byte_array())? else {
      return Ok(None);
    };

    Ok(Some(BlockInfo::load(hash, &guard.value())))
  }

  fn check_consistency(&self, tip: BlockHash, count: u64) -> Result {
    let mut hash = tip;
    let mut walked = 0u64;

    loop {
      let info = self
        .block_info(hash)?
        .ok_or_else(|| anyhow!("blockinfo row missing for block {hash}"))?;

      walked += 1;

      if info.is_genesis() {
        break;
      }

      ensure!(
        walked <= count,
        "blockinfo walk exceeded the recorded block count {count}"
      );

      let prev = self
        .block_info(info.prev_hash)?
        .ok_or_else(|| anyhow!("blockinfo row missing for block {}", info.prev_hash))?;

      ensure!(
        prev.next_hash == Some(hash),
        "blockinfo chain broken between {} and {hash}",
        info.prev_hash,
      );

      hash = info.prev_hash;
    }

    ensure!(
      walked == count,
      "blockinfo walk found {walked} blocks, expected {count}"
    );

    log::info!("verified {walked} blockinfo entries");

    Ok(())
  }

  fn cleanup_reorg_cache(&mut self, tip: BlockHash) -> Result {
    // skip over the blocks the window retains
    let mut hash = tip;
    for _ in 0..self.reorg_window {
      let Some(info) = self.block_info(hash)? else {
        return Ok(());
      };

      if info.is_genesis() {
        return Ok(());
      }

      hash = info.prev_hash;
    }

    // delete backwards until hitting a block an earlier run already cleaned
    let mut evicted = 0u64;
    loop {
      if !self.evict_block_rows(hash)? {
        break;
      }

      evicted += 1;

      let Some(info) = self.block_info(hash)? else {
        break;
      };

      if info.is_genesis() {
        break;
      }

      hash = info.prev_hash;
    }

    if evicted > 0 {
      log::info!("evicted {evicted} blocks from the reorg cache");
    }

    Ok(())
  }

  fn evict_blocks(&mut self, hashes: &[BlockHash]) -> Result {
    for &hash in hashes {
      self.evict_block_rows(hash)?;
    }

    Ok(())
  }
}

/// Encode each address as a length byte followed by its bytes.
fn pack(addresses: &[Vec<u8>]) -> Vec<u8> {
  let mut packed = Vec::new();

  for address in addresses {
    packed.push(address.len() as u8);
    packed.extend_from_slice(address);
  }

  packed
}
