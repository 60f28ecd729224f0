use super::*;

/// Read-side queries over the index tables.
///
/// Block-hash and txid lookups only answer inside the reorg window, since
/// their rows are evicted beyond it; address lookups cover the whole chain.
pub trait IndexSearch {
  fn find_transaction_ids_by_address(&self, address: &str) -> Result<Vec<Txid>>;

  fn find_addresses_by_transaction_id(&self, txid: Txid) -> Result<Vec<String>>;

  fn find_transaction_ids_by_block_hash(&self, hash: BlockHash) -> Result<Vec<Txid>>;

  fn find_block_info_by_block_hash(&self, hash: BlockHash) -> Result<Option<BlockInfo>>;
}

impl IndexSearch for AddressIndex {
  fn find_transaction_ids_by_address(&self, address: &str) -> Result<Vec<Txid>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(ADDRESS)?;

    let Some(guard) = table.get(address.as_bytes())? else {
      return Ok(Vec::new());
    };

    txid_list(guard.value())
  }

  fn find_addresses_by_transaction_id(&self, txid: Txid) -> Result<Vec<String>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(TX)?;

    let Some(guard) = table.get(&txid.to_byte_array())? else {
      return Ok(Vec::new());
    };

    unpack(guard.value())
  }

  fn find_transaction_ids_by_block_hash(&self, hash: BlockHash) -> Result<Vec<Txid>> {
    let rtx = self.database.begin_read()?;
    let table = rtx.open_table(BLOCK)?;

    let Some(guard) = table.get(&hash.to_byte_array())? else {
      return Ok(Vec::new());
    };

    txid_list(guard.value())
  }

  fn find_block_info_by_block_hash(&self, hash: BlockHash) -> Result<Option<BlockInfo>> {
    self.block_info(hash)
  }
}

fn txid_list(bytes: &[u8]) -> Result<Vec<Txid>> {
  ensure!(
    bytes.len() % 32 == 0,
    "unexpected txid list size {}",
    bytes.len()
  );

  Ok(
    bytes
      .chunks_exact(32)
      .map(|chunk| {
        let mut txid = [0; 32];
        txid.copy_from_slice(chunk);
        Txid::from_byte_array(txid)
      })
      .collect(),
  )
}

/// Inverse of [`super::pack`]: length byte, then that many address bytes.
fn unpack(packed: &[u8]) -> Result<Vec<String>> {
  let mut addresses = Vec::new();
  let mut cursor = 0;

  while cursor < packed.len() {
    let len = usize::from(packed[cursor]);
    cursor += 1;

    ensure!(cursor + len <= packed.len(), "truncated address list");

    addresses.push(
      String::from_utf8(packed[cursor..cursor + len].to_vec())
        .context("address entry is not utf-8")?,
    );

    cursor += len;
  }

  Ok(addresses)
}
