use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Find {
  #[arg(long, help = "Find ids of transactions paying <ADDRESS>.")]
  address: Option<String>,
  #[arg(
    long,
    help = "Find addresses paid by <TXID>. Only answered inside the reorg window."
  )]
  txid: Option<Txid>,
  #[arg(
    long,
    help = "Find ids of transactions in <BLOCK>. Only answered inside the reorg window."
  )]
  block: Option<BlockHash>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressOutput {
  pub address: String,
  pub transactions: Vec<Txid>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TxidOutput {
  pub txid: Txid,
  pub addresses: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockOutput {
  pub block: BlockHash,
  pub next: Option<BlockHash>,
  pub transactions: Vec<Txid>,
}

impl Find {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    let index = AddressIndex::open(&options.index_path(), options.chain(), options.reorg_window())?;

    match (self.address, self.txid, self.block) {
      (Some(address), None, None) => {
        let transactions = index.find_transaction_ids_by_address(&address)?;
        Ok(Some(Box::new(AddressOutput {
          address,
          transactions,
        })))
      }
      (None, Some(txid), None) => {
        let addresses = index.find_addresses_by_transaction_id(txid)?;
        ensure!(
          !addresses.is_empty(),
          "transaction {txid} is not in the reorg window"
        );
        Ok(Some(Box::new(TxidOutput { txid, addresses })))
      }
      (None, None, Some(block)) => {
        let info = index.find_block_info_by_block_hash(block)?;
        let transactions = index.find_transaction_ids_by_block_hash(block)?;
        ensure!(
          info.is_some() || !transactions.is_empty(),
          "block {block} is not indexed"
        );
        Ok(Some(Box::new(BlockOutput {
          block,
          next: info.and_then(|info| info.next_hash),
          transactions,
        })))
      }
      _ => bail!("pass exactly one of --address, --txid or --block"),
    }
  }
}
