use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub genesis: BlockHash,
  pub tip: BlockHash,
  pub block_count: u64,
}

pub(crate) fn run(options: Options) -> SubcommandResult {
  let index = AddressIndex::open(&options.index_path(), options.chain(), options.reorg_window())?;

  let (genesis, tip, block_count) = match (
    index.genesis()?,
    index.tip()?,
    index.block_count()?,
  ) {
    (Some(genesis), Some(tip), Some(block_count)) => (genesis, tip, block_count),
    _ => bail!("index is empty; run `magpie index` first"),
  };

  Ok(Some(Box::new(Output {
    genesis,
    tip,
    block_count,
  })))
}
