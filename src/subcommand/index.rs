use super::*;

pub(crate) fn run(options: Options) -> SubcommandResult {
  let mut index = AddressIndex::open(&options.index_path(), options.chain(), options.reorg_window())?;

  let reader = BlockFileReader::open(&options.blocks_dir())?;

  let summary = Updater::new(&mut index, reader, options.reorg_window()).run()?;

  Ok(Some(Box::new(summary)))
}
