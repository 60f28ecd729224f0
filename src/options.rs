use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(
    long,
    help = "Read block files from <BLOCKS_DIR>. [default: <bitcoin-data-dir>/blocks]"
  )]
  pub(crate) blocks_dir: Option<PathBuf>,
  #[arg(long, help = "Use <CHAIN> for address decoding. [default: bitcoin]")]
  pub(crate) chain: Option<Network>,
  #[arg(long, help = "Store the index at <INDEX>. [default: <data-dir>/index.redb]")]
  pub(crate) index: Option<PathBuf>,
  #[arg(
    long,
    help = "Retain full block and transaction rows for the trailing <REORG_WINDOW> blocks. [default: 10]"
  )]
  pub(crate) reorg_window: Option<u64>,
}

impl Options {
  pub(crate) fn chain(&self) -> Network {
    self.chain.unwrap_or(Network::Bitcoin)
  }

  pub(crate) fn reorg_window(&self) -> u64 {
    self.reorg_window.unwrap_or(10)
  }

  pub(crate) fn blocks_dir(&self) -> PathBuf {
    if let Some(blocks_dir) = &self.blocks_dir {
      return blocks_dir.clone();
    }

    let base = dirs::home_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join(".bitcoin");

    match self.chain() {
      Network::Bitcoin => base.join("blocks"),
      Network::Testnet => base.join("testnet3/blocks"),
      Network::Signet => base.join("signet/blocks"),
      Network::Regtest => base.join("regtest/blocks"),
      _ => base.join("blocks"),
    }
  }

  pub(crate) fn index_path(&self) -> PathBuf {
    if let Some(index) = &self.index {
      return index.clone();
    }

    let base = dirs::data_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join("magpie");

    match self.chain() {
      Network::Bitcoin => base.join("index.redb"),
      chain => base.join(format!("{chain}-index.redb")),
    }
  }
}
