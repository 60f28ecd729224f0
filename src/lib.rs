use {
  self::{
    arguments::Arguments,
    assembler::{Chain, ChainAssembler},
    block::{Block, BlockLocator, HeaderRecord, Transaction, TxInput, TxOutput, WitnessStack},
    blockfile::{BlockFileReader, ScanStart},
    index::{AddressIndex, BlockInfo, IndexSearch, Indexer, Updater},
    options::Options,
    subcommand::{Output, Subcommand, SubcommandResult},
  },
  anyhow::{Context, anyhow, bail, ensure},
  bitcoin::{
    BlockHash, Network, ScriptBuf, Txid, Wtxid,
    hashes::{Hash, HashEngine, sha256d},
  },
  clap::Parser,
  indicatif::{ProgressBar, ProgressStyle},
  serde::{Deserialize, Serialize},
  std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io::{BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
    process,
  },
};

pub use anyhow::Error;

pub mod arguments;
pub mod assembler;
pub mod block;
pub mod blockfile;
pub mod error;
pub mod index;
pub mod options;
pub mod script;
pub mod subcommand;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

pub fn main() {
  env_logger::init();

  let args = Arguments::parse();

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");
      for (i, err) in err.chain().skip(1).enumerate() {
        if i == 0 {
          eprintln!();
          eprintln!("because:");
        }
        eprintln!("- {err}");
      }
      process::exit(1);
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print_json();
      }
    }
  }
}
