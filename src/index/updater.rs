//! Drives a full build or an incremental extension of the index.
//!
//! The pipeline is single-threaded and synchronous: scan headers, assemble
//! the best chain, emit the header pass, then re-read each chained frame for
//! the deep pass. Callbacks observe blocks in strict height order.

use super::*;

pub struct Updater<'index, I: Indexer> {
  indexer: &'index mut I,
  reader: BlockFileReader,
  reorg_window: u64,
}

/// What a run did, for logging and the `index` subcommand's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub genesis: Option<BlockHash>,
  pub tip: BlockHash,
  pub block_count: u64,
  pub blocks_indexed: u64,
}

impl<'index, I: Indexer> Updater<'index, I> {
  pub fn new(indexer: &'index mut I, reader: BlockFileReader, reorg_window: u64) -> Self {
    Self {
      indexer,
      reader,
      reorg_window,
    }
  }

  /// Detect stored state and run the matching mode.
  pub fn run(&mut self) -> Result<Summary> {
    let genesis = self.indexer.genesis()?;
    let tip = self.indexer.tip()?;
    let count = self.indexer.block_count()?;

    match (genesis, tip, count) {
      (Some(_), Some(tip), Some(count)) => self.extend(tip, count),
      (None, None, None) => self.build(),
      _ => bail!("index metadata is incomplete; delete the index and rebuild"),
    }
  }

  fn build(&mut self) -> Result<Summary> {
    log::info!("no stored state, building the index from scratch");

    let records = self.reader.scan(ScanStart::default())?;

    ensure!(!records.is_empty(), "no blocks found in the block files");

    let scanned = records.len();

    let mut assembler = ChainAssembler::new(records);
    let chains = assembler.assemble(BlockHash::all_zeros());

    let Some(chain) = chains.first().copied() else {
      bail!("no chains could be assembled from {scanned} scanned blocks");
    };

    if chains.len() > 1 {
      log::info!("ignoring {} shorter forks", chains.len() - 1);
    }

    let summary = self.emit(&assembler, &chain, 0, 0)?;

    self.indexer.cleanup_reorg_cache(summary.tip)?;

    Ok(summary)
  }

  fn extend(&mut self, tip: BlockHash, count: u64) -> Result<Summary> {
    let tip_info = self
      .indexer
      .block_info(tip)?
      .with_context(|| format!("blockinfo row missing for stored tip {tip}"))?;

    log::info!("resuming from tip {tip} at height {} ({})", count - 1, tip_info.locator);

    let records = self.reader.scan(ScanStart {
      file_number: tip_info.locator.file_number,
      file_position: tip_info.locator.file_position,
      height: count - 1,
    })?;

    if records.is_empty() {
      return self.reorg(tip, count);
    }

    let mut assembler = ChainAssembler::new(records);
    let chains = assembler.assemble(tip);

    let Some(chain) = chains.first().copied() else {
      return self.reorg(tip, count);
    };

    if assembler.record(chain.first).hash != tip {
      return self.reorg(tip, count);
    }

    if chain.length == 1 {
      log::info!("no new blocks; verifying {count} indexed blocks");
      self.indexer.check_consistency(tip, count)?;

      return Ok(Summary {
        genesis: self.indexer.genesis()?,
        tip,
        block_count: count,
        blocks_indexed: 0,
      });
    }

    // the rescanned tip is re-emitted to pick up its next link, but its
    // body was indexed by the previous run
    let summary = self.emit(&assembler, &chain, count - 1, count)?;

    self.indexer.cleanup_reorg_cache(summary.tip)?;

    Ok(summary)
  }

  /// The stored tip no longer roots a chain: the block files changed under
  /// us. Walk the indexed chain backward until an ancestor still on disk
  /// roots the new branch, evict the abandoned blocks' reorg-cache rows,
  /// and re-index from the divergence.
  fn reorg(&mut self, tip: BlockHash, count: u64) -> Result<Summary> {
    log::warn!("stored tip {tip} is no longer reachable; looking for the divergence");

    let mut abandoned = Vec::new();
    let mut hash = tip;

    for depth in 1..=self.reorg_window.min(count - 1) {
      abandoned.push(hash);

      let info = self
        .indexer
        .block_info(hash)?
        .with_context(|| format!("blockinfo row missing for {hash} while unwinding"))?;

      let ancestor = info.prev_hash;

      let ancestor_info = self
        .indexer
        .block_info(ancestor)?
        .with_context(|| format!("blockinfo row missing for ancestor {ancestor}"))?;

      let records = self.reader.scan(ScanStart {
        file_number: ancestor_info.locator.file_number,
        file_position: ancestor_info.locator.file_position,
        height: count - 1 - depth,
      })?;

      if !records.is_empty() {
        let mut assembler = ChainAssembler::new(records);
        let chains = assembler.assemble(ancestor);

        if let Some(chain) = chains.first().copied()
          && assembler.record(chain.first).hash == ancestor
        {
          log::warn!(
            "reorganization of depth {depth}: evicting {} stale blocks",
            abandoned.len(),
          );

          self.indexer.evict_blocks(&abandoned)?;

          let base = count - 1 - depth;
          let summary = self.emit(&assembler, &chain, base, base + 1)?;

          self.indexer.cleanup_reorg_cache(summary.tip)?;

          return Ok(summary);
        }
      }

      hash = ancestor;
    }

    bail!(
      "no common ancestor within the {}-block reorg cache; delete the index and rebuild",
      self.reorg_window,
    );
  }

  /// Run the header pass and then the deep pass over `chain`, assigning
  /// heights from `base_height`. Bodies are only emitted for heights at or
  /// above `body_from`; earlier ones were indexed by a previous run.
  fn emit(
    &mut self,
    assembler: &ChainAssembler,
    chain: &Chain,
    base_height: u64,
    body_from: u64,
  ) -> Result<Summary> {
    let blocks = assembler.chain_blocks(chain);
    let total = base_height + blocks.len() as u64;

    if self.indexer.should_parse_block_info() {
      for (offset, &index) in blocks.iter().enumerate() {
        let record = assembler.record(index);

        let info = BlockInfo {
          hash: record.hash,
          prev_hash: record.prev_hash,
          next_hash: blocks
            .get(offset + 1)
            .map(|&next| assembler.record(next).hash),
          locator: record.locator,
        };

        self
          .indexer
          .on_block_header(base_height + offset as u64, total, &info)?;
      }
    }

    let mut blocks_indexed = 0;

    if self.indexer.should_parse_block_body() {
      let progress_bar = if cfg!(test) || log::log_enabled!(log::Level::Info) {
        None
      } else {
        let progress_bar = ProgressBar::new(blocks.len() as u64);
        progress_bar.set_style(
          ProgressStyle::with_template("[indexing blocks] {wide_bar} {pos}/{len}").unwrap(),
        );
        Some(progress_bar)
      };

      for (offset, &index) in blocks.iter().enumerate() {
        let height = base_height + offset as u64;

        if height < body_from {
          continue;
        }

        let record = assembler.record(index);

        let block = self.reader.read_block(record.locator)?;

        ensure!(
          block.hash == record.hash,
          "block at {} hashes to {} but the scan recorded {}",
          record.locator,
          block.hash,
          record.hash,
        );

        self.indexer.on_block(height, total, &block)?;

        blocks_indexed += 1;

        if let Some(progress_bar) = &progress_bar {
          progress_bar.inc(1);
        }
      }

      if let Some(progress_bar) = &progress_bar {
        progress_bar.finish_and_clear();
      }
    }

    let tip = assembler.record(chain.last).hash;

    log::info!("indexed {blocks_indexed} blocks, tip {tip} at height {}", total - 1);

    Ok(Summary {
      genesis: self.indexer.genesis()?,
      tip,
      block_count: total,
      blocks_indexed,
    })
  }
}
