//! Chain assembly over header records scraped from disk.
//!
//! Records live in a dense arena in scan order; `prev`/`next` are indices
//! into it, so the whole graph drops with the assembler. Every candidate tip
//! is walked backward by `prev_hash` until it either roots (reaches
//! `stop_hash` or a block another chain already claimed) or falls off the
//! scanned set.

use {super::*, std::cmp};

/// A contiguous run of blocks inside the assembler's arena, from `first`
/// (closest to genesis) to `last` (the tip).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
  pub first: u32,
  pub last: u32,
  pub length: u64,
}

pub struct ChainAssembler {
  records: Vec<HeaderRecord>,
  by_hash: HashMap<BlockHash, u32>,
}

impl ChainAssembler {
  pub fn new(records: Vec<HeaderRecord>) -> Self {
    let by_hash = records
      .iter()
      .enumerate()
      .map(|(index, record)| (record.hash, index as u32))
      .collect();

    Self { records, by_hash }
  }

  pub fn record(&self, index: u32) -> &HeaderRecord {
    &self.records[index as usize]
  }

  pub fn records(&self) -> &[HeaderRecord] {
    &self.records
  }

  /// Build every chain that roots at `stop_hash` and return them sorted by
  /// length descending. Among equal lengths the chain whose tip was scanned
  /// later sorts first.
  ///
  /// `stop_hash` is the zero hash for a fresh run, or the previously indexed
  /// tip when resuming; if the stop block itself was rescanned it becomes
  /// the `first` of any chain that reaches it.
  pub fn assemble(&mut self, stop_hash: BlockHash) -> Vec<Chain> {
    for record in &mut self.records {
      record.prev = None;
      record.next = None;
      record.part_of_chain = false;
    }

    let mut chains = Vec::new();

    if self.records.len() == 1 {
      self.records[0].part_of_chain = true;
      chains.push(Chain {
        first: 0,
        last: 0,
        length: 1,
      });
      return chains;
    }

    for index in (0..self.records.len()).rev() {
      if self.records[index].part_of_chain {
        continue;
      }

      if let Some(chain) = self.walk_back(index as u32, stop_hash) {
        self.claim(&chain);
        chains.push(chain);
      }
    }

    chains.sort_by_key(|chain| cmp::Reverse(chain.length));

    // Thread forward links shortest-first so the selected chain, threaded
    // last, owns any prefix shared with a shorter fork.
    for chain in chains.iter().rev() {
      self.thread(chain);
    }

    chains
  }

  fn walk_back(&mut self, tip: u32, stop_hash: BlockHash) -> Option<Chain> {
    if self.records[tip as usize].hash == stop_hash {
      return Some(Chain {
        first: tip,
        last: tip,
        length: 1,
      });
    }

    let mut current = tip;
    let mut length = 1u64;

    loop {
      // a cycle cannot root
      if length as usize > self.records.len() {
        return None;
      }

      let prev_hash = self.records[current as usize].prev_hash;

      if prev_hash == stop_hash {
        // When the stop block itself was rescanned it belongs to the chain,
        // so a resumed run re-emits the old tip with its new next link.
        if let Some(&stop) = self.by_hash.get(&stop_hash) {
          self.records[current as usize].prev = Some(stop);
          return Some(Chain {
            first: stop,
            last: tip,
            length: length + 1,
          });
        }

        return Some(Chain {
          first: current,
          last: tip,
          length,
        });
      }

      let Some(&predecessor) = self.by_hash.get(&prev_hash) else {
        return None;
      };

      self.records[current as usize].prev = Some(predecessor);

      if self.records[predecessor as usize].part_of_chain {
        return Some(Chain {
          first: predecessor,
          last: tip,
          length: length + 1,
        });
      }

      current = predecessor;
      length += 1;
    }
  }

  fn claim(&mut self, chain: &Chain) {
    let mut current = chain.last;

    loop {
      self.records[current as usize].part_of_chain = true;

      if current == chain.first {
        break;
      }

      let Some(prev) = self.records[current as usize].prev else {
        break;
      };

      current = prev;
    }
  }

  fn thread(&mut self, chain: &Chain) {
    let mut current = chain.last;

    while current != chain.first {
      let Some(prev) = self.records[current as usize].prev else {
        break;
      };

      self.records[prev as usize].next = Some(current);
      current = prev;
    }
  }

  /// Materialize the chain as arena indices in `first → last` order.
  pub fn chain_blocks(&self, chain: &Chain) -> Vec<u32> {
    let mut blocks = Vec::with_capacity(chain.length as usize);

    let mut current = chain.last;

    loop {
      blocks.push(current);

      if current == chain.first {
        break;
      }

      let Some(prev) = self.records[current as usize].prev else {
        break;
      };

      current = prev;
    }

    blocks.reverse();
    blocks
  }
}
