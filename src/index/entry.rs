use super::*;

pub(crate) type BlockInfoValue = [u8; 112];

/// Per-block row persisted in the `blockinfo` table: enough to walk the
/// indexed chain in both directions and to find the block's frame on disk
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub hash: BlockHash,
  pub prev_hash: BlockHash,
  pub next_hash: Option<BlockHash>,
  pub locator: BlockLocator,
}

impl BlockInfo {
  pub fn is_genesis(&self) -> bool {
    self.prev_hash == BlockHash::all_zeros()
  }

  pub fn is_tip(&self) -> bool {
    !self.is_genesis() && self.next_hash.is_none()
  }

  /// Layout: prev hash (32) ‖ next hash (32, zeroed when absent) ‖ file
  /// number as u16 LE padded to 16 ‖ file position as u32 LE padded to 32.
  /// Fixed-width and stable across restarts; rows written by one run must
  /// load bit-exact in the next.
  pub(crate) fn store(&self) -> BlockInfoValue {
    let mut value = [0; 112];

    value[0..32].copy_from_slice(&self.prev_hash.to_byte_array());

    if let Some(next) = self.next_hash {
      value[32..64].copy_from_slice(&next.to_byte_array());
    }

    value[64..66].copy_from_slice(&self.locator.file_number.to_le_bytes());
    value[80..84].copy_from_slice(&self.locator.file_position.to_le_bytes());

    value
  }

  pub(crate) fn load(hash: BlockHash, value: &BlockInfoValue) -> Self {
    let mut prev = [0; 32];
    prev.copy_from_slice(&value[0..32]);

    let mut next = [0; 32];
    next.copy_from_slice(&value[32..64]);

    Self {
      hash,
      prev_hash: BlockHash::from_byte_array(prev),
      next_hash: (next != [0; 32]).then(|| BlockHash::from_byte_array(next)),
      locator: BlockLocator {
        file_number: u16::from_le_bytes([value[64], value[65]]),
        file_position: u32::from_le_bytes([value[80], value[81], value[82], value[83]]),
      },
    }
  }
}
