//! Script classification and address extraction.
//!
//! The one place network parameters matter: everything else treats scripts
//! as opaque bytes. Pay-to-pubkey outputs and bare multisig participants are
//! reported as the P2PKH address of each key, which is what the historical
//! chain mostly pays to anyway.

use {
  super::*,
  bitcoin::{Address, PublicKey, Script, opcodes::all::OP_CHECKMULTISIG},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
  NonStandard,
  PubKey,
  PubKeyHash,
  ScriptHash,
  MultiSig,
  NullData,
  WitnessV0PubKeyHash,
  WitnessV0ScriptHash,
  Taproot,
}

#[derive(Debug, Clone)]
pub struct DecodedScript {
  pub class: ScriptClass,
  pub addresses: Vec<Address>,
  pub required_sigs: u8,
}

impl DecodedScript {
  fn none(class: ScriptClass) -> Self {
    Self {
      class,
      addresses: Vec::new(),
      required_sigs: 0,
    }
  }

  fn single(class: ScriptClass, address: Address) -> Self {
    Self {
      class,
      addresses: vec![address],
      required_sigs: 1,
    }
  }
}

/// Classify `script` and extract every address it pays to. Deterministic,
/// and total: anything unrecognized comes back `NonStandard` with no
/// addresses rather than failing the block.
pub fn decode(script: &Script, network: Network) -> DecodedScript {
  if script.is_op_return() {
    return DecodedScript::none(ScriptClass::NullData);
  }

  let class = if script.is_p2pkh() {
    ScriptClass::PubKeyHash
  } else if script.is_p2sh() {
    ScriptClass::ScriptHash
  } else if script.is_p2wpkh() {
    ScriptClass::WitnessV0PubKeyHash
  } else if script.is_p2wsh() {
    ScriptClass::WitnessV0ScriptHash
  } else if script.is_p2tr() {
    ScriptClass::Taproot
  } else if script.is_p2pk() {
    let Some(key) = script.p2pk_public_key() else {
      return DecodedScript::none(ScriptClass::NonStandard);
    };
    return DecodedScript::single(
      ScriptClass::PubKey,
      Address::p2pkh(key.pubkey_hash(), network),
    );
  } else if let Some((required, keys)) = parse_multisig(script) {
    return DecodedScript {
      class: ScriptClass::MultiSig,
      addresses: keys
        .iter()
        .map(|key| Address::p2pkh(key.pubkey_hash(), network))
        .collect(),
      required_sigs: required,
    };
  } else {
    return DecodedScript::none(ScriptClass::NonStandard);
  };

  match Address::from_script(script, network) {
    Ok(address) => DecodedScript::single(class, address),
    Err(_) => DecodedScript::none(ScriptClass::NonStandard),
  }
}

/// Match the bare multisig template `OP_M <key>... OP_N OP_CHECKMULTISIG`.
fn parse_multisig(script: &Script) -> Option<(u8, Vec<PublicKey>)> {
  let bytes = script.as_bytes();

  if bytes.len() < 4 || *bytes.last()? != OP_CHECKMULTISIG.to_u8() {
    return None;
  }

  let required = small_int(bytes[0])?;
  let total = small_int(bytes[bytes.len() - 2])?;

  let mut keys = Vec::new();
  let mut cursor = 1;

  while cursor < bytes.len() - 2 {
    let push = usize::from(bytes[cursor]);
    cursor += 1;

    // only direct pushes can carry a key
    if push == 0 || push > 75 || cursor + push > bytes.len() - 2 {
      return None;
    }

    keys.push(PublicKey::from_slice(&bytes[cursor..cursor + push]).ok()?);
    cursor += push;
  }

  if keys.is_empty() || keys.len() != usize::from(total) || required > total {
    return None;
  }

  Some((required, keys))
}

/// OP_1 through OP_16.
fn small_int(opcode: u8) -> Option<u8> {
  (0x51..=0x60).contains(&opcode).then(|| opcode - 0x50)
}
