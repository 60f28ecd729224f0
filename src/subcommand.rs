use super::*;

pub mod find;
pub mod index;
pub mod status;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Build the index, or extend it from the stored tip")]
  Index,
  #[command(about = "Look up transactions, addresses and blocks in the index")]
  Find(find::Find),
  #[command(about = "Print the indexed chain state")]
  Status,
}

impl Subcommand {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    match self {
      Self::Index => index::run(options),
      Self::Find(find) => find.run(options),
      Self::Status => status::run(options),
    }
  }
}

pub type SubcommandResult = Result<Option<Box<dyn Output>>>;

pub trait Output: Send {
  fn print_json(&self);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print_json(&self) {
    serde_json::to_writer_pretty(std::io::stdout(), self).ok();
    println!();
  }
}
