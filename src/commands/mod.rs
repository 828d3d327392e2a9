mod compose;
mod cutout;
mod stamp;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use tryon::TryOnResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> TryOnResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(global: &GlobalOptions, command: Commands) -> TryOnResult<()> {
    match command {
        Commands::Compose(cmd) => compose::run(global, cmd),
        Commands::Cutout(cmd) => cutout::run(global, cmd),
        Commands::Stamp(cmd) => stamp::run(global, cmd),
    }
}
