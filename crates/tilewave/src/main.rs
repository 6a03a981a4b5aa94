mod cli;
mod run;
mod settings;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing(cli.run.log_level.as_deref());

    match cli.command {
        Some(Command::Check) => run::check(),
        Some(Command::Source { stage }) => {
            run::print_source(stage.into());
            Ok(())
        }
        None => run::run(cli.run),
    }
}
