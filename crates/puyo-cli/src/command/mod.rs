use clap::{Parser, Subcommand};

use self::{resolve::ResolveArg, simulate::SimulateArg, timing::TimingArg};

mod resolve;
mod simulate;
mod timing;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a seeded session headlessly with a random placement policy
    Simulate(#[clap(flatten)] SimulateArg),
    /// Run the clear/gravity cascade on a grid picture
    Resolve(#[clap(flatten)] ResolveArg),
    /// Print the default timing as JSON
    Timing(#[clap(flatten)] TimingArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Resolve(arg) => resolve::run(&arg)?,
        Mode::Timing(arg) => timing::run(&arg)?,
    }
    Ok(())
}
