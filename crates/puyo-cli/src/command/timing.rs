use std::path::PathBuf;

use puyo_engine::SessionTiming;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TimingArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TimingArg) -> anyhow::Result<()> {
    Output::save_json(&SessionTiming::default(), arg.output.clone())
}
