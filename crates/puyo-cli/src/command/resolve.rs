use std::{fmt::Write as _, path::PathBuf};

use puyo_engine::{ResolveReport, resolve_fully};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ResolveArg {
    /// Grid picture: up to 12 lines of 6 cells, `.` or one of `RGBY`
    file: PathBuf,
    /// Report format
    #[arg(long, value_enum, default_value_t)]
    format: ReportFormat,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ResolveArg) -> anyhow::Result<()> {
    let ResolveArg {
        file,
        format,
        output,
    } = arg;

    let grid = util::read_grid_file(file)?;
    let settled = grid.apply_gravity();
    if settled != grid {
        eprintln!("Grid has floating cells; applying gravity first");
    }

    let report = resolve_fully(&settled);
    eprintln!(
        "Cascade finished after {} chain(s), {} cells cleared",
        report.chain_length(),
        report.cleared_cells()
    );

    match format {
        ReportFormat::Text => {
            let mut output = Output::from_output_path(output.clone())?;
            output.write_text(&render_report(&report))?;
        }
        ReportFormat::Json => Output::save_json(&report, output.clone())?,
    }
    Ok(())
}

fn render_report(report: &ResolveReport) -> String {
    let mut text = String::new();
    for step in &report.steps {
        let colors = step
            .groups
            .iter()
            .map(|group| format!("{}x{}", group.color().as_char(), group.len()))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(text, "chain {}: {colors}", step.chain).ok();
        writeln!(text, "{}\n", step.grid).ok();
    }
    writeln!(text, "final:").ok();
    writeln!(text, "{}", report.grid).ok();
    text
}

#[cfg(test)]
mod tests {
    use puyo_engine::Grid;

    use super::*;

    #[test]
    fn test_report_format_names() {
        use clap::ValueEnum as _;
        assert_eq!(ReportFormat::from_str("json", true), Ok(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("TEXT", true), Ok(ReportFormat::Text));
        assert!(ReportFormat::from_str("yaml", true).is_err());
    }

    #[test]
    fn test_render_lists_each_chain() {
        let grid = Grid::from_ascii(
            "
            G.....
            RRRR..
            GGG...
            ",
        )
        .unwrap();
        let text = render_report(&resolve_fully(&grid));
        assert!(text.starts_with("chain 1: Rx4\n"), "{text}");
        assert!(text.contains("chain 2: Gx4\n"), "{text}");
        assert!(text.ends_with(&format!("final:\n{}\n", Grid::EMPTY)), "{text}");
    }
}
