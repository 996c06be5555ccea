use clap::{Parser, ValueEnum};
use std::process::ExitCode;

use patchfmt::fixer::CommandFixer;
use patchfmt::{Options, Outcome, Patchfmt, UntrackedPolicy, Vcs};

#[derive(Parser)]
#[command(name = "patchfmt")]
#[command(about = "Reformat only the lines changed since the last commit")]
struct Cli {
    /// Files to format, relative to the repository root
    #[arg(required = true)]
    files: Vec<String>,

    /// Repository root
    #[arg(long, default_value = ".")]
    repo: String,

    /// Version control backend
    #[arg(long, value_enum, default_value_t = VcsChoice::Auto)]
    vcs: VcsChoice,

    /// Formatter program, invoked as `<program> --line-range START END -`
    /// with the file on stdin
    #[arg(long, default_value = "autopep8")]
    fixer: String,

    /// Extra argument passed to the formatter (repeatable)
    #[arg(long = "fixer-arg")]
    fixer_args: Vec<String>,

    /// Report files that need reformatting without rewriting them
    #[arg(long)]
    check: bool,

    /// What to do with files the backend does not track
    #[arg(long, value_enum, default_value_t = UntrackedChoice::Skip)]
    untracked: UntrackedChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum VcsChoice {
    /// Detect from the repository root
    Auto,
    Git,
    Hg,
}

#[derive(Clone, Copy, ValueEnum)]
enum UntrackedChoice {
    /// Leave untracked files alone
    Skip,
    /// Fix untracked files in full
    WholeFile,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let vcs = match cli.vcs {
        VcsChoice::Git => Vcs::Git,
        VcsChoice::Hg => Vcs::Hg,
        VcsChoice::Auto => match Vcs::detect(&cli.repo) {
            Ok(vcs) => vcs,
            Err(e) => {
                eprintln!("patchfmt: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let fixer = CommandFixer::new(&cli.fixer).with_args(&cli.fixer_args);
    let options = Options {
        check: cli.check,
        untracked: match cli.untracked {
            UntrackedChoice::Skip => UntrackedPolicy::Skip,
            UntrackedChoice::WholeFile => UntrackedPolicy::WholeFile,
        },
    };
    let tool = Patchfmt::new(&cli.repo, vcs, fixer).with_options(options);

    // Failures are per file: report and keep going with the rest.
    let mut failed = false;
    for file in &cli.files {
        match tool.format_file(file) {
            Ok(Outcome::Reformatted { ranges }) => {
                println!("{file}: reformatted {} range(s)", ranges.len());
            }
            Ok(Outcome::WouldReformat { ranges }) => {
                println!("{file}: needs reformatting ({} range(s))", ranges.len());
                failed = true;
            }
            Ok(Outcome::Unchanged) => println!("{file}: unchanged"),
            Ok(Outcome::SkippedUntracked) => println!("{file}: untracked, skipped"),
            Err(e) => {
                eprintln!("patchfmt: {file}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
