use clap::Parser;

/// Periodically republishes ("bumps") your resumes on the recruitment
/// platform, respecting the per-resume publish cooldown.
#[derive(Debug, Parser)]
#[command(name = "resume-up", version, about)]
pub struct Cli {
    /// Diagnostic mode: print the full resume listing to stdout and log
    /// to the console instead of the rolling log file.
    #[arg(long)]
    pub print_all: bool,
}
