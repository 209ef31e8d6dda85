use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{ArgAction, Args, ColorChoice, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::aot::{Generator, Shell, generate};
use clap_complete_nushell::Nushell;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use time::Date;
use tracing::info;

use crate::AppResult;
use crate::git::inspect::daily_commit_counts;
use crate::git::{DryRunRecorder, GitRecorder, Identity, discover_workdir};
use crate::io_utils::{ReportFile, write_json_output};
use crate::pattern::{ActivityGenerator, RunSummary, Sampler};
use crate::profile::Profile;
use crate::serde_helpers::parse_date;
use crate::time_utils::local_offset;
use crate::workspace::{FsWorkspace, ReadOnlyWorkspace};

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold())
    .usage(Style::new().bold())
    .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .literal(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
    .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))))
    .context(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
    .context_value(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
    );

/// Long-form CLI description shown in `--help`.
const LONG_ABOUT: &str = "Backfill - Generate a synthetic, backdated commit history

For every day in a date range, backfill decides whether the day is active and,
if so, records a random number of small commits against a list of files in a git
working tree. Each commit appends a timestamped comment to one file and is dated
inside business hours of that day.

Settings come from built-in defaults, an optional JSON profile (--profile), and
command-line flags, in increasing order of precedence.";

/// Backfill - Generate a synthetic, backdated commit history.
#[derive(Parser, Debug, Clone)]
#[command(author, version, propagate_version = true, about, long_about = Some(LONG_ABOUT), styles = STYLES)]
pub struct Cli {
    /// Color choice for the output
    #[arg(long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Subcommand to run
    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    /// Whether log output should carry ANSI colors.
    pub fn use_ansi(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stderr().is_terminal(),
        }
    }
}

/// Top-level commands supported by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Generate backdated commits over a date range
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
        #[command(flatten)]
        verbosity: Verbosity<InfoLevel>,
    },

    /// Print per-day commit counts reachable from HEAD as JSON
    Inspect {
        #[command(flatten)]
        args: InspectArgs,
        #[command(flatten)]
        verbosity: Verbosity<InfoLevel>,
    },

    /// Generate shell completion for a given shell
    Completion {
        /// Output file to write the completion script to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The shell to generate the completion for
        #[arg(value_enum)]
        shell: CompletionShell,

        #[command(flatten)]
        verbosity: Verbosity<InfoLevel>,
    },
}

fn parse_date_arg(raw: &str) -> Result<Date, String> {
    parse_date(raw).map_err(|e| format!("expected a date as YYYY-MM-DD ({e})"))
}

/// Options for `generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// JSON profile with run settings (dates, probability, targets, annotations, ...)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Path inside the git working tree to commit into
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<Date>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<Date>,

    /// Chance in [0, 1] that a day receives any commits
    ///
    /// Defaults to 0.70
    #[arg(long)]
    pub probability: Option<f64>,

    /// Fewest commits on an active day (defaults to 1)
    #[arg(long)]
    pub min_events: Option<u32>,

    /// Most commits on an active day (defaults to 6)
    #[arg(long)]
    pub max_events: Option<u32>,

    /// Earliest hour of the day a commit may be placed in (defaults to 9)
    #[arg(long)]
    pub first_hour: Option<u8>,

    /// Latest hour of the day a commit may be placed in (defaults to 18)
    #[arg(long)]
    pub last_hour: Option<u8>,

    /// Pause before each commit, e.g. `100ms` or `1s`
    #[arg(long, value_parser = humantime::parse_duration)]
    pub delay: Option<Duration>,

    /// File to commit against, relative to the working tree (repeatable)
    #[arg(short, long = "target")]
    pub targets: Vec<PathBuf>,

    /// Annotation text to pick from (repeatable)
    #[arg(short, long = "annotation")]
    pub annotations: Vec<String>,

    /// Seed for the random draws, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log what would happen without touching files or the repository
    #[arg(long, default_value_t = false, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Author name for the commits (defaults to git's user.name)
    #[arg(long)]
    pub author_name: Option<String>,

    /// Author email for the commits (defaults to git's user.email)
    #[arg(long)]
    pub author_email: Option<String>,
}

impl GenerateArgs {
    /// The settings given on the command line, as a profile layer.
    fn overrides(&self) -> Profile {
        Profile {
            start: self.start,
            end: self.end,
            probability: self.probability,
            min_events: self.min_events,
            max_events: self.max_events,
            first_hour: self.first_hour,
            last_hour: self.last_hour,
            delay: self.delay,
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            annotations: (!self.annotations.is_empty()).then(|| self.annotations.clone()),
        }
    }

    fn identity(&self) -> Identity {
        Identity {
            name: self.author_name.clone(),
            email: self.author_email.clone(),
        }
    }
}

/// Options for `inspect`.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Path inside the git repository to inspect
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Ignore commits before this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub since: Option<Date>,

    /// Ignore commits after this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub until: Option<Date>,
}

/// Supported completion targets for shell auto-completion.
#[derive(ValueEnum, Clone, Debug)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
    Nushell,
}

impl Display for CompletionShell {
    /// Render the canonical shell name string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionShell::Bash => "bash",
            CompletionShell::Zsh => "zsh",
            CompletionShell::Fish => "fish",
            CompletionShell::PowerShell => "powershell",
            CompletionShell::Elvish => "elvish",
            CompletionShell::Nushell => "nushell",
        };
        write!(f, "{}", s)
    }
}

impl Generator for &CompletionShell {
    fn generate(&self, cmd: &clap::builder::Command, buf: &mut dyn Write) {
        match self {
            CompletionShell::Bash => Shell::Bash.generate(cmd, buf),
            CompletionShell::Zsh => Shell::Zsh.generate(cmd, buf),
            CompletionShell::Fish => Shell::Fish.generate(cmd, buf),
            CompletionShell::PowerShell => Shell::PowerShell.generate(cmd, buf),
            CompletionShell::Elvish => Shell::Elvish.generate(cmd, buf),
            CompletionShell::Nushell => Nushell.generate(cmd, buf),
        }
    }

    fn file_name(&self, name: &str) -> String {
        match self {
            CompletionShell::Bash => Shell::Bash.file_name(name),
            CompletionShell::Zsh => Shell::Zsh.file_name(name),
            CompletionShell::Fish => Shell::Fish.file_name(name),
            CompletionShell::PowerShell => Shell::PowerShell.file_name(name),
            CompletionShell::Elvish => Shell::Elvish.file_name(name),
            CompletionShell::Nushell => Nushell.file_name(name),
        }
    }
}

/// Helper trait for accessing verbosity flags on commands.
pub trait GetVerbosity {
    fn get_verbosity(&self) -> &Verbosity<InfoLevel>;
}

impl GetVerbosity for Cmd {
    fn get_verbosity(&self) -> &Verbosity<InfoLevel> {
        match self {
            Cmd::Generate { verbosity, .. } => verbosity,
            Cmd::Inspect { verbosity, .. } => verbosity,
            Cmd::Completion { verbosity, .. } => verbosity,
        }
    }
}

impl Cmd {
    /// Execute the chosen top-level command.
    #[tracing::instrument(name = "Running command", level = "debug", skip(self))]
    pub async fn run(&self) -> AppResult<()> {
        match self {
            Cmd::Generate { args, .. } => run_generate(args).await,
            Cmd::Inspect {
                args: InspectArgs { repo, since, until },
                ..
            } => {
                let digest = daily_commit_counts(repo, *since, *until)?;
                info!(
                    "{} commits across {} days",
                    digest.total_commits, digest.active_days
                );
                tracing_indicatif::indicatif_println!(
                    "{}",
                    serde_json::to_string_pretty(&digest)?
                );
                Ok(())
            }
            Cmd::Completion { shell, output, .. } => {
                let mut cmd = Cli::command();
                if let Some(output_path) = output {
                    let mut file = std::fs::OpenOptions::new()
                        .write(true)
                        .truncate(true)
                        .create(true)
                        .open(output_path)?;
                    // Write completion script to the requested file.
                    generate(shell, &mut cmd, "backfill", &mut file);
                    info!(
                        "Generated completion script for {} at {}",
                        shell,
                        output_path.display()
                    );
                } else {
                    // Fallback: print completion script to stdout.
                    generate(shell, &mut cmd, "backfill", &mut std::io::stdout());
                }
                Ok(())
            }
        }
    }
}

#[tracing::instrument(name = "Backfilling history", level = "debug", skip(args))]
async fn run_generate(args: &GenerateArgs) -> AppResult<()> {
    // Read before any blocking-pool thread exists.
    let offset = local_offset();
    let base = match &args.profile {
        Some(path) => Profile::load(path).await?,
        None => Profile::default(),
    };
    let config = base.merge(args.overrides()).resolve(offset)?;
    let settings = Profile::from(&config);
    let target_count = config.targets.len();

    info!("Creating commits between {}", config.range);
    info!("Total range: {} days", config.range.len_days());
    info!(
        "Target: ~{:.0}% active days with {}-{} commits each",
        config.probability * 100.0,
        config.min_events,
        config.max_events
    );

    let rng = Sampler::from_seed(args.seed);
    let report = if args.dry_run {
        let root = discover_workdir(&args.repo).unwrap_or_else(|| args.repo.clone());
        let mut generator = ActivityGenerator::new(
            config,
            rng,
            ReadOnlyWorkspace::new(root),
            DryRunRecorder::default(),
        )?;
        generator.run().await?
    } else {
        let recorder = GitRecorder::discover(&args.repo, args.identity())?;
        let workspace = FsWorkspace::new(recorder.workdir());
        let mut generator = ActivityGenerator::new(config, rng, workspace, recorder)?;
        generator.run().await?
    };

    log_summary(&report.summary, target_count);

    if let Some(path) = &args.report {
        let file = ReportFile {
            settings,
            dry_run: args.dry_run,
            report,
        };
        write_json_output(path, &file).await?;
        info!("Wrote run report to {}", path.display());
    }
    Ok(())
}

fn log_summary(summary: &RunSummary, target_count: usize) {
    info!("Commit generation complete");
    info!("  Total commits: {}", summary.total_events);
    if summary.skipped_events > 0 {
        info!(
            "  Skipped: {} of {} planned",
            summary.skipped_events, summary.planned_events
        );
    }
    info!(
        "  Active days: {} / {} ({:.1}%)",
        summary.active_days,
        summary.total_days,
        summary.active_ratio() * 100.0
    );
    info!(
        "  Average commits/active day: {:.1}",
        summary.average_events_per_active_day()
    );
    info!(
        "  Files touched: {} of {}",
        summary.distinct_targets, target_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags_into_overrides() {
        let cli = Cli::try_parse_from([
            "backfill",
            "generate",
            "--start",
            "2025-05-04",
            "--end",
            "2025-05-05",
            "--probability",
            "0.33",
            "--delay",
            "250ms",
            "-t",
            "a.rs",
            "-t",
            "b.rs",
            "--seed",
            "7",
            "--dry-run",
        ])
        .unwrap();
        let Cmd::Generate { args, .. } = cli.cmd else {
            panic!("expected generate");
        };
        assert!(args.dry_run);
        assert_eq!(args.seed, Some(7));
        let overrides = args.overrides();
        assert_eq!(overrides.start, Some(date!(2025 - 05 - 04)));
        assert_eq!(overrides.end, Some(date!(2025 - 05 - 05)));
        assert_eq!(overrides.probability, Some(0.33));
        assert_eq!(overrides.delay, Some(Duration::from_millis(250)));
        assert_eq!(
            overrides.targets,
            Some(vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")])
        );
        assert_eq!(overrides.annotations, None);
    }

    #[test]
    fn rejects_malformed_date() {
        let err = Cli::try_parse_from(["backfill", "generate", "--start", "05/04/2025"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn dry_run_leaves_repository_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = crate::git::recorder::test_repo::init_with_files(dir.path(), &["a.txt"]);
        let repo_arg = dir.path().to_str().unwrap();
        let report_path = dir.path().join("report.json");
        let cli = Cli::try_parse_from([
            "backfill",
            "generate",
            "--repo",
            repo_arg,
            "--start",
            "2025-05-04",
            "--end",
            "2025-05-10",
            "--probability",
            "1",
            "--delay",
            "0s",
            "-t",
            "a.txt",
            "--dry-run",
            "--report",
            report_path.to_str().unwrap(),
        ])
        .unwrap();
        cli.cmd.run().await.unwrap();

        assert!(repo.head().is_err(), "dry run must not create commits");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "// a.txt\n"
        );
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(written["dry_run"], true);
        assert_eq!(written["summary"]["active_days"], 7);
        assert_eq!(written["days"].as_array().unwrap().len(), 7);
        assert_eq!(written["settings"]["targets"][0], "a.txt");
    }

    #[tokio::test]
    async fn generate_commits_into_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = crate::git::recorder::test_repo::init_with_files(dir.path(), &["a.txt"]);
        let cli = Cli::try_parse_from([
            "backfill",
            "generate",
            "--repo",
            dir.path().to_str().unwrap(),
            "--start",
            "2025-05-04",
            "--end",
            "2025-05-05",
            "--probability",
            "1",
            "--delay",
            "0s",
            "-t",
            "a.txt",
            "--author-name",
            "Backfill Bot",
        ])
        .unwrap();
        cli.cmd.run().await.unwrap();

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.author().name(), Some("Backfill Bot"));
        assert!(head.message().unwrap().starts_with("Update a.txt - "));

        let digest = daily_commit_counts(dir.path(), None, None).unwrap();
        assert_eq!(digest.active_days, 2);
        assert!((2..=12).contains(&digest.total_commits));
    }
}
