use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::StandardArgs;
use crate::structs::{NodeId, RecordOrder};
use crate::subcommands::{check, diffs, leaf_counts, leaf_sets, records, trees};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// List the records in insertion or removal order
    Records {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Order to list the records in
        #[arg(long, value_enum, default_value_t = RecordOrder::Insertion)]
        order: RecordOrder,
    },

    /// Print the node table of every marginal tree
    Trees {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },

    /// Print the records leaving and entering at every breakpoint
    Diffs {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },

    /// Leaf counts of the internal nodes of every tree
    LeafCounts {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Samples to count separately
        #[arg(short = 't', long, value_delimiter = ' ', num_args = 1..)]
        track: Option<Vec<NodeId>>,

        /// Only report this node
        #[arg(long)]
        node: Option<NodeId>,
    },

    /// Ordered leaves under the root, or under a given node, of every tree
    LeafSets {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Node to list the leaves of
        #[arg(long)]
        node: Option<NodeId>,
    },

    /// Validate the records and verify every tree against full recounts
    Check {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },
}

impl SubCommand {
    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Records { log_and_verbosity, .. }
            | SubCommand::Trees { log_and_verbosity, .. }
            | SubCommand::Diffs { log_and_verbosity, .. }
            | SubCommand::LeafCounts { log_and_verbosity, .. }
            | SubCommand::LeafSets { log_and_verbosity, .. }
            | SubCommand::Check { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Records { args, order, .. } => records::run(args, order)?,
        SubCommand::Trees { args, .. } => trees::run(args)?,
        SubCommand::Diffs { args, .. } => diffs::run(args)?,
        SubCommand::LeafCounts { args, track, node, .. } => leaf_counts::run(args, track.unwrap_or_default(), node)?,
        SubCommand::LeafSets { args, node, .. } => leaf_sets::run(args, node)?,
        SubCommand::Check { args, .. } => check::run(args)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, guard))
}

pub fn get_styles() -> clap::builder::Styles {
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let red = anstyle::Color::Ansi(anstyle::AnsiColor::Red);

    clap::builder::Styles::styled()
        .usage(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
        .header(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
        .literal(anstyle::Style::new().fg_color(Some(green)))
        .invalid(anstyle::Style::new().bold().fg_color(Some(red)))
        .error(anstyle::Style::new().bold().fg_color(Some(red)))
        .valid(anstyle::Style::new().bold().underline().fg_color(Some(green)))
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing() {
        let (level, _, _) = init_tracing(1, &None, false).unwrap();
        assert_eq!(Level::ERROR, level);
        let (level, _, _) = init_tracing(2, &None, false).unwrap();
        assert_eq!(Level::WARN, level);
        let (level, _, _) = init_tracing(3, &None, false).unwrap();
        assert_eq!(Level::INFO, level);
        let (level, _, _) = init_tracing(4, &None, false).unwrap();
        assert_eq!(Level::DEBUG, level);
        let (level, _, _) = init_tracing(5, &None, false).unwrap();
        assert_eq!(Level::TRACE, level);
        let (level, _, _) = init_tracing(5, &None, true).unwrap();
        assert_eq!(Level::ERROR, level);
    }

    #[test]
    fn test_parse_args() {
        let args = Arguments::try_parse_from([
            "treeseq", "leaf-counts", "records.tsv", "--sample-size", "5", "--track", "1", "2",
        ])
        .unwrap();

        match args.cmd {
            SubCommand::LeafCounts { args, track, node, log_and_verbosity } => {
                assert_eq!(args.file, PathBuf::from("records.tsv"));
                assert_eq!(args.sample_size, Some(5));
                assert_eq!(track, Some(vec![1, 2]));
                assert_eq!(node, None);
                assert_eq!(log_and_verbosity.verbosity, 3);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_record_order_arg() {
        let args = Arguments::try_parse_from(["treeseq", "records", "r.json", "--order", "removal"]).unwrap();
        assert_eq!(args.cmd.log_and_verbosity().0, 3);
        assert!(matches!(args.cmd, SubCommand::Records { order: RecordOrder::Removal, .. }));
    }
}
