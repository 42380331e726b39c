use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use myshell::{Config, Interpreter, diagnostic};
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A line-oriented command interpreter. Runs interactively, or executes the
/// lines of a batch file when one is given.
struct Args {
    #[argh(positional)]
    /// file whose lines are executed in batch mode
    batch_file: Option<String>,

    #[argh(switch, short = 'v')]
    /// log debug information to stderr
    verbose: bool,

    #[argh(option)]
    /// prompt shown in interactive mode
    prompt: Option<String>,

    #[argh(switch)]
    /// do not keep a history of interactive lines
    no_history: bool,
}

impl Args {
    fn config(&self) -> Config {
        let config = Config::default().with_history(!self.no_history);
        match &self.prompt {
            Some(prompt) => config.with_prompt(prompt.clone()),
            None => config,
        }
    }
}

/// Log to stderr so nothing interferes with command output on stdout.
///
/// `MYSHELL_LOG` takes precedence over `RUST_LOG`; logging is off by default.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "off" };
    let filter = EnvFilter::try_from_env("MYSHELL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// CLI misuse is reported like every other failure, and the shell exits cleanly.
fn usage_error() -> ! {
    if let Err(e) = diagnostic::emit(&mut io::stdout()) {
        tracing::warn!("could not write diagnostic: {}", e);
    }
    process::exit(0);
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let command = argv.first().map(String::as_str).unwrap_or("myshell");
    let rest: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();

    match Args::from_args(&[command], &rest) {
        Ok(args) => args,
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => {
            println!("{}", output);
            process::exit(0);
        }
        Err(EarlyExit { output, .. }) => {
            eprintln!("{}", output.trim_end());
            usage_error();
        }
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let mut shell = Interpreter::default();
    match &args.batch_file {
        Some(path) => {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "cannot open batch file");
                    usage_error();
                }
            };
            shell
                .run_batch(BufReader::new(file), &mut io::stdout())
                .with_context(|| format!("batch run of {} failed", path))?;
        }
        None => shell.repl(&args.config())?,
    }

    Ok(())
}
