//! shunt — compile an expression program to postfix form and run it.
//!
//! Usage:
//!   shunt <FILE>             compile and run a file
//!   shunt -e <SOURCE>        compile and run inline source
//!   shunt --postfix <FILE>   print only the postfix form
//!   shunt --pad [FILE]       open the compile pad
//!   cat file | shunt         read source from stdin

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use shunt::compiler::{Compiler, FAILURE_SENTINEL};
use shunt::config::{self, Config};
use shunt::pad::Pad;
use shunt::report::{ConsoleLogger, LoggerReport};

#[derive(Parser, Debug)]
#[command(name = "shunt")]
#[command(version, about = "Shunting-yard expression compiler", long_about = None)]
struct Args {
    /// Source file (optional if using -e or stdin)
    file: Option<PathBuf>,

    /// Compile inline source
    #[arg(short = 'e', long = "expr", value_name = "SOURCE")]
    expr: Option<String>,

    /// Print only the postfix form
    #[arg(long, conflicts_with = "run")]
    postfix: bool,

    /// Print only the result
    #[arg(long)]
    run: bool,

    /// Log every token resolution and reduction
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of ~/.shunt/config.yaml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Open the compile pad seeded with the input
    #[arg(long)]
    pad: bool,
}

fn load_config(args: &Args) -> io::Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => Config::load().unwrap_or_default(),
    };
    if args.verbose {
        config.verbose = true;
    }
    Ok(config)
}

fn read_source(args: &Args) -> io::Result<String> {
    let source = match (&args.expr, &args.file) {
        (Some(expr), _) => expr.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) if args.pad => String::new(),
        (None, None) => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            source
        }
    };
    Ok(source.trim_end().to_string())
}

fn run_pad(source: &str, config: Config) -> ExitCode {
    let mut pad = Pad::new(source, config);
    let mut terminal = ratatui::init();
    let outcome = pad.run(&mut terminal);
    ratatui::restore();

    for line in pad.history() {
        eprintln!("{line}");
    }
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pad failed: {e}");
            ExitCode::from(2)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            return ExitCode::from(2);
        }
    };
    let source = match read_source(&args) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("failed to read source: {e}");
            return ExitCode::from(2);
        }
    };

    if args.pad {
        return run_pad(&source, config);
    }

    let report = Rc::new(LoggerReport::new(ConsoleLogger, config.verbose));
    let result = Compiler::with_config(report, config).compile(&source);

    if args.postfix {
        println!("{}", result.intermediate());
        return if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        };
    }

    let value = result.execute();
    let rendered = value
        .as_ref()
        .map_or_else(|_| FAILURE_SENTINEL.to_string(), ToString::to_string);
    if args.run {
        println!("{rendered}");
    } else {
        println!("postfix: {}", result.intermediate());
        println!("result: {rendered}");
    }
    match value {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}
