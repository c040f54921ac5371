use std::{
    fmt,
    fs::{self, File},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

use anyhow::Context;
use clap::{ArgAction, Parser as _, Subcommand, ValueEnum};
use ebnf::{ttl::DEFAULT_BASE, Ebnf};
use ebnf_ll1::{Grammar, Language, LanguageDescription, ParseOptions, Parser};
use log::LevelFilter;

/// Compile EBNF grammars and run table driven LL(1) parsers.
#[derive(clap::Parser)]
#[command(name = "ebnf", version)]
struct Cli {
    /// Raise the log level, repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a grammar file and print its rules
    Compile {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Sxp)]
        format: Format,
        /// Base IRI for Turtle output
        #[arg(long, default_value = DEFAULT_BASE)]
        base: String,
    },
    /// Print the tokens of the input, one per line
    Tokenize {
        /// JSON language description
        #[arg(long)]
        language: PathBuf,
        /// Input file, `-` for stdin
        input: PathBuf,
    },
    /// Parse the input and print the productions as they start and finish
    Parse {
        /// JSON language description
        #[arg(long)]
        language: PathBuf,
        /// Production to start from instead of the description's start
        #[arg(long)]
        start: Option<String>,
        /// Stop at the first error instead of recovering
        #[arg(long)]
        validate: bool,
        /// Input file, `-` for stdin
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Sxp,
    Ttl,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.verbose) {
        eprintln!("Failed to initialize logging: {e:?}");
    }

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) -> anyhow::Result<()> {
    let level = match std::env::var("RUST_LOG") {
        Ok(level) => LevelFilter::from_str(&level)
            .with_context(|| format!("Invalid RUST_LOG level {level:?}"))?,
        Err(_) => LevelFilter::Warn,
    };
    let level = match verbose {
        0 => level,
        1 => level.max(LevelFilter::Info),
        2 => level.max(LevelFilter::Debug),
        _ => LevelFilter::Trace,
    };

    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    )?;
    Ok(())
}

/// Returns whether the input was free of errors.
fn run(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Compile { file, format, base } => {
            let src = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read `{}`", file.display()))?;
            let ebnf = Ebnf::compile(&src)
                .with_context(|| format!("Failed to compile `{}`", file.display()))?;

            let out = match format {
                Format::Sxp => ebnf.to_sxp(),
                Format::Ttl => ebnf.to_ttl(&base),
                Format::Json => ebnf.to_json()?,
            };
            println!("{out}");
            Ok(true)
        }
        Command::Tokenize { language, input } => {
            let language = load_language(&language)?;
            let mut out = io::stdout().lock();
            for token in language.tokenize_reader(open(&input)?) {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => {
                        eprintln!("{e}");
                        return Ok(false);
                    }
                };
                let kind = match token.kind {
                    Some(kind) => &**language.symbols.terminal_name(kind),
                    None => "literal",
                };
                writeln!(out, "{} {kind} {:?}", token.line, token.text)?;
            }
            Ok(true)
        }
        Command::Parse {
            language,
            start,
            validate,
            input,
        } => {
            let language = load_language(&language)?;
            let start = match start {
                Some(name) => language.production(&name)?,
                None => language
                    .start
                    .context("The language has no start production, pass --start")?,
            };

            let grammar = trace_grammar(&language);
            let parser = Parser::new(&language, &grammar).with_options(ParseOptions { validate });
            let lexer = language.tokenize_reader(open(&input)?);

            match parser.parse(lexer, start, &mut Trace::default()) {
                Ok(report) => {
                    for error in &report.errors {
                        eprintln!("{error}");
                    }
                    Ok(report.is_ok())
                }
                Err(error) => {
                    eprintln!("{error}");
                    Ok(false)
                }
            }
        }
    }
}

fn load_language(path: &Path) -> anyhow::Result<Language> {
    let file =
        File::open(path).with_context(|| format!("Failed to open `{}`", path.display()))?;
    let description = LanguageDescription::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load language `{}`", path.display()))?;
    let language = description.to_language()?;
    log::debug!(
        "loaded {} terminal patterns from `{}`",
        language.terminals.len(),
        path.display()
    );
    Ok(language)
}

fn open(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file =
        File::open(path).with_context(|| format!("Failed to open `{}`", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Prints parser events indented by nesting depth.
#[derive(Default)]
struct Trace {
    depth: usize,
}

impl Trace {
    fn line(&self, args: fmt::Arguments) {
        println!("{:indent$}{args}", "", indent = self.depth * 2);
    }
}

fn trace_grammar(language: &Language) -> Grammar<(), Trace> {
    let mut builder = Grammar::<(), Trace>::builder();

    for (production, name) in language.symbols.productions() {
        let (start, finish) = (name.clone(), name.clone());
        builder = builder
            .start(production, move |_, _, trace| {
                trace.line(format_args!("start {start}"));
                trace.depth += 1;
            })
            .finish(production, move |_, _, trace| {
                trace.depth = trace.depth.saturating_sub(1);
                trace.line(format_args!("finish {finish}"));
            });
    }
    for (terminal, name) in language.symbols.terminals() {
        let name = name.clone();
        builder = builder.terminal(terminal, move |_, token, _, trace| {
            trace.line(format_args!("{name} {:?}", token.text))
        });
    }
    builder
        .any_literal(|_, token, _, trace| trace.line(format_args!("{:?}", token.text)))
        .build()
}
