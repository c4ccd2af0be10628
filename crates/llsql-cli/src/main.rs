use anyhow::Context as _;
use clap::Parser as _;
use llsql::{
    runtime::{ParseError, Parser, ParserDef},
    sql,
};
use std::{
    fs,
    io::{self, Read as _},
    path::PathBuf,
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

/// Check SQL statements against the compiled LL(1) grammar.
#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// The SQL files to check. The standard input is read if omitted.
    inputs: Vec<PathBuf>,

    /// Print the normalized grammar.
    #[arg(long)]
    dump_grammar: bool,

    /// Print the FIRST and FOLLOW sets.
    #[arg(long)]
    dump_sets: bool,

    /// Print the parse table.
    #[arg(long)]
    dump_table: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = sql::grammar().context("invalid SQL grammar")?;
    let table = llsql::compile(grammar).context("failed to compile the SQL grammar")?;

    let dumped = args.dump_grammar || args.dump_sets || args.dump_table;
    if args.dump_grammar {
        println!("{}", table.rules());
    }
    if args.dump_sets {
        println!("{}", table.sets().display(table.rules()));
    }
    if args.dump_table {
        println!("{}", table);
    }

    let mut sources = vec![];
    if args.inputs.is_empty() {
        if dumped {
            return Ok(ExitCode::SUCCESS);
        }
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read the standard input")?;
        sources.push(("<standard input>".to_owned(), source));
    } else {
        for path in &args.inputs {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read `{}'", path.display()))?;
            sources.push((path.display().to_string(), source));
        }
    }

    let mut num_errors = 0;
    let mut parser = Parser::new(&table, "".chars());
    for (name, source) in &sources {
        parser.reopen(source.chars());
        num_errors += check(&mut parser, name);
    }

    Ok(if num_errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run the parser to the end of its input, reporting every error.
fn check<TDef, I>(parser: &mut Parser<TDef, I>, name: &str) -> usize
where
    TDef: ParserDef,
    I: Iterator<Item = char>,
{
    let mut num_errors = 0;
    loop {
        match parser.continue_parse() {
            Ok(()) => break,
            Err(ParseError::Aborted) => break,
            Err(err) => {
                num_errors += 1;
                eprintln!("{}: {}", name, err);
                if parser.is_unrecoverable() {
                    eprintln!("{}: giving up", name);
                    break;
                }
            }
        }
    }

    if num_errors == 0 {
        println!("{}: ok", name);
    } else {
        let suffix = if num_errors == 1 { "" } else { "s" };
        println!("{}: {} error{}", name, num_errors, suffix);
    }
    num_errors
}
