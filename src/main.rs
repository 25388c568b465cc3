use std::fs;
use std::io;
use std::path::PathBuf;

use calc_interpreter::Lexer;
use calc_interpreter::repl::{DEFAULT_PROMPT, Session};
use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;

#[derive(Parser, Debug)]
#[command(version, about = "Integer arithmetic, evaluated strictly left to right")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive session (the default)
    Repl {
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
    },
    Eval {
        expression: String,
    },
    Tokenize {
        expression: String,
    },
    /// Evaluate every non-empty line of a file
    Run {
        filename: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Repl {
        prompt: DEFAULT_PROMPT.to_string(),
    });

    match command {
        Commands::Repl { prompt } => {
            Session::interactive(&prompt)
                .run(io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
                .into_diagnostic()
                .wrap_err("reading standard input failed")?;
        }
        Commands::Eval { expression } => {
            let value = calc_interpreter::evaluate(&expression)?;
            println!("{value}");
        }
        Commands::Tokenize { expression } => {
            for token in Lexer::new(None, &expression) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => {
                        eprintln!("{:?}", miette::Report::new(e));
                        std::process::exit(65);
                    }
                }
            }
        }
        Commands::Run { filename } => {
            let file_contents = fs::read_to_string(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;

            let name = filename.display().to_string();
            let summary = Session::batch(&name)
                .run(file_contents.as_bytes(), &mut io::stdout(), &mut io::stderr())
                .into_diagnostic()?;
            if summary.failed > 0 {
                std::process::exit(65);
            }
        }
    }
    Ok(())
}
