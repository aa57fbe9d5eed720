use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use log::{debug, info};

use qvs_syntax::config::{Config, OutputFormat};
use qvs_syntax::token::line_col;
use qvs_syntax::{parse_with, CliError, Lexer, Parse, TriviaKind, Vocabulary};

#[derive(ClapParser)]
#[command(author, version, about = "Qlik load script syntax tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON vocabulary table to use instead of the built-in keywords
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Deepest parenthesis nesting kept as a tree
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tokens of a script
    Tokens {
        file: PathBuf,
    },
    /// Print the syntax tree of a script
    Tree {
        file: PathBuf,
    },
    /// Report syntax errors; exits with status 1 if any are found
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the active keyword vocabulary as JSON
    Vocab,
    /// Manage the qvs configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with defaults
    Init,
    /// Print the config file location
    Path,
}

fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn print_tokens(path: &Path, vocabulary: &Vocabulary, format: OutputFormat) -> Result<(), CliError> {
    let source = read_source(path)?;
    let output = Lexer::new(&source, vocabulary).tokenize();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output.tokens)?),
        OutputFormat::Text => {
            for token in &output.tokens {
                for trivia in token.comments() {
                    let (line, column) = line_col(&source, trivia.span.start);
                    println!("{}:{} {:?} {:?}", line, column, trivia.kind, trivia.text);
                }
                let (line, column) = line_col(&source, token.span.start);
                match &token.canonical {
                    Some(canonical) => println!(
                        "{}:{} {:?} {:?} ({})",
                        line, column, token.kind, token.text, canonical
                    ),
                    None => println!("{}:{} {:?} {:?}", line, column, token.kind, token.text),
                }
            }
            for error in &output.errors {
                eprintln!("{}", error.render(&path.display().to_string(), &source));
            }
        }
    }
    Ok(())
}

fn print_tree(path: &Path, vocabulary: &Vocabulary, config: &Config) -> Result<(), CliError> {
    let source = read_source(path)?;
    let parse = parse_with(&source, vocabulary, &config.parse_options());

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parse)?),
        OutputFormat::Text => {
            print!("{}", parse.tree.outline());
            report_errors(path, &source, &parse);
        }
    }
    Ok(())
}

fn report_errors(path: &Path, source: &str, parse: &Parse) {
    let name = path.display().to_string();
    for error in &parse.errors {
        eprintln!("{}", error.render(&name, source));
    }
}

/// Returns the number of files with at least one error.
fn check_files(files: &[PathBuf], vocabulary: &Vocabulary, config: &Config) -> Result<usize, CliError> {
    let mut failed = 0;
    for path in files {
        let source = read_source(path)?;
        let parse = parse_with(&source, vocabulary, &config.parse_options());
        let skipped = parse
            .tree
            .tokens()
            .iter()
            .flat_map(|token| token.leading.iter())
            .chain(parse.tree.trailing.iter())
            .filter(|trivia| trivia.kind == TriviaKind::Skipped)
            .count();
        debug!(
            "{}: {} statements, {} skipped spans",
            path.display(),
            parse.tree.statements().count(),
            skipped
        );

        match config.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "file": path.display().to_string(),
                    "errors": &parse.errors,
                }))?
            ),
            OutputFormat::Text => report_errors(path, &source, &parse),
        }
        if !parse.is_ok() {
            failed += 1;
        }
    }
    Ok(failed)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let mut config = Config::load()?;
    if let Some(path) = cli.vocabulary {
        config.vocabulary = Some(path);
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    let custom = config.load_vocabulary()?;
    let vocabulary = custom.as_ref().unwrap_or_else(|| Vocabulary::standard());
    info!(
        "vocabulary {} ({} keywords)",
        vocabulary.version(),
        vocabulary.len()
    );

    match cli.command {
        Commands::Tokens { file } => print_tokens(&file, vocabulary, config.format)?,
        Commands::Tree { file } => print_tree(&file, vocabulary, &config)?,
        Commands::Check { files } => {
            let failed = check_files(&files, vocabulary, &config)?;
            if failed > 0 {
                eprintln!("{} of {} files have errors", failed, files.len());
                process::exit(1);
            }
        }
        Commands::Vocab => {
            println!("{}", serde_json::to_string_pretty(&vocabulary.to_table())?);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => println!("{}", serde_json::to_string_pretty(&config)?),
            ConfigCommands::Init => {
                let path = Config::get_config_path();
                if path.exists() {
                    println!("Config file already exists at: {}", path.display());
                } else {
                    Config::default().save()?;
                    println!("Initialized new config file at: {}", path.display());
                }
            }
            ConfigCommands::Path => println!("{}", Config::get_config_path().display()),
        },
    }

    Ok(())
}
