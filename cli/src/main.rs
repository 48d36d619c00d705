mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use latte::{CompileError, Compiler, CompilerConfig};

const SUBCOMMANDS: &[&str] = &["compile", "test", "help"];

/// Looked up next to the template when `--config` is not given.
const DEFAULT_CONFIG: &str = "latte.toml";

#[derive(Parser)]
#[command(name = "latte", version, about = "Latte template compiler")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a template to host code
    Compile(CompileArgs),

    /// Run .test.latte fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Template source file
    file: String,

    /// Compiler configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Salt seed, overriding the configuration
    #[arg(long)]
    salt: Option<String>,

    /// Compile only, don't print anything (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// List the named blocks and their function names
    #[arg(long)]
    blocks: bool,

    /// Dump the compiled segments instead of host code
    #[arg(long)]
    segments: bool,

    /// Write host code to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.latte file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `latte page.latte` works like `latte compile page.latte`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_pos = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, a)| !a.starts_with('-'))
        .map(|(pos, a)| (pos, a.clone()));
    if let Some((pos, first)) = first_pos {
        if !SUBCOMMANDS.contains(&first.as_str()) {
            args.insert(pos, "compile".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    match cli.command {
        Command::Compile(compile_args) => do_compile(compile_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config`, else `latte.toml` beside the template, else defaults.
fn load_config(args: &CompileArgs) -> Result<CompilerConfig, latte::ConfigError> {
    if let Some(path) = &args.config {
        return CompilerConfig::load(path);
    }
    let sibling = Path::new(&args.file)
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULT_CONFIG);
    if sibling.is_file() {
        debug!(path = %sibling.display(), "using configuration");
        return CompilerConfig::load(&sibling);
    }
    Ok(CompilerConfig::default())
}

fn do_compile(args: CompileArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    if let Some(salt) = &args.salt {
        config.salt = Some(salt.clone());
    }
    let delimiters = config.delimiters();

    let compiler = match Compiler::with_config(config) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let compiled = match compiler.compile_named(&args.file, &source, file_id) {
        Ok(compiled) => compiled,
        Err(error) => {
            let writer = StandardStream::stderr(color_choice);
            emit_compile_error(&writer, &files, &error);
            process::exit(1);
        }
    };

    if args.check {
        eprintln!("ok: {} compiled successfully", args.file);
        return;
    }

    if args.blocks {
        for unit in compiled.blocks.values() {
            println!("{} {}", unit.name, unit.ident);
        }
        return;
    }

    if args.segments {
        println!("{:#?}", compiled.segments());
        return;
    }

    let code = compiled.to_code(&delimiters);
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, code) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", code),
    }
}

fn emit_compile_error(
    writer: &StandardStream,
    files: &SimpleFiles<String, String>,
    error: &CompileError,
) {
    let config = term::Config::default();
    let diagnostic = error.to_diagnostic();
    if term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic).is_err() {
        eprintln!("error: {}", error);
    }
}
