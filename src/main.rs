//! importjson CLI: inspect JSON modules.

use std::env;
use std::path::PathBuf;
use std::process;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use importjson::config::{current_configuration, Configuration};
use importjson::JsonLoader;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// Print the generated listing of a module
    Source { name: String },
    /// Load a module and summarise its contents
    Check { name: String },
}

/// CLI options parsed from arguments.
struct Options {
    command: Command,
    paths: Vec<PathBuf>,
    suffixes: Vec<String>,
}

fn print_usage() {
    eprintln!("importjson {} - JSON documents as class modules", VERSION);
    eprintln!();
    eprintln!("Usage: importjson <command> <module> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  source <module>   Print the generated program listing");
    eprintln!("  check <module>    Load the module and list its attributes and classes");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --path DIR        Add a search directory (repeatable, searched first)");
    eprintln!("  --suffix SUFFIX   Document suffix to probe (repeatable, default: .json)");
    eprintln!("  --help, -h        Show this help message");
    eprintln!();
    eprintln!("Search directories also come from IMPORTJSON_PATH and the current directory.");
    eprintln!("Set RUST_LOG=debug to trace probing and activation.");
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut command_name: Option<String> = None;
    let mut module: Option<String> = None;
    let mut paths = Vec::new();
    let mut suffixes = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--path" | "--suffix" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("{} requires a value", arg);
                    print_usage();
                    process::exit(64);
                }
                if arg == "--path" {
                    paths.push(PathBuf::from(&args[i]));
                } else {
                    suffixes.push(args[i].clone());
                }
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                print_usage();
                process::exit(64);
            }
            _ if command_name.is_none() => command_name = Some(arg.clone()),
            _ if module.is_none() => module = Some(arg.clone()),
            _ => {
                eprintln!("Only one module can be specified");
                print_usage();
                process::exit(64);
            }
        }
        i += 1;
    }

    let name = match module {
        Some(name) => name,
        None => {
            print_usage();
            process::exit(64);
        }
    };
    let command = match command_name.as_deref() {
        Some("source") => Command::Source { name },
        Some("check") => Command::Check { name },
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(64);
        }
        None => {
            print_usage();
            process::exit(64);
        }
    };

    Options {
        command,
        paths,
        suffixes,
    }
}

fn build_loader(options: &Options) -> JsonLoader {
    let mut config: Configuration = current_configuration();
    if !options.suffixes.is_empty() {
        config.json_suffixes = options.suffixes.clone();
    }
    let env_loader = JsonLoader::from_env();
    let roots: Vec<PathBuf> = options
        .paths
        .iter()
        .cloned()
        .chain(env_loader.resolver().search_paths().iter().cloned())
        .collect();
    JsonLoader::with_config(config).with_search_paths(roots)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args();
    let loader = build_loader(&options);

    match &options.command {
        Command::Source { name } => run_source(&loader, name),
        Command::Check { name } => run_check(&loader, name),
    }
}

fn run_source(loader: &JsonLoader, name: &str) {
    match loader.source(name) {
        Ok(listing) => print!("{}", listing),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run_check(loader: &JsonLoader, name: &str) {
    let module = match loader.import(name) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    };

    println!("{} {} ({})", "module".green().bold(), module.name(), module.file().display());
    if let Some(first_line) = module.doc().lines().next() {
        println!("  {}", first_line.dimmed());
    }

    for attribute in module.get_attributes() {
        println!("  {} = {}", attribute.name.cyan(), attribute.default.repr());
    }

    for info in module.get_classes() {
        let parent = info
            .parent_class
            .as_ref()
            .map_or_else(|| "object".to_string(), |p| p.name.clone());
        println!("  {} {}({})", "class".green(), info.name.bold(), parent);
        for attribute in info.class.get_class_attributes() {
            println!("    {} {} = {}", "class attribute".dimmed(), attribute.name, attribute.default.repr());
        }
        for attribute in info.class.get_instance_attributes() {
            println!("    {} = {}", attribute.name, attribute.default.repr());
        }
    }
}
