//! Command-line interface for xsdform

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xsdform::generator::{default_root, outline, BatchSurface, Generator, InteractiveSurface};
#[cfg(feature = "cli")]
use xsdform::validators::{document_validation::validate_with_limits, parsing::load_schema};
#[cfg(feature = "cli")]
use xsdform::{GeneratorConfig, Limits, Location, PrefixMap, RetryPolicy, SchemaModel, ValidationResult};

/// Exit status for a document that was produced but does not validate
#[cfg(feature = "cli")]
const EXIT_INVALID: i32 = 2;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdform")]
#[command(author, version, about = "Generate the mandatory skeleton of an XML document from an XSD schema", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Resource limit presets
#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LimitsPreset {
    Default,
    Strict,
    Permissive,
}

#[cfg(feature = "cli")]
impl LimitsPreset {
    fn limits(self) -> Limits {
        match self {
            LimitsPreset::Default => Limits::default(),
            LimitsPreset::Strict => Limits::strict(),
            LimitsPreset::Permissive => Limits::permissive(),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect the mandatory values of a root element and write the document
    Generate {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Root element (local name, prefix:name or {uri}name)
        #[arg(short, long)]
        root: Option<String>,

        /// JSON answer sheet; prompts on the terminal when absent
        #[arg(short, long, value_name = "FILE")]
        answers: Option<PathBuf>,

        /// JSON generator configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Preferred namespace prefix, repeatable
        #[arg(short, long = "prefix", value_name = "PREFIX=URI")]
        prefixes: Vec<String>,

        /// Attempts per value before giving up
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,

        /// Indentation width of the output
        #[arg(long, value_name = "N")]
        indent: Option<usize>,

        /// Resource limits preset; replaces the limits of --config
        #[arg(long, value_enum, value_name = "PRESET")]
        limits: Option<LimitsPreset>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate an XML document against an XSD schema
    Validate {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Resource limits preset
        #[arg(long, value_enum, value_name = "PRESET", default_value = "default")]
        limits: LimitsPreset,
    },

    /// Show the global elements and the mandatory outline of a root
    Inspect {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Root element to outline
        #[arg(short, long)]
        root: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            schema,
            root,
            answers,
            config,
            prefixes,
            max_attempts,
            indent,
            limits,
            output,
        } => cmd_generate(GenerateArgs {
            schema,
            root,
            answers,
            config,
            prefixes,
            max_attempts,
            indent,
            limits,
            output,
        }),
        Commands::Validate { schema, file, limits } => cmd_validate(schema, file, limits.limits()),
        Commands::Inspect { schema, root, json } => cmd_inspect(schema, root, json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xsdform=warn")),
        1 => EnvFilter::new("xsdform=debug"),
        _ => EnvFilter::new("xsdform=trace"),
    };
    // stdout carries documents and JSON
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(feature = "cli")]
struct GenerateArgs {
    schema: PathBuf,
    root: Option<String>,
    answers: Option<PathBuf>,
    config: Option<PathBuf>,
    prefixes: Vec<String>,
    max_attempts: Option<u32>,
    indent: Option<usize>,
    limits: Option<LimitsPreset>,
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
fn cmd_generate(args: GenerateArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    for binding in &args.prefixes {
        let (prefix, uri) = PrefixMap::parse_binding(binding)?;
        config.namespaces.bind(prefix, uri)?;
    }
    if let Some(attempts) = args.max_attempts {
        config.retry = RetryPolicy::limited(attempts);
    }
    if args.indent.is_some() {
        config.indent = args.indent;
    }
    if let Some(preset) = args.limits {
        config.limits = preset.limits();
    }

    let mut generator = Generator::from_location(&Location::path(&args.schema), config)?;
    let root = match args.root {
        Some(root) => root,
        None => default_root(generator.model())?,
    };

    let outcome = match &args.answers {
        Some(path) => {
            let mut surface = BatchSurface::from_file(path)?;
            generator.generate(&root, &mut surface)?
        }
        None => {
            let stdin = io::stdin();
            let mut surface = InteractiveSurface::new(stdin.lock(), io::stderr());
            generator.generate(&root, &mut surface)?
        }
    };

    match &args.output {
        Some(path) => {
            outcome.write_to(path)?;
            eprintln!("Document written to {}", path.display());
        }
        None => {
            outcome.write_into(io::stdout().lock())?;
            println!();
        }
    }

    match &outcome.validation {
        ValidationResult::Valid => {
            eprintln!("Document is valid");
            Ok(0)
        }
        ValidationResult::Invalid(diagnostics) => {
            eprintln!("Document is invalid ({} problem(s)):", diagnostics.len());
            for diagnostic in diagnostics {
                eprintln!("  {}", diagnostic);
            }
            Ok(EXIT_INVALID)
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(schema_path: PathBuf, file: PathBuf, limits: Limits) -> Result<i32, Box<dyn std::error::Error>> {
    let model = load_schema(&Location::path(&schema_path), &limits)?;
    let bytes = fs::read(&file)?;

    match validate_with_limits(&bytes, &model, &limits)? {
        ValidationResult::Valid => {
            println!("{} is valid", file.display());
            Ok(0)
        }
        ValidationResult::Invalid(diagnostics) => {
            println!("{} is invalid ({} problem(s)):", file.display(), diagnostics.len());
            for diagnostic in &diagnostics {
                println!("  {}", diagnostic);
            }
            Ok(EXIT_INVALID)
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_inspect(schema_path: PathBuf, root: Option<String>, json_output: bool) -> Result<i32, Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let model = SchemaModel::load(&Location::path(&schema_path))?;
    let root = match root {
        Some(root) => Some(root),
        None => default_root(&model).ok(),
    };
    let tree = match &root {
        Some(root) => Some(outline(&model, root)?),
        None => None,
    };

    if json_output {
        let elements: Vec<Value> = model
            .global_elements()
            .map(|e| {
                json!({
                    "name": e.name.to_string(),
                    "type": model.type_of(e.type_id).label(),
                    "abstract": e.is_abstract,
                })
            })
            .collect();
        let output = json!({
            "targetNamespace": model.target_namespace(),
            "documents": model.sources().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "elements": elements,
            "outline": tree,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    println!("xsdform v{}", xsdform::VERSION);
    println!();
    println!("Schema Information:");
    match model.target_namespace() {
        Some(ns) => println!("  Target Namespace: {}", ns),
        None => println!("  Target Namespace: (none)"),
    }
    println!("  Documents: {}", model.sources().len());
    println!("  Types: {}", model.type_count());

    println!("\n=== Global Elements ===");
    for element in model.global_elements() {
        let marker = if element.is_abstract { " (abstract)" } else { "" };
        println!("  {} : {}{}", element.name, model.type_of(element.type_id).label(), marker);
    }

    if let Some(tree) = tree {
        println!("\n=== Mandatory Outline ===");
        print!("{}", tree);
    }
    Ok(0)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
