//! `tally` - validate and evaluate formula expressions from the command line
//!
//! Usage:
//!   tally validate 'RATIO(SUM(income), SUM(balance)) * 100' --schema fields.json
//!   tally eval 'AVG(amount)' --schema fields.json --records rows.json
//!   tally test 'IF(amount > 0, 1, 0)' --schema fields.json
//!   tally functions
//!   tally parse '1 + 2 * 3'
//!
//! Schema files are JSON arrays of `{"name", "type", "required"}`; record
//! files are JSON arrays of objects. Results are printed to stdout as JSON.

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tally_formula::{
    records_from_json, CaseFallback, Engine, Error, FieldDefinition, FieldSchema, Record,
};

use config::Overrides;
use logging::LogFormat;

#[derive(Parser, Debug)]
#[clap(name = "tally")]
#[clap(about = "Validate and evaluate formula expressions over tabular records")]
#[clap(version)]
struct Args {
    /// YAML file with engine options
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[clap(long, value_enum, default_value = "human", global = true)]
    log_format: LogFormat,

    /// Nesting depth above which validation warns
    #[clap(long, global = true)]
    max_nesting_depth: Option<usize>,

    /// Refuse to evaluate more records than this
    #[clap(long, global = true)]
    max_records: Option<usize>,

    /// What CASE returns when nothing matched and no default was given
    #[clap(long, value_enum, global = true)]
    case_fallback: Option<CaseFallbackArg>,

    /// Disable the parsed-expression cache
    #[clap(long, global = true)]
    no_cache: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check an expression against a schema without evaluating it
    Validate {
        expression: String,
        #[clap(long)]
        schema: PathBuf,
    },
    /// Evaluate an expression over a record file
    Eval {
        expression: String,
        #[clap(long)]
        schema: PathBuf,
        #[clap(long)]
        records: PathBuf,
    },
    /// Dry-run an expression; with no or empty records a zero-valued record is used
    Test {
        expression: String,
        #[clap(long)]
        schema: PathBuf,
        #[clap(long)]
        records: Option<PathBuf>,
    },
    /// List the available functions
    Functions,
    /// Print the canonical, fully parenthesised form of an expression
    Parse { expression: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaseFallbackArg {
    Error,
    Null,
}

impl From<CaseFallbackArg> for CaseFallback {
    fn from(arg: CaseFallbackArg) -> Self {
        match arg {
            CaseFallbackArg::Error => CaseFallback::Error,
            CaseFallbackArg::Null => CaseFallback::Null,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init_logging(args.log_format);

    let overrides = Overrides {
        max_nesting_depth: args.max_nesting_depth,
        max_records: args.max_records,
        case_fallback: args.case_fallback.map(CaseFallback::from),
        no_cache: args.no_cache,
    };
    let options = config::load_options(args.config.as_deref(), &overrides)?;
    let engine = Engine::with_options(options);

    run(&engine, args.command)
}

fn run(engine: &Engine, command: Command) -> Result<ExitCode> {
    match command {
        Command::Validate { expression, schema } => {
            let schema = load_schema(&schema)?;
            let report = engine.validate(&expression, &schema);
            print_json(&report)?;
            Ok(exit_code(report.valid))
        }
        Command::Eval {
            expression,
            schema,
            records,
        } => {
            let schema = load_schema(&schema)?;
            let records = load_records(&records, &schema)?;
            tracing::info!(records = records.len(), "evaluating");
            report_evaluation(engine.evaluate(&expression, &records, &schema))
        }
        Command::Test {
            expression,
            schema,
            records,
        } => {
            let schema = load_schema(&schema)?;
            let sample = records
                .as_deref()
                .map(|path| load_records(path, &schema))
                .transpose()?;
            report_evaluation(engine.test(&expression, sample.as_deref(), &schema))
        }
        Command::Functions => {
            let functions: Vec<_> = engine
                .list_functions()
                .into_iter()
                .map(|f| {
                    json!({
                        "name": f.name,
                        "signature": f.to_string(),
                        "category": f.category,
                        "min_args": f.min_args,
                        "max_args": f.max_args,
                        "return_type": f.return_type,
                        "description": f.description,
                    })
                })
                .collect();
            print_json(&functions)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Parse { expression } => match engine.parse(&expression) {
            Ok(ast) => {
                println!("{}", ast);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                print_json(&error_json(&err))?;
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

fn report_evaluation(result: tally_formula::Result<tally_formula::Evaluation>) -> Result<ExitCode> {
    match result {
        Ok(evaluation) => {
            print_json(&evaluation)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(error = %err, "evaluation failed");
            print_json(&error_json(&err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// `{kind, message}` for every engine error
fn error_json(err: &Error) -> serde_json::Value {
    match err {
        Error::Runtime(runtime) => json!({ "kind": runtime.kind, "message": runtime.message }),
        Error::Lex { position, message } => {
            json!({ "kind": "LexError", "position": position, "message": message })
        }
        Error::Parse { position, message } => {
            json!({ "kind": "ParseError", "position": position, "message": message })
        }
        Error::Schema(message) => json!({ "kind": "SchemaError", "message": message }),
        Error::Registry(message) => json!({ "kind": "RegistryError", "message": message }),
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn load_schema(path: &Path) -> Result<FieldSchema> {
    let fields: Vec<FieldDefinition> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("Invalid schema in {}", path.display()))?;
    let schema = FieldSchema::new(fields)?;
    tracing::debug!(fields = schema.len(), path = %path.display(), "loaded schema");
    Ok(schema)
}

fn load_records(path: &Path, schema: &FieldSchema) -> Result<Vec<Record>> {
    let records = records_from_json(&read_json(path)?, schema)
        .with_context(|| format!("Invalid records in {}", path.display()))?;
    tracing::debug!(records = records.len(), path = %path.display(), "loaded records");
    Ok(records)
}
