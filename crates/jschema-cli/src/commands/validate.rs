//! Validate command - validates JSON instances against a schema.

use anyhow::Context;
use jschema::{DEFAULT_MAX_DEPTH, Validator, ValidatorOptions};
use tracing::debug;

use crate::args::OutputArgs;
use crate::util::{display_path, parse_remote, read_json};

#[derive(clap::Args)]
pub struct Args {
    /// Path to the schema file
    pub schema: String,

    /// Instance files to validate ("-" reads stdin)
    #[arg(required = true, num_args = 1..)]
    pub instances: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Make a local file available to references: URI=PATH
    #[arg(long = "remote", value_name = "URI=PATH")]
    pub remotes: Vec<String>,

    /// Assert the built-in formats instead of treating `format` as an annotation
    #[arg(long)]
    pub assert_formats: bool,

    /// Check the schema against its meta-schema before validating
    #[arg(long)]
    pub check_schema: bool,

    /// Maximum nesting of subschema evaluations at one instance location
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

/// Returns whether every instance is valid.
pub fn run(args: Args) -> anyhow::Result<bool> {
    let schema = read_json(&args.schema)?;

    let options = ValidatorOptions {
        output: args.output.output,
        max_depth: args.max_depth,
        validate_schema: args.check_schema,
        assert_formats: args.assert_formats,
        ..ValidatorOptions::default()
    };
    let mut builder = Validator::builder().options(options);
    for remote in &args.remotes {
        let (uri, path) = parse_remote(remote)?;
        debug!(uri = %uri, path, "registering remote schema");
        builder = builder.remote_schema(uri, read_json(&path)?);
    }
    let validator = builder
        .build(&schema)
        .with_context(|| format!("compiling schema {}", args.schema))?;

    let mut all_valid = true;
    for instance_path in &args.instances {
        let instance = read_json(instance_path)?;
        let result = validator
            .validate(&instance)
            .with_context(|| format!("validating {}", display_path(instance_path)))?;
        all_valid &= result.valid;
        if args.instances.len() > 1 {
            eprintln!("{}: {}", display_path(instance_path), verdict(result.valid));
        }
        println!(
            "{}",
            args.output.render(&result.to_output(args.output.output))?
        );
    }
    Ok(all_valid)
}

fn verdict(valid: bool) -> &'static str {
    if valid { "valid" } else { "invalid" }
}
