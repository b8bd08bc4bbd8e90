//! Check-schema command - validates a schema document against the 2020-12 meta-schema.

use crate::args::OutputArgs;
use crate::util::read_json;

#[derive(clap::Args)]
pub struct Args {
    /// Path to the schema file ("-" reads stdin)
    pub schema: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: Args) -> anyhow::Result<bool> {
    let schema = read_json(&args.schema)?;
    let result = jschema::validate_schema(&schema)?;
    println!(
        "{}",
        args.output.render(&result.to_output(args.output.output))?
    );
    Ok(result.valid)
}
