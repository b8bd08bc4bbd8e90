//! Shared argument definitions.

use jschema::OutputFormat;

/// Output-related command-line arguments.
///
/// Can be embedded in other command Args using `#[command(flatten)]`.
#[derive(clap::Args, Clone, Debug)]
pub struct OutputArgs {
    /// Output format: flag or basic
    #[arg(short, long, default_value = "basic")]
    pub output: OutputFormat,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,
}

impl OutputArgs {
    pub fn render(&self, output: &serde_json::Value) -> anyhow::Result<String> {
        Ok(if self.compact {
            serde_json::to_string(output)?
        } else {
            serde_json::to_string_pretty(output)?
        })
    }
}
