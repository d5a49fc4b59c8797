pub mod render;

use std::path::PathBuf;

use clap::Parser;
use credentials_replacer::context;

#[derive(Parser)]
#[command(
    name = "credentials-replacer",
    version,
    about = "Render a template with secrets from an encrypted credential store"
)]
pub struct Cli {
    /// Credential store region (default: us-east-1, or store.default_region from config)
    #[arg(short = 'r', long = "region", value_name = "REGION")]
    pub region: Option<String>,

    /// Fail when the template uses a variable with no matching secret
    #[arg(long)]
    pub strict: bool,

    /// Template file to render
    pub file: PathBuf,

    /// Encryption context pairs passed to every secret fetch
    #[arg(value_name = "KEY=VALUE", value_parser = context::parse_pair)]
    pub context: Vec<(String, String)>,
}
