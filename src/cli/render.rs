use std::io::{self, Write};
use std::path::Path;

use credentials_replacer::auth;
use credentials_replacer::config::Config;
use credentials_replacer::context::EncryptionContext;
use credentials_replacer::error::Result;
use credentials_replacer::render::Renderer;
use credentials_replacer::store::VaultStore;

pub fn run(
    region: Option<&str>,
    strict: bool,
    file: &Path,
    context_pairs: &[(String, String)],
) -> Result<()> {
    let config = Config::load_default()?;
    let region = config.region(region);
    let context: EncryptionContext = context_pairs.iter().cloned().collect();

    let key = auth::resolve_key(&config)?;
    let store = VaultStore::new(config.store_dir(), key);

    let output = Renderer::new(&store).render(file, &region, &context, strict)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
