use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use ddl_core::KeyChord;
use ddl_engine::PageSource;
use url::Url;

/// Harvests direct-download links from a page into a persistent queue.
#[derive(Debug, Parser)]
#[command(name = "ddl_harvester", version, about)]
pub struct Args {
    /// Page to harvest: an http(s) URL or a saved HTML file.
    #[arg(long)]
    pub page: String,

    /// Address a saved HTML file was served from. Defaults to its file:// URL.
    #[arg(long)]
    pub base_url: Option<Url>,

    /// RON configuration file. Defaults to ./ddl_harvester.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Press these chords in order, wait for their work to finish, then exit.
    #[arg(long, value_delimiter = ',', value_name = "CHORD")]
    pub keys: Vec<KeyChord>,
}

impl Args {
    pub fn page_source(&self) -> anyhow::Result<PageSource> {
        let lower = self.page.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(&self.page)
                .with_context(|| format!("invalid page URL {}", self.page))?;
            return Ok(PageSource::Remote(url));
        }

        let path = PathBuf::from(&self.page);
        let base_url = match &self.base_url {
            Some(url) => url.clone(),
            None => {
                let absolute = fs::canonicalize(&path)
                    .with_context(|| format!("cannot open page file {}", path.display()))?;
                Url::from_file_path(&absolute)
                    .map_err(|()| anyhow!("cannot derive a URL for {}", absolute.display()))?
            }
        };
        Ok(PageSource::File { path, base_url })
    }
}
