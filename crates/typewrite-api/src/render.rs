//! Markdown rendering with a per-story HTML cache file, named
//! `<cache dir>/<story id>.html`. Reads go through the cache; writes always
//! re-render. Two concurrent updates of the same story race on the file; the
//! last writer wins, which matches the database row semantics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};

pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

pub fn cache_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.html"))
}

/// Read-through load: returns the cached HTML when the file exists, else
/// renders the markdown and writes the cache.
pub fn load_or_render(dir: &Path, id: &str, markdown: &str) -> Result<String> {
    let path = cache_path(dir, id);
    match fs::read_to_string(&path) {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == io::ErrorKind::NotFound => write_cache(dir, id, markdown),
        Err(e) => Err(e).with_context(|| format!("reading story cache {}", path.display())),
    }
}

/// Renders and overwrites the cache file, returning the fresh HTML.
pub fn write_cache(dir: &Path, id: &str, markdown: &str) -> Result<String> {
    let html = render_markdown(markdown);
    fs::create_dir_all(dir).with_context(|| format!("creating story cache dir {}", dir.display()))?;
    let path = cache_path(dir, id);
    fs::write(&path, &html).with_context(|| format!("writing story cache {}", path.display()))?;
    Ok(html)
}

/// Removes the cache file. A file that is already gone is not an error.
pub fn remove_cache(dir: &Path, id: &str) -> Result<()> {
    let path = cache_path(dir, id);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing story cache {}", path.display())),
    }
}
