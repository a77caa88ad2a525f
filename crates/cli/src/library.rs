use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use template::{cache::TtlCache, Template};
use tracing::debug;

/// Templates stored as `<dir>/<name>.json`, read through a TTL cache.
pub struct TemplateLibrary {
    dir: PathBuf,
    cache: TtlCache<String, Template>,
}

impl TemplateLibrary {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            cache: TtlCache::new(ttl),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
        {
            bail!("invalid template name: {name:?}");
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    pub async fn load(&mut self, name: &str) -> Result<Template> {
        if let Some(template) = self.cache.get(&name.to_string()) {
            debug!(name, "template cache hit");
            return Ok(template.clone());
        }
        let path = self.path_for(name)?;
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading template {}", path.display()))?;
        let mut template: Template = serde_json::from_str(&raw)
            .with_context(|| format!("parsing template {}", path.display()))?;
        template
            .validate()
            .with_context(|| format!("validating template {}", path.display()))?;
        template.reflow();
        self.cache.insert(name.to_string(), template.clone());
        Ok(template)
    }

    pub async fn save(&mut self, name: &str, template: &Template) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(template)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing template {}", path.display()))?;
        self.cache.insert(name.to_string(), template.clone());
        Ok(path)
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
