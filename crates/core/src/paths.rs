use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".attune"))
            .unwrap_or_else(|| PathBuf::from(".attune"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Directory holding one JSON document per storage key.
    pub fn data_dir(&self) -> PathBuf {
        self.base.join("data")
    }

    pub fn document_file(&self, key: &str) -> PathBuf {
        let safe_key = key.replace([':', '/', '\\', '.'], "_");
        self.data_dir().join(format!("{}.json", safe_key))
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
