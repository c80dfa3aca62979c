use chub_search::{ImportHost, ImportedFile, Notice, NoticeLevel};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

/// Import host that saves characters to a directory
pub struct DirectoryHost {
    output: PathBuf,
    token: Option<String>,
}

impl DirectoryHost {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            token: std::env::var("CHUB_CSRF_TOKEN").ok(),
        }
    }
}

impl ImportHost for DirectoryHost {
    fn request_headers(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) => vec![("X-CSRF-Token".to_string(), token.clone())],
            None => Vec::new(),
        }
    }

    fn import_file(
        &self,
        file: ImportedFile,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Never let a server supplied name escape the output directory
        let name = std::path::Path::new(&file.name)
            .file_name()
            .ok_or_else(|| format!("invalid file name {:?}", file.name))?;
        fs::create_dir_all(&self.output)?;
        let path = self.output.join(name);
        fs::write(&path, &file.bytes)?;
        log::debug!("Wrote {} ({:?})", path.display(), file.mime);
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => eprintln!("{} {}", "Warning:".yellow(), notice.message),
            NoticeLevel::Error => eprintln!("{} {}", "Error:".red(), notice.message),
        }
    }
}
