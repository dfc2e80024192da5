//! PDF rendering of cleaned HTML

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::RendererConfig;
use crate::error::{Error, Result};

/// Renders an HTML document into a PDF file
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `html` and write the PDF to `output`
    async fn render(&self, html: &str, output: &Path) -> Result<()>;
}

#[async_trait]
impl<T: DocumentRenderer + ?Sized> DocumentRenderer for &T {
    async fn render(&self, html: &str, output: &Path) -> Result<()> {
        (**self).render(html, output).await
    }
}

/// Renders through an external `wkhtmltopdf`-compatible command
///
/// The command is run as `<command> <args..> - <output>` with the HTML on
/// stdin.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    command: String,
    args: Vec<String>,
}

impl WkhtmltopdfRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

#[async_trait]
impl DocumentRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str, output: &Path) -> Result<()> {
        debug!("Rendering {} with {}", output.display(), self.command);

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Render(format!("failed to start {}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(html.as_bytes())
                .await
                .map_err(|e| Error::Render(format!("failed to write to {}: {}", self.command, e)))?;
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Render(format!("{} did not finish: {}", self.command, e)))?;

        if result.status.success() {
            Ok(())
        } else {
            Err(Error::Render(format!(
                "{} exited with {}: {}",
                self.command,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )))
        }
    }
}
