use docchat_agent::SessionContextManager;
use docchat_session::PairingMode;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

const EXIT_COMMAND: &str = "/exit";

/// Interactive session settings.
pub struct Repl {
    pub session_key: String,
    pub transcript_path: PathBuf,
    pub pairing: PairingMode,
}

impl Repl {
    /// Read lines until `/exit` or end of input, then export the transcript.
    ///
    /// A line naming an existing path loads that file as the document; any
    /// other non-blank line is a chat turn.
    pub async fn run<R, W>(
        &self,
        manager: &SessionContextManager,
        input: R,
        out: &mut W,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        manager.start_session(&self.session_key).await;
        writeln!(out, "You are now conversing with your assistant.")?;
        writeln!(out, "You can load a document by entering the path to the file.")?;

        let mut lines = input.lines();
        loop {
            writeln!(
                out,
                "Enter your query or a file path to load a document ('{EXIT_COMMAND}' to quit):"
            )?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line == EXIT_COMMAND {
                writeln!(out, "Goodbye!")?;
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            if tokio::fs::metadata(&line).await.is_ok() {
                match manager.load_document(Path::new(&line)).await {
                    Ok(doc) => writeln!(
                        out,
                        "Document loaded from {} ({} characters).",
                        doc.source_path.display(),
                        doc.char_count()
                    )?,
                    Err(e) => writeln!(out, "Could not load document: {e}")?,
                }
                continue;
            }

            match manager.chat(&self.session_key, &line).await {
                Ok(answer) => writeln!(out, "Assistant: {answer}")?,
                Err(e) => {
                    warn!(session = %self.session_key, error = %e, "Chat turn failed");
                    writeln!(out, "Error: {e}")?;
                }
            }
            writeln!(out, "{}", "-".repeat(30))?;
        }

        manager
            .export_transcript(&self.session_key, &self.transcript_path, self.pairing)
            .await?;
        writeln!(out, "History saved to {}", self.transcript_path.display())?;
        Ok(())
    }
}
