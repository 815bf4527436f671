//! JSON file backend.
//!
//! Stores the ticket table as one pretty-printed JSON array, in the same
//! layout as the legacy `UUID.json` file.

use crate::error::{Result, TicketError};
use crate::providers::TicketBackend;
use crate::state::Ticket;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Ticket table persisted to a JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous table intact.
///
/// # Example
///
/// ```no_run
/// use qrlogin_auth::stores::{JsonFileBackend, TableTicketStore};
///
/// # async fn example() {
/// let store = TableTicketStore::open(JsonFileBackend::new("tickets.json")).await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the file at `path`. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the table.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TicketBackend for JsonFileBackend {
    async fn load(&self) -> Result<Vec<Ticket>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Ticket file absent, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(TicketError::Persistence(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, tickets: &[Ticket]) -> Result<()> {
        let json = serde_json::to_vec_pretty(tickets)?;
        let temp = self.temp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TicketError::Persistence(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&temp, json).await.map_err(|e| {
            TicketError::Persistence(format!("Failed to write {}: {e}", temp.display()))
        })?;

        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            TicketError::Persistence(format!(
                "Failed to replace {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::trace!(path = %self.path.display(), tickets = tickets.len(), "Saved ticket table");
        Ok(())
    }
}
