//! Score ledger: lifetime wins per guesser slot, persisted as text.
//!
//! File format is one line per guesser slot, `<slot> <wins> <name>`, where the
//! name runs to the end of the line.

use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::types::Slot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub name: String,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLedger {
    entries: [LedgerEntry; 2],
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self {
            entries: [
                LedgerEntry {
                    name: "GuesserA".to_string(),
                    wins: 0,
                },
                LedgerEntry {
                    name: "GuesserB".to_string(),
                    wins: 0,
                },
            ],
        }
    }
}

impl ScoreLedger {
    fn offset(slot: Slot) -> Option<usize> {
        match slot {
            Slot::Guesser1 => Some(0),
            Slot::Guesser2 => Some(1),
            Slot::Wordmaster => None,
        }
    }

    pub fn entry(&self, slot: Slot) -> Option<&LedgerEntry> {
        Self::offset(slot).map(|i| &self.entries[i])
    }

    /// Add one win to `slot`, renaming the entry to `name` when one is given
    pub fn credit_win(&mut self, slot: Slot, name: Option<&str>) {
        let Some(i) = Self::offset(slot) else {
            return;
        };
        let entry = &mut self.entries[i];
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            entry.name = name.to_string();
        }
        entry.wins = entry.wins.saturating_add(1);
    }

    /// Defaults overlaid with every well-formed record in `text`
    pub fn parse(text: &str) -> Self {
        let mut ledger = Self::default();
        for line in text.lines() {
            let mut parts = line.trim().splitn(3, ' ');
            let (Some(slot), Some(wins), Some(name)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let slot = slot.parse::<usize>().ok().and_then(Slot::from_index);
            let Some(i) = slot.and_then(Self::offset) else {
                continue;
            };
            let Ok(wins) = wins.parse::<u32>() else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            ledger.entries[i] = LedgerEntry {
                name: name.to_string(),
                wins,
            };
        }
        ledger
    }

    pub fn render(&self) -> String {
        Slot::GUESSERS
            .iter()
            .zip(&self.entries)
            .map(|(slot, e)| format!("{} {} {}\n", slot, e.wins, e.name))
            .collect()
    }

    /// Read the ledger at `path`, creating an empty file if there is none
    pub async fn load(path: &Path) -> Result<Self, LedgerError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No score file at {}, starting fresh", path.display());
                tokio::fs::write(path, "")
                    .await
                    .map_err(|source| LedgerError::Write {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(Self::default())
            }
            Err(source) => Err(LedgerError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Replace the file at `path` with the current values for both slots
    pub async fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let tmp = tmp_path(path);
        let write_err = |source| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        };
        tokio::fs::write(&tmp, self.render())
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(write_err)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overlays_defaults() {
        let ledger = ScoreLedger::parse("2 7 Bob the Builder\n");
        assert_eq!(ledger.entry(Slot::Guesser1).unwrap().name, "GuesserA");
        assert_eq!(ledger.entry(Slot::Guesser1).unwrap().wins, 0);
        let b = ledger.entry(Slot::Guesser2).unwrap();
        assert_eq!(b.name, "Bob the Builder");
        assert_eq!(b.wins, 7);
    }

    #[test]
    fn test_parse_ignores_malformed_lines() {
        let text = "garbage\n0 4 Wordy\n3 1 Nobody\n1 x Alice\n1 2\n\n1 5 Alice\n";
        let ledger = ScoreLedger::parse(text);
        assert_eq!(
            ledger.entry(Slot::Guesser1),
            Some(&LedgerEntry {
                name: "Alice".to_string(),
                wins: 5
            })
        );
        assert_eq!(ledger.entry(Slot::Guesser2).unwrap().name, "GuesserB");
        assert!(ledger.entry(Slot::Wordmaster).is_none());
    }

    #[test]
    fn test_credit_win_renames_and_counts() {
        let mut ledger = ScoreLedger::default();
        ledger.credit_win(Slot::Guesser2, Some("Zed"));
        ledger.credit_win(Slot::Guesser2, None);
        ledger.credit_win(Slot::Wordmaster, Some("ignored"));
        assert_eq!(ledger.render(), "1 0 GuesserA\n2 2 Zed\n");
    }

    #[test]
    fn test_credit_win_saturates() {
        let mut ledger = ScoreLedger::parse("1 4294967295 Max\n");
        ledger.credit_win(Slot::Guesser1, None);
        assert_eq!(ledger.entry(Slot::Guesser1).unwrap().wins, u32::MAX);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.txt");

        let mut ledger = ScoreLedger::default();
        ledger.credit_win(Slot::Guesser1, Some("Ann Marie"));
        ledger.credit_win(Slot::Guesser1, None);
        ledger.credit_win(Slot::Guesser2, Some("Bo"));
        ledger.save(&path).await.unwrap();

        let loaded = ScoreLedger::load(&path).await.unwrap();
        assert_eq!(loaded, ledger);
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.txt");

        let ledger = ScoreLedger::load(&path).await.unwrap();
        assert_eq!(ledger, ScoreLedger::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_fails_when_file_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("scores.txt");

        let err = ScoreLedger::load(&path).await.unwrap_err();
        assert!(matches!(err, LedgerError::Write { .. }));
    }
}
