//! Saving and loading learned Q-tables
//!
//! A snapshot file is the tag `SLQT` followed by a bincode-encoded [`Snapshot`]. Files without the
//! tag are read as a bare table from before episode counts were recorded; when loaded from a
//! checkpoint file named like `100sess.bin`, the count is taken from the name.

use std::{fs, io, path::Path};

use bincode::config;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{algo::QTable, error::PersistenceError, gym::VisionState};

const TAG: &[u8; 4] = b"SLQT";

/// A learned table plus the number of episodes it was trained for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub episodes: u64,
    pub q_table: QTable<VisionState>,
}

impl Snapshot {
    pub fn new(q_table: QTable<VisionState>, episodes: u64) -> Self {
        Self { episodes, q_table }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        let mut bytes = TAG.to_vec();
        bytes.extend(bincode::serde::encode_to_vec(self, config::standard())?);
        Ok(bytes)
    }

    /// Decode a tagged snapshot, or a bare table whose episode count is unknown and read as 0
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        match bytes.strip_prefix(TAG.as_slice()) {
            Some(body) => decode_exact(body),
            None => Ok(Self::new(decode_exact(bytes)?, 0)),
        }
    }

    /// Write the snapshot to `path`, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_bytes()?)?;

        info!(
            "Saved model to {} ({} states, {} episodes)",
            path.display(),
            self.q_table.len(),
            self.episodes
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PersistenceError::NotFound(path.to_path_buf()),
            _ => PersistenceError::Io(e),
        })?;
        let mut snapshot = Self::from_bytes(&bytes)?;
        if !bytes.starts_with(TAG) {
            snapshot.episodes = episodes_from_name(path).unwrap_or(0);
        }

        info!(
            "Loaded model from {} ({} states, {} episodes)",
            path.display(),
            snapshot.q_table.len(),
            snapshot.episodes
        );
        Ok(snapshot)
    }

    /// Load a snapshot that must hold at least one learned state
    ///
    /// Playing from an empty table would silently fall back to tie breaking on every move.
    pub fn load_trained(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let snapshot = Self::load(path)?;
        if snapshot.q_table.is_empty() {
            return Err(PersistenceError::EmptyModel(path.to_path_buf()));
        }
        Ok(snapshot)
    }
}

/// Episode count encoded in a checkpoint name such as `100sess.bin`
fn episodes_from_name(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let (count, _) = name.split_once("sess")?;
    count.parse().ok()
}

fn decode_exact<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, PersistenceError> {
    let (value, read) = bincode::serde::decode_from_slice(bytes, config::standard())?;
    if read != bytes.len() {
        return Err(PersistenceError::TrailingBytes(bytes.len() - read));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, process};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        algo::ActionValues,
        gym::{Dir, Slither, SlitherConfig},
    };

    use super::*;

    /// A table of `n` distinct states with arbitrary values
    fn table(n: usize) -> QTable<VisionState> {
        let mut env = Slither::with_seed(SlitherConfig::default(), 17).unwrap();
        let mut rng = StdRng::seed_from_u64(18);
        let mut table = QTable::new();
        let mut attempts = 0;

        while table.len() < n {
            attempts += 1;
            assert!(attempts < 1_000_000, "Ran out of distinct states");

            if let Some(state) = env.state() {
                let values: ActionValues = [rng.gen(), rng.gen(), -rng.gen::<f32>(), rng.gen()];
                table.insert(state, values);
            }
            let dir = Dir::try_from(rng.gen_range(0..4usize)).unwrap();
            if env.advance(dir).map_or(true, |(_, done)| done) {
                env = Slither::with_seed(SlitherConfig::default(), rng.gen()).unwrap();
            }
        }
        table
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir()
            .join(format!("slither-test-{}", process::id()))
            .join(name)
    }

    #[test]
    fn round_trip_in_memory() {
        for n in [0, 1, 1000] {
            let snapshot = Snapshot::new(table(n), 4242);
            let bytes = snapshot.to_bytes().unwrap();
            let loaded = Snapshot::from_bytes(&bytes).unwrap();

            assert_eq!(loaded.q_table.len(), n, "State count preserved for n = {n}");
            assert_eq!(loaded, snapshot, "Mapping and episodes preserved for n = {n}");
        }
    }

    #[test]
    fn round_trip_through_file() {
        let path = temp_path("nested/dir/model.bin");
        let snapshot = Snapshot::new(table(50), 100);

        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn bare_table_loads_with_unknown_episodes() {
        let q_table = table(10);
        let bare: HashMap<VisionState, ActionValues> = q_table.iter().map(|(s, v)| (*s, *v)).collect();
        let bytes = bincode::serde::encode_to_vec(&bare, config::standard()).unwrap();

        let loaded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.episodes, 0);
        assert_eq!(loaded.q_table, q_table);
    }

    #[test]
    fn bare_checkpoint_takes_episodes_from_its_name() {
        let bare: HashMap<VisionState, ActionValues> = table(4).iter().map(|(s, v)| (*s, *v)).collect();
        let bytes = bincode::serde::encode_to_vec(&bare, config::standard()).unwrap();
        let path = temp_path("250sess.bin");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();

        assert_eq!(Snapshot::load(&path).unwrap().episodes, 250);
        assert_eq!(episodes_from_name(Path::new("models/model.bin")), None);
        assert_eq!(episodes_from_name(Path::new("xsess.bin")), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file() {
        let path = temp_path("does-not-exist.bin");
        assert!(matches!(
            Snapshot::load(&path),
            Err(PersistenceError::NotFound(p)) if p == path
        ));
    }

    #[test]
    fn corrupt_bytes() {
        assert!(Snapshot::from_bytes(b"SLQT\xff\xff\xff").is_err());
        assert!(Snapshot::from_bytes(b"\x05garbage").is_err());

        let mut bytes = Snapshot::new(table(3), 1).to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(PersistenceError::TrailingBytes(1))
        ));
    }

    #[test]
    fn empty_model_is_refused_for_play() {
        let path = temp_path("empty.bin");
        Snapshot::new(QTable::new(), 10).save(&path).unwrap();

        assert!(matches!(
            Snapshot::load_trained(&path),
            Err(PersistenceError::EmptyModel(_))
        ));
        assert!(Snapshot::load(&path).is_ok(), "Plain loading still works");

        let _ = fs::remove_file(&path);
    }
}
