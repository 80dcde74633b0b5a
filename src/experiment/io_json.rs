// Snapshots of instances and profiles in JSON.

use std::fs::File;
use std::io::{BufWriter, Write};

use pb_instances::interfaces::InstanceStore;
use serde::{Deserialize, Serialize};

use crate::experiment::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct StoredInstance {
    instance: Instance,
    profile: Profile,
}

/// Writes each instance with its profile as `<key>.json` in a directory.
pub struct JsonInstanceStore {
    root: PathBuf,
}

impl JsonInstanceStore {
    /// Opens the store, creating the directory if needed.
    pub fn create(root: &Path) -> ExpResult<JsonInstanceStore> {
        fs::create_dir_all(root).context(CreatingDirSnafu {
            path: root.display().to_string(),
        })?;
        Ok(JsonInstanceStore {
            root: root.to_path_buf(),
        })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl InstanceStore for JsonInstanceStore {
    type Error = ExperimentError;

    fn save(&mut self, key: &str, instance: &Instance, profile: &Profile) -> ExpResult<()> {
        let path = self.path_for(key);
        let path_s = path.display().to_string();
        debug!("JsonInstanceStore: writing {}", path_s);
        let file = File::create(&path).context(WritingJsonSnafu {
            path: path_s.clone(),
        })?;
        let stored = StoredInstance {
            instance: instance.clone(),
            profile: profile.clone(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &stored).context(EncodingJsonSnafu {
            path: path_s.clone(),
        })?;
        writer.flush().context(WritingJsonSnafu { path: path_s })?;
        Ok(())
    }

    fn load(&self, key: &str) -> ExpResult<(Instance, Profile)> {
        let path_s = self.path_for(key).display().to_string();
        let contents = fs::read_to_string(&path_s).context(OpeningJsonSnafu {
            path: path_s.clone(),
        })?;
        let stored: StoredInstance =
            serde_json::from_str(&contents).context(ParsingJsonSnafu { path: path_s })?;
        Ok((stored.instance, stored.profile))
    }
}

pub fn instance_key(election: usize, variant: usize) -> String {
    format!("instance_{}_{}", election, variant)
}
