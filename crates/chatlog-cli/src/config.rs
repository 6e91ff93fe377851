//! Extraction settings.
//!
//! Defaults are overridden by environment variables, which are in turn
//! overridden by command-line flags in `main`.

use std::path::{Path, PathBuf};

use anyhow::bail;

use chatlog_shared::constants::{ACCOUNT_ID_PREFIX, FILE_STORAGE_DIR, IMAGE_DIR};

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Storage root of one local account.
    pub data_path: PathBuf,

    /// Directory the transcript files are written to.
    /// Env: `CHATLOG_OUTPUT_DIR`
    /// Default: `./data`
    pub output_dir: PathBuf,

    /// Local account id. Derived from `data_path` when unset.
    /// Env: `CHATLOG_ACCOUNT_ID`
    pub account_id: Option<String>,

    /// Where decrypted images are cached.
    /// Env: `CHATLOG_IMAGE_DIR`
    /// Default: `<data_path>/FileStorage/Image`
    pub image_dir: Option<PathBuf>,

    /// External decryption command, run as `<cmd> <encrypted> <output>`.
    /// Env: `CHATLOG_DECRYPT_CMD`
    /// Default: none, images keep their encrypted path.
    pub decrypt_cmd: Option<String>,

    /// Comma-separated menu indices; the menu prompts on stdin when unset.
    pub selection: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::new(),
            output_dir: PathBuf::from("data"),
            account_id: None,
            image_dir: None,
            decrypt_cmd: None,
            selection: None,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = non_blank(&var, "CHATLOG_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(dir) = non_blank(&var, "CHATLOG_IMAGE_DIR") {
            config.image_dir = Some(PathBuf::from(dir));
        }

        if let Some(cmd) = non_blank(&var, "CHATLOG_DECRYPT_CMD") {
            config.decrypt_cmd = Some(cmd);
        }

        if let Some(id) = non_blank(&var, "CHATLOG_ACCOUNT_ID") {
            config.account_id = Some(id);
        }

        config
    }

    /// The local account id: the explicit setting, else the last component
    /// of the data path, which must carry the account prefix.
    pub fn account_id(&self) -> anyhow::Result<String> {
        if let Some(id) = &self.account_id {
            return Ok(id.clone());
        }

        let derived = self
            .data_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !derived.starts_with(ACCOUNT_ID_PREFIX) {
            bail!(
                "could not derive an account id from {}: got {derived:?}, pass --account-id",
                self.data_path.display()
            );
        }
        Ok(derived)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| default_image_dir(&self.data_path))
    }
}

fn default_image_dir(data_path: &Path) -> PathBuf {
    data_path.join(FILE_STORAGE_DIR).join(IMAGE_DIR)
}

fn non_blank(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = var(key)?;
    if value.trim().is_empty() {
        tracing::warn!(key, "Blank value ignored, using default");
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ExtractConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert!(config.decrypt_cmd.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ExtractConfig::from_vars(vars(&[
            ("CHATLOG_OUTPUT_DIR", "/tmp/out"),
            ("CHATLOG_DECRYPT_CMD", "dat2img --auto"),
            ("CHATLOG_IMAGE_DIR", "   "),
        ]));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.decrypt_cmd.as_deref(), Some("dat2img --auto"));
        assert!(config.image_dir.is_none());
    }

    #[test]
    fn test_account_id_from_path() {
        let config = ExtractConfig {
            data_path: PathBuf::from("/exports/User/wxid_abc123"),
            ..Default::default()
        };
        assert_eq!(config.account_id().unwrap(), "wxid_abc123");
        assert_eq!(
            config.image_dir(),
            PathBuf::from("/exports/User/wxid_abc123/FileStorage/Image")
        );
    }

    #[test]
    fn test_account_id_requires_prefix() {
        let derived = ExtractConfig {
            data_path: PathBuf::from("/exports/User/alice"),
            ..Default::default()
        };
        assert!(derived.account_id().is_err());

        let explicit = ExtractConfig {
            account_id: Some("alice".into()),
            ..derived
        };
        assert_eq!(explicit.account_id().unwrap(), "alice");
    }
}
