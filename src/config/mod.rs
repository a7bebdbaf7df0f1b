use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs::{self, ensure_dir_exists};

pub struct PathSet {
    pub config_path: PathBuf,
    pub data_path: PathBuf,
}

impl PathSet {
    pub fn new(config_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => match env::var("CHATWATCH_CONFIG") {
                Ok(path) => PathBuf::from(path),
                Err(_) => dirs::config_dir()?,
            },
        };

        let data_path = match data_path {
            Some(path) => path,
            None => match env::var("CHATWATCH_DATA") {
                Ok(path) => PathBuf::from(path),
                Err(_) => dirs::data_dir()?,
            },
        };

        ensure_dir_exists(&config_path)
            .with_context(|| format!("ensure config directory: {}", config_path.display()))?;
        ensure_dir_exists(&data_path)
            .with_context(|| format!("ensure data directory: {}", data_path.display()))?;

        Ok(Self {
            config_path,
            data_path,
        })
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_path.join(format!("{name}.toml"))
    }

    pub fn load_config<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_file(name);
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s)
                .with_context(|| format!("parse config toml: {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                default_func()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }
}

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        name: String,
    }

    impl CommonConfig for TestConfig {
        fn default() -> Self {
            Self {
                name: String::from("default"),
            }
        }

        fn complete(&mut self, _ps: &PathSet) -> Result<()> {
            self.name = expandenv("name", &self.name)?;
            Ok(())
        }
    }

    fn test_path_set() -> (tempfile::TempDir, PathSet) {
        let dir = tempfile::tempdir().unwrap();
        let ps = PathSet::new(
            Some(dir.path().join("config")),
            Some(dir.path().join("data")),
        )
        .unwrap();
        (dir, ps)
    }

    #[test]
    fn test_load_default() {
        let (_dir, ps) = test_path_set();
        assert!(ps.config_path.is_dir());
        assert!(ps.data_path.is_dir());

        assert!(!ps.config_file("test").exists());

        let cfg: TestConfig = ps.load_config("test", TestConfig::default).unwrap();
        assert_eq!(cfg.name, "default");
    }

    #[test]
    fn test_load_file() {
        let (_dir, ps) = test_path_set();
        let path = ps.config_file("test");
        assert_eq!(path, ps.config_path.join("test.toml"));
        fs::write(&path, "name = \"from-file\"\n").unwrap();

        let cfg: TestConfig = ps.load_config("test", TestConfig::default).unwrap();
        assert_eq!(cfg.name, "from-file");
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, ps) = test_path_set();
        fs::write(ps.config_path.join("test.toml"), "name = [").unwrap();

        let result: Result<TestConfig> = ps.load_config("test", TestConfig::default);
        assert!(result.is_err());
    }
}
