//! INI file configuration adapter.

use crate::domain::error::TradecoreError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradecoreError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TradecoreError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradecoreError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradecoreError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[account]
size = 50000.0

[scan]
universe = BHP:materials, CBA:financials
batch_size = 5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("scan", "universe"),
            Some("BHP:materials, CBA:financials".to_string())
        );
        assert_eq!(adapter.get_double("account", "size", 0.0), 50000.0);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[limits]\nmax_position_size = 0.1\n").unwrap();
        assert_eq!(adapter.get_string("limits", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_values_and_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[signal]\nrsi_period = 10\natr_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("signal", "rsi_period", 14), 10);
        assert_eq!(adapter.get_int("signal", "atr_period", 14), 14);
        assert_eq!(adapter.get_int("signal", "missing", 42), 42);
    }

    #[test]
    fn get_usize_rejects_negative() {
        let adapter = FileConfigAdapter::from_string("[scan]\nbatch_size = -3\n").unwrap();
        assert_eq!(adapter.get_usize("scan", "batch_size", 5), 5);
    }

    #[test]
    fn get_double_values_and_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[stops]\natr_multiplier = 2.5\npump = high\n").unwrap();
        assert_eq!(adapter.get_double("stops", "atr_multiplier", 0.0), 2.5);
        assert_eq!(adapter.get_double("stops", "pump", 99.9), 99.9);
        assert_eq!(adapter.get_double("stops", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_variants() {
        let adapter = FileConfigAdapter::from_string(
            "[blacklist]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        for key in ["a", "b", "c"] {
            assert!(adapter.get_bool("blacklist", key, false));
        }
        for key in ["d", "e", "f"] {
            assert!(!adapter.get_bool("blacklist", key, true));
        }
        assert!(adapter.get_bool("blacklist", "missing", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[stops]\ndynamic_stop_loss = no\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(!adapter.get_bool("stops", "dynamic_stop_loss", true));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TradecoreError::ConfigParse { .. })));
    }
}
