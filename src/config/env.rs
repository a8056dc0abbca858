use super::CivicConfig;

pub const CONFIG_PATH_VAR: &str = "CIVICOS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "civicos.toml";

/// Config file path from `CIVICOS_CONFIG`, or `civicos.toml`
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

impl CivicConfig {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CIVICOS_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Some(v) = lookup("CIVICOS_ORACLE_URL") {
            if !v.trim().is_empty() {
                self.oracle.endpoint = v;
            }
        }
        if let Some(v) = lookup("CIVICOS_AUTOSTART") {
            if let Ok(b) = v.parse::<bool>() {
                self.cycle.autostart = b;
            }
        }
        if let Some(v) = lookup("CIVICOS_SEED") {
            if let Ok(seed) = v.parse::<u64>() {
                self.simulation.seed = Some(seed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = CivicConfig::default();
        config.apply_overrides(lookup(&[
            ("CIVICOS_PORT", "9090"),
            ("CIVICOS_ORACLE_URL", "http://relay:3001/api/cycle"),
            ("CIVICOS_AUTOSTART", "true"),
            ("CIVICOS_SEED", "42"),
        ]));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.oracle.endpoint, "http://relay:3001/api/cycle");
        assert!(config.cycle.autostart);
        assert_eq!(config.simulation.seed, Some(42));
    }

    #[test]
    fn test_unparseable_values_ignored() {
        let mut config = CivicConfig::default();
        config.apply_overrides(lookup(&[
            ("CIVICOS_PORT", "eighty"),
            ("CIVICOS_ORACLE_URL", "  "),
            ("CIVICOS_AUTOSTART", "yes please"),
            ("CIVICOS_SEED", "-1"),
        ]));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.oracle.endpoint, "http://localhost:3001/api/cycle");
        assert!(!config.cycle.autostart);
        assert_eq!(config.simulation.seed, None);
    }
}
