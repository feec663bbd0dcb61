use super::ViewSyncConfig;
use std::str::FromStr;

impl ViewSyncConfig {
    /// Apply `VIEWSYNC_*` environment variables on top of the loaded config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = parsed(&lookup, "VIEWSYNC_HISTORY_CAPACITY") {
            self.store.history_capacity = n;
        }
        if let Some(n) = parsed(&lookup, "VIEWSYNC_QUEUE_CAPACITY") {
            self.push.queue_capacity = n;
        }
        if let Some(b) = parsed(&lookup, "VIEWSYNC_PUSH_ENABLED") {
            self.push.enabled = b;
        }
        if let Some(b) = parsed(&lookup, "VIEWSYNC_STRICT_VALIDATION") {
            self.registry.strict_validation = b;
        }
        if let Some(bind) = lookup("VIEWSYNC_BIND") {
            if !bind.trim().is_empty() {
                self.api.bind = bind;
            }
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = ViewSyncConfig::default();
        config.apply_overrides(lookup_from(&[
            ("VIEWSYNC_HISTORY_CAPACITY", "25"),
            ("VIEWSYNC_QUEUE_CAPACITY", "4"),
            ("VIEWSYNC_PUSH_ENABLED", "false"),
            ("VIEWSYNC_STRICT_VALIDATION", "true"),
            ("VIEWSYNC_BIND", "127.0.0.1:7000"),
        ]));

        assert_eq!(config.store.history_capacity, 25);
        assert_eq!(config.push.queue_capacity, 4);
        assert!(!config.push.enabled);
        assert!(config.registry.strict_validation);
        assert_eq!(config.api.bind, "127.0.0.1:7000");
    }

    #[test]
    fn test_unparseable_values_ignored() {
        let mut config = ViewSyncConfig::default();
        config.apply_overrides(lookup_from(&[
            ("VIEWSYNC_HISTORY_CAPACITY", "lots"),
            ("VIEWSYNC_PUSH_ENABLED", "maybe"),
            ("VIEWSYNC_BIND", "  "),
        ]));

        assert_eq!(config.store.history_capacity, 1000);
        assert!(config.push.enabled);
        assert_eq!(config.api.bind, "0.0.0.0:8090");
    }
}
