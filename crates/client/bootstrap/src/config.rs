//! Host configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use runtime::{AutoSelectPolicy, RuntimeConfig};

/// Configuration required to bootstrap a battle host.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub round_timer_secs: u32,
    pub cooldown_secs: u32,
    pub skip_cooldown: bool,
    pub auto_select: AutoSelectPolicy,
    /// Seed for the roster shuffle. Random when unset.
    pub seed: Option<u64>,
    /// JSON settings file holding `pointsToWin`.
    pub settings_path: Option<PathBuf>,
    /// JSON roster replacing the built-in cards.
    pub roster_path: Option<PathBuf>,
    /// Matches the simulated player plays before exiting.
    pub matches: u32,
    /// Think time of the simulated player before it picks a stat.
    pub player_delay: Duration,
    /// Directory for the rolling log file. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            round_timer_secs: RuntimeConfig::DEFAULT_ROUND_TIMER_SECS,
            cooldown_secs: RuntimeConfig::DEFAULT_COOLDOWN_SECS,
            skip_cooldown: false,
            auto_select: AutoSelectPolicy::default(),
            seed: None,
            settings_path: default_settings_path(),
            roster_path: None,
            matches: 1,
            player_delay: Duration::from_millis(800),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_ROUND_TIMER_SECS` - Selection window length (default: 30)
    /// - `BATTLE_COOLDOWN_SECS` - Pause between rounds (default: 3)
    /// - `BATTLE_SKIP_COOLDOWN` - Start the next round immediately (default: false)
    /// - `BATTLE_AUTO_SELECT` - `first`, `highest` or `seeded:<n>` (default: first)
    /// - `BATTLE_SEED` - Roster shuffle seed (default: random)
    /// - `BATTLE_SETTINGS_PATH` - Settings file (default: platform config dir)
    /// - `BATTLE_ROSTER_PATH` - Roster file (default: built-in roster)
    /// - `BATTLE_MATCHES` - Matches to play (default: 1)
    /// - `BATTLE_PLAYER_DELAY_MS` - Simulated think time (default: 800)
    /// - `BATTLE_LOG_DIR` - Log file directory (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup(read: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = parse::<u32>(read("BATTLE_ROUND_TIMER_SECS")) {
            config.round_timer_secs = secs;
        }

        if let Some(secs) = parse::<u32>(read("BATTLE_COOLDOWN_SECS")) {
            config.cooldown_secs = secs;
        }

        if let Some(skip) = parse::<bool>(read("BATTLE_SKIP_COOLDOWN")) {
            config.skip_cooldown = skip;
        }

        if let Some(policy) = parse::<AutoSelectPolicy>(read("BATTLE_AUTO_SELECT")) {
            config.auto_select = policy;
        }

        config.seed = parse::<u64>(read("BATTLE_SEED"));

        if let Some(path) = read("BATTLE_SETTINGS_PATH") {
            config.settings_path = Some(PathBuf::from(path));
        }

        config.roster_path = read("BATTLE_ROSTER_PATH").map(PathBuf::from);

        if let Some(matches) = parse::<u32>(read("BATTLE_MATCHES")) {
            config.matches = matches.max(1);
        }

        if let Some(ms) = parse::<u64>(read("BATTLE_PLAYER_DELAY_MS")) {
            config.player_delay = Duration::from_millis(ms);
        }

        config.log_dir = read("BATTLE_LOG_DIR").map(PathBuf::from);

        config
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            round_timer_secs: self.round_timer_secs,
            cooldown_secs: self.cooldown_secs,
            skip_cooldown: self.skip_cooldown,
            auto_select: self.auto_select,
            ..RuntimeConfig::default()
        }
    }
}

/// `settings.json` under the platform config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "stat-battle")
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
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
    fn unset_variables_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.round_timer_secs, 30);
        assert_eq!(config.cooldown_secs, 3);
        assert_eq!(config.auto_select, AutoSelectPolicy::FirstListed);
        assert_eq!(config.matches, 1);
        assert!(config.seed.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BATTLE_ROUND_TIMER_SECS", "10"),
            ("BATTLE_SKIP_COOLDOWN", "true"),
            ("BATTLE_AUTO_SELECT", "seeded:9"),
            ("BATTLE_SEED", "42"),
            ("BATTLE_SETTINGS_PATH", "/tmp/battle.json"),
            ("BATTLE_MATCHES", "0"),
            ("BATTLE_PLAYER_DELAY_MS", "50"),
        ]));

        assert_eq!(config.round_timer_secs, 10);
        assert!(config.skip_cooldown);
        assert_eq!(config.auto_select, AutoSelectPolicy::Seeded { seed: 9 });
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/battle.json")));
        assert_eq!(config.matches, 1);
        assert_eq!(config.player_delay, Duration::from_millis(50));

        let runtime = config.to_runtime_config();
        assert_eq!(runtime.round_timer_secs, 10);
        assert!(runtime.skip_cooldown);
        assert_eq!(runtime.decision_guard, RuntimeConfig::DEFAULT_DECISION_GUARD);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BATTLE_COOLDOWN_SECS", "soon"),
            ("BATTLE_AUTO_SELECT", "loudest"),
        ]));
        assert_eq!(config.cooldown_secs, 3);
        assert_eq!(config.auto_select, AutoSelectPolicy::FirstListed);
    }
}
