use crate::configs::{BackoffKind, Config};

const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

pub struct BannerInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub commit: &'static str,
    pub profile: &'static str,
}

impl Default for BannerInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            branch: env_or!("GIT_BRANCH", "unknown"),
            commit: env_or!("GIT_COMMIT_SHORT", "unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

/// Label/value pairs shown under the logo.
pub fn rows(info: &BannerInfo, config: &Config) -> Vec<(&'static str, String)> {
    let player = &config.player;
    let backoff = match player.backoff {
        BackoffKind::Fixed => "fixed",
        BackoffKind::Exponential => "exponential",
    };

    vec![
        ("Version", info.version.to_string()),
        ("Commit", format!("{} ({})", info.commit, info.branch)),
        ("Profile", info.profile.to_string()),
        ("Prefix", config.bot.prefix.clone()),
        ("Stations", config.stations.len().to_string()),
        (
            "Reconnect",
            format!(
                "{} x {}ms, {}",
                player.max_retries, player.retry_delay_ms, backoff
            ),
        ),
    ]
}

pub fn print_banner(info: &BannerInfo, config: &Config) {
    println!();
    println!("{GREEN}    _    _                              {RESET}");
    println!("{GREEN}   / \\  (_)_ ____      ____ ___   _____ {RESET}");
    println!("{GREEN}  / _ \\ | | '__\\ \\ /\\ / / _` \\ \\ / / _ \\{RESET}");
    println!("{GREEN} / ___ \\| | |   \\ V  V / (_| |\\ V /  __/{RESET}");
    println!("{GREEN}/_/   \\_\\_|_|    \\_/\\_/ \\__,_| \\_/ \\___|{RESET}");
    println!("{DIM}========================================{RESET}");
    println!();

    for (label, value) in rows(info, config) {
        let colour = match label {
            "Version" => CYAN,
            "Profile" => YELLOW,
            _ => RESET,
        };
        println!("  {BOLD}{label:<14}{RESET}{colour}{value}{RESET}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_reflect_the_config() {
        let info = BannerInfo {
            version: "1.2.3",
            branch: "main",
            commit: "abc1234",
            profile: "debug",
        };
        let mut config = Config::default();
        config
            .stations
            .insert("jazz".into(), "https://radio.example.com/jazz.mp3".into());

        let rows = rows(&info, &config);
        let get = |label: &str| rows.iter().find(|(l, _)| *l == label).map(|(_, v)| v.as_str());
        assert_eq!(get("Commit"), Some("abc1234 (main)"));
        assert_eq!(get("Prefix"), Some(",,"));
        assert_eq!(get("Stations"), Some("1"));
        assert_eq!(get("Reconnect"), Some("3 x 5000ms, fixed"));
    }
}
