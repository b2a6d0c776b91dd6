use clap::Parser;
use rvb_core::Chips;

/// Server configuration. Every option doubles as an environment variable so
/// container deployments need no flags at all.
#[derive(Parser, Debug, Clone)]
#[command(name = "riverboat", about = "Authoritative real-time hold'em server")]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
    /// Platform web API key for ticket validation; unset selects the mock
    /// identity provider (development only).
    #[arg(long, env = "STEAM_API_KEY")]
    pub steam_api_key: Option<String>,
    #[arg(long, env = "STEAM_APP_ID", default_value_t = 0)]
    pub steam_app_id: u32,
    #[arg(long, env = "DEFAULT_BUY_IN", default_value_t = rvb_core::DEFAULT_BUY_IN)]
    pub default_buy_in: Chips,
    #[arg(long, env = "DEFAULT_SMALL_BLIND", default_value_t = rvb_core::DEFAULT_SMALL_BLIND)]
    pub default_small_blind: Chips,
    #[arg(long, env = "DEFAULT_BIG_BLIND", default_value_t = rvb_core::DEFAULT_BIG_BLIND)]
    pub default_big_blind: Chips,
    #[arg(long, env = "TURN_TIMEOUT_MS", default_value_t = rvb_core::TURN_TIMEOUT_MS)]
    pub turn_timeout_ms: u64,
    #[arg(long, env = "BANTER_PHASE_MS", default_value_t = rvb_core::BANTER_PHASE_MS)]
    pub banter_phase_ms: u64,
    #[arg(long, env = "PAYOUT_ANIMATION_MS", default_value_t = rvb_core::PAYOUT_ANIMATION_MS)]
    pub payout_animation_ms: u64,
    #[arg(long, env = "COUNTDOWN_MS", default_value_t = rvb_core::COUNTDOWN_MS)]
    pub countdown_ms: u64,
    #[arg(long, env = "SESSION_GRACE_MS", default_value_t = rvb_core::SESSION_GRACE_MS)]
    pub session_grace_ms: u64,
    #[arg(long, env = "SOCIAL_TICK_HZ", default_value_t = rvb_core::SOCIAL_TICK_HZ)]
    pub social_tick_hz: u64,
}

impl Config {
    /// Per-table tuning derived from the server options.
    pub fn table(&self) -> rvb_gameplay::Config {
        rvb_gameplay::Config {
            seats: rvb_core::MAX_SEATS,
            small_blind: self.default_small_blind,
            big_blind: self.default_big_blind,
            countdown_ms: self.countdown_ms,
            turn_ms: self.turn_timeout_ms,
            payout_ms: self.payout_animation_ms,
            banter_ms: self.banter_phase_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_protocol() {
        let config = Config::parse_from(["riverboat", "--database-url", "postgres://x/y"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_buy_in, 1000);
        assert_eq!(config.default_small_blind, 10);
        assert_eq!(config.default_big_blind, 20);
        assert_eq!(config.turn_timeout_ms, 30_000);
        assert_eq!(config.session_grace_ms, 60_000);
        assert_eq!(config.social_tick_hz, 10);
    }

    #[test]
    fn table_config_inherits_blinds() {
        let config = Config::parse_from([
            "riverboat",
            "--database-url",
            "postgres://x/y",
            "--default-small-blind",
            "25",
            "--default-big-blind",
            "50",
        ]);
        let table = config.table();
        assert_eq!(table.small_blind, 25);
        assert_eq!(table.big_blind, 50);
    }
}
