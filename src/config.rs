use std::env;

use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::model::calendar::WorkCalendarConfig;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub directory_file: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Shift times shared by every worker; a per-shift scheduling service
    /// would own these in a larger deployment.
    pub calendar: WorkCalendarConfig,
}

fn env_time(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .unwrap_or_else(|_| panic!("{} must be HH:MM, got {:?}", key, raw))
}

fn env_time_opt(key: &str) -> Option<NaiveTime> {
    env::var(key).ok().map(|raw| {
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .unwrap_or_else(|_| panic!("{} must be HH:MM, got {:?}", key, raw))
    })
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let shift_start = env_time("SHIFT_START", "08:30");
        let shift_end = env_time("SHIFT_END", "17:50");
        let lunch_start = env_time("LUNCH_START", "11:50");
        let lunch_end = env_time("LUNCH_END", "13:20");
        let secondary_break = match (env_time_opt("BREAK_START"), env_time_opt("BREAK_END")) {
            (Some(bs), Some(be)) => Some((bs, be)),
            (None, None) => None,
            _ => panic!("BREAK_START and BREAK_END must be set together"),
        };
        let standard_hours: f64 = env::var("STANDARD_HOURS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .expect("STANDARD_HOURS must be a number");

        let calendar = WorkCalendarConfig::new(
            shift_start,
            shift_end,
            lunch_start,
            lunch_end,
            secondary_break,
            standard_hours,
        )
        .expect("shift/lunch/break times must be ordered within the day");

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            directory_file: env::var("DIRECTORY_FILE").expect("DIRECTORY_FILE must be set"),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            calendar,
        }
    }
}
