//! HTTP notifier: implements [`ScoreboardPort`] and [`LightingPort`].
//!
//! Both endpoints are plain GET APIs:
//!
//! | Call              | Request                                         |
//! |-------------------|-------------------------------------------------|
//! | `set_scores`      | `{scoreboard}/set?playerOne={a}&playerTwo={b}`  |
//! | `reset`           | `{scoreboard}/reset`                            |
//! | `power_on`/`off`  | `{scoreboard}/on`, `{scoreboard}/off`           |
//! | `set_colour`      | `{lighting}/cm?cmnd=Color%20%23AARRGGBB`        |
//! | `set_white`       | `{lighting}/cm?cmnd=White%20{n}`                |
//! | `set_dimmer`      | `{lighting}/cm?cmnd=Dimmer%20{n}`               |
//!
//! Every request carries the configured timeout.  Calls block; the service
//! only ever runs them on worker threads.

use std::time::Duration;

use log::debug;

use crate::app::ports::{Argb, LightingPort, NotifyError, ScoreboardPort};
use crate::app::scoring::Scores;

pub struct HttpNotifier {
    agent: ureq::Agent,
    scoreboard_url: String,
    lighting_url: String,
}

impl HttpNotifier {
    pub fn new(scoreboard_url: &str, lighting_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            scoreboard_url: scoreboard_url.trim_end_matches('/').to_owned(),
            lighting_url: lighting_url.trim_end_matches('/').to_owned(),
        }
    }

    fn get(&self, url: &str) -> Result<(), NotifyError> {
        debug!("GET {}", url);
        match self.agent.get(url).call() {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(NotifyError::Status(code)),
            Err(ureq::Error::Transport(t)) => Err(NotifyError::Transport(t.to_string())),
        }
    }
}

/// Scoreboard endpoint path.
fn scoreboard_path(base: &str, path: &str) -> String {
    format!("{}/{}", base, path)
}

fn set_scores_url(base: &str, scores: Scores) -> String {
    format!(
        "{}/set?playerOne={}&playerTwo={}",
        base, scores.player_one, scores.player_two
    )
}

/// Lighting console command.  `arg` only ever holds hex digits, digits,
/// or a leading `#`, which is the one character that needs escaping.
fn command_url(base: &str, command: &str, arg: &str) -> String {
    format!("{}/cm?cmnd={}%20{}", base, command, arg.replace('#', "%23"))
}

impl ScoreboardPort for HttpNotifier {
    fn set_scores(&self, scores: Scores) -> Result<(), NotifyError> {
        self.get(&set_scores_url(&self.scoreboard_url, scores))
    }

    fn reset(&self) -> Result<(), NotifyError> {
        self.get(&scoreboard_path(&self.scoreboard_url, "reset"))
    }

    fn power_on(&self) -> Result<(), NotifyError> {
        self.get(&scoreboard_path(&self.scoreboard_url, "on"))
    }

    fn power_off(&self) -> Result<(), NotifyError> {
        self.get(&scoreboard_path(&self.scoreboard_url, "off"))
    }
}

impl LightingPort for HttpNotifier {
    fn set_colour(&self, colour: Argb) -> Result<(), NotifyError> {
        self.get(&command_url(&self.lighting_url, "Color", colour.to_hex().as_str()))
    }

    fn set_white(&self, level: u8) -> Result<(), NotifyError> {
        self.get(&command_url(&self.lighting_url, "White", &level.to_string()))
    }

    fn set_dimmer(&self, level: u8) -> Result<(), NotifyError> {
        self.get(&command_url(&self.lighting_url, "Dimmer", &level.to_string()))
    }
}
