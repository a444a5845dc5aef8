//! Falling-word session: spawning, per-frame update, typed input, scoring and
//! leveling. Host-agnostic; the browser glue in `web` feeds it timestamps, input
//! text and a drawing surface, and acts on the reports it returns.
//!
//! At most one target is active. It falls until the player types its text
//! (it then explodes and scores) or it drops below the canvas (a miss, which
//! costs points). A drained explosion schedules the next spawn after a short
//! delay; otherwise spawns are paced by the level's spawn delay.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::surface::Surface;

pub mod particle;
pub mod target;
pub mod theme;

use target::{ImageHandle, Target};
use theme::{Datasets, Theme};

/// Decision taken once per animation frame: keep scheduling frames or stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Halt,
}

/// Result of feeding new input text to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Session not running; input dropped.
    Ignored,
    /// Input is still a prefix of the target (or there is nothing to type).
    Progress,
    /// Input diverged from the target and was cleared.
    Rejected,
    /// Input completed the target, which is now exploding.
    Matched,
}

/// What happened during one tick, for the host to log, load and render.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Image of a freshly spawned target; the host starts loading it if new.
    pub spawned: Option<ImageHandle>,
    /// An exploded target finished its burst and was removed.
    pub cleared: bool,
    /// A target fell past the bottom and was removed with a penalty.
    pub missed: bool,
    pub level_up: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartError {
    NotLoaded,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::NotLoaded => f.write_str("Данные еще загружаются, подождите..."),
        }
    }
}

impl std::error::Error for StartError {}

pub struct Session {
    cfg: GameConfig,
    data: Option<Datasets>,
    theme: Theme,
    target: Option<Target>,
    input: String,
    score: u32,
    level: u32,
    spawn_delay: f64,
    last_spawn: f64,
    respawn_at: Option<f64>,
    paused: bool,
    started: bool,
    width: f64,
    height: f64,
    rng: SmallRng,
    // One handle per image path, so a picture shown again keeps its load status.
    images: HashMap<String, ImageHandle>,
}

impl Session {
    pub fn new(cfg: GameConfig, rng: SmallRng) -> Self {
        let spawn_delay = cfg.initial_spawn_delay_ms;
        Self {
            cfg,
            data: None,
            theme: Theme::default(),
            target: None,
            input: String::new(),
            score: 0,
            level: 1,
            spawn_delay,
            last_spawn: 0.0,
            respawn_at: None,
            paused: false,
            started: false,
            width: 0.0,
            height: 0.0,
            rng,
            images: HashMap::new(),
        }
    }

    pub fn with_entropy(cfg: GameConfig) -> Self {
        Self::new(cfg, SmallRng::from_entropy())
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn load(&mut self, data: Datasets) {
        log::info!(
            "datasets ready: {} capitals, {} footballers",
            data.len(Theme::Cities),
            data.len(Theme::Footballers)
        );
        self.data = Some(data);
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn spawn_delay(&self) -> f64 {
        self.spawn_delay
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Spawns a target if data is loaded, the viewport is sized, the theme has
    /// items and none is active. Returns the new target's image handle.
    pub fn spawn_target(&mut self) -> Option<ImageHandle> {
        if self.width <= 0.0 || self.height <= 0.0 {
            log::debug!("viewport {}x{} is empty, spawn deferred", self.width, self.height);
            return None;
        }
        let data = self.data.as_ref()?;
        let count = data.len(self.theme);
        if count == 0 || self.target.is_some() {
            return None;
        }
        let idx = self.rng.gen_range(0..count);
        let text = data.item(self.theme, idx)?;
        let Some(src) = data.image_path(&self.cfg, self.theme, text) else {
            log::warn!("no image mapped for '{}' ({}), skipping spawn", text, self.theme);
            return None;
        };
        let text = text.to_string();
        let image = self.images.entry(src.clone()).or_insert_with(|| ImageHandle::new(src)).clone();
        let x = self.rng.gen_range(self.width * 0.2..self.width * 0.8);
        let speed = self.cfg.spawn_speed(self.level);
        self.target = Some(Target::new(&text, x, image.clone(), speed));
        Some(image)
    }

    /// Scheduler decision for one animation frame.
    pub fn frame(&mut self, now: f64) -> (LoopControl, TickReport) {
        if self.paused || !self.started {
            return (LoopControl::Halt, TickReport::default());
        }
        (LoopControl::Continue, self.tick(now))
    }

    pub fn tick(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        if now - self.last_spawn > self.spawn_delay {
            report.spawned = self.spawn_target();
            self.last_spawn = now;
        }
        if self.respawn_at.is_some_and(|at| now >= at) {
            self.respawn_at = None;
            if let Some(image) = self.spawn_target() {
                report.spawned = Some(image);
            }
        }

        let (drained, missed) = match self.target.as_mut() {
            Some(t) => {
                t.update();
                (t.is_drained(), t.is_missed(self.height))
            }
            None => (false, false),
        };
        if drained {
            self.target = None;
            self.respawn_at = Some(now + self.cfg.respawn_delay_ms);
            report.cleared = true;
        } else if missed {
            self.target = None;
            self.score = self.score.saturating_sub(self.cfg.miss_penalty);
            report.missed = true;
        }

        report.level_up = self.apply_leveling();
        if let Some(level) = report.level_up {
            log::info!("level {} reached at score {}", level, self.score);
        }
        report
    }

    // Moves up the level ladder as far as the score allows; never moves down.
    fn apply_leveling(&mut self) -> Option<u32> {
        let mut reached = None;
        while let Some(rule) = self.cfg.levels.iter().find(|r| r.level == self.level + 1).copied() {
            if self.score < rule.min_score {
                break;
            }
            self.level = rule.level;
            self.spawn_delay = rule.spawn_delay_ms;
            if let Some(t) = self.target.as_mut() {
                t.speed = t.speed.max(rule.speed);
            }
            reached = Some(rule.level);
        }
        reached
    }

    pub fn on_input(&mut self, raw: &str) -> InputOutcome {
        if self.paused || !self.started {
            return InputOutcome::Ignored;
        }
        self.input = raw.to_uppercase();
        if let Some(t) = self.falling_target() {
            if !t.accepts(&self.input) {
                self.input.clear();
                return InputOutcome::Rejected;
            }
        }
        self.submit()
    }

    /// Checks the current input for a full match (also bound to Enter).
    pub fn submit(&mut self) -> InputOutcome {
        if self.input.is_empty() {
            return InputOutcome::Progress;
        }
        let complete = self.falling_target().is_some_and(|t| t.is_complete(&self.input));
        if !complete {
            return InputOutcome::Progress;
        }
        if let Some(t) = self.target.as_mut() {
            t.explode(self.cfg.particle_count, self.cfg.particle_lifetime, &mut self.rng);
        }
        self.score += self.cfg.match_points;
        self.input.clear();
        InputOutcome::Matched
    }

    // Only a falling target can be typed; an exploding one is already scored.
    fn falling_target(&self) -> Option<&Target> {
        self.target.as_ref().filter(|t| !t.is_exploding())
    }

    pub fn start(&mut self) -> Result<(), StartError> {
        if !self.is_loaded() {
            return Err(StartError::NotLoaded);
        }
        self.started = true;
        self.paused = false;
        Ok(())
    }

    /// Flips the paused flag and returns the new value. Pausing clears the input.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        if self.paused {
            self.input.clear();
        }
        self.paused
    }

    pub fn end_game(&mut self) {
        self.paused = true;
        self.started = false;
        self.target = None;
        self.respawn_at = None;
        self.score = 0;
        self.level = 1;
        self.spawn_delay = self.cfg.initial_spawn_delay_ms;
        self.input.clear();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.end_game();
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear();
        if let Some(t) = &self.target {
            t.render(surface, &self.input);
        }
    }

    pub fn readout(&self) -> String {
        format!("Очки: {} (Уровень {})", self.score, self.level)
    }
}
