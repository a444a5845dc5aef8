//! Tuning constants for a session. Every field has a default matching the shipped
//! game; the host may pass a JSON object with any subset of fields to override them.

use serde::Deserialize;

/// One step of the level ladder. A session at `level - 1` whose score reaches
/// `min_score` moves to `level` and adopts its spawn delay. A target already
/// falling at that moment is sped up to `speed`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LevelRule {
    pub level: u32,
    pub min_score: u32,
    pub spawn_delay_ms: f64,
    pub speed: f64,
}

// Ordered level ladder (level 1 is the starting point, not a rule).
pub static DEFAULT_LEVELS: [LevelRule; 2] = [
    LevelRule { level: 2, min_score: 50, spawn_delay_ms: 1500.0, speed: 0.6 },
    LevelRule { level: 3, min_score: 100, spawn_delay_ms: 1000.0, speed: 0.9 },
];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fall speed (units per frame) of targets at level 1.
    pub base_speed: f64,
    /// Added to `base_speed` for each level above 1 when a target spawns.
    pub spawn_speed_step: f64,
    pub initial_spawn_delay_ms: f64,
    /// Delay between a target finishing its explosion and the next spawn.
    pub respawn_delay_ms: f64,
    pub match_points: u32,
    pub miss_penalty: u32,
    pub particle_count: usize,
    pub particle_lifetime: u32,
    pub levels: Vec<LevelRule>,
    pub capitals_url: String,
    pub names_url: String,
    pub mapping_url: String,
    pub capitals_image_dir: String,
    pub footballers_image_dir: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.3,
            spawn_speed_step: 0.2,
            initial_spawn_delay_ms: 2000.0,
            respawn_delay_ms: 500.0,
            match_points: 10,
            miss_penalty: 5,
            particle_count: 20,
            particle_lifetime: 30,
            levels: DEFAULT_LEVELS.to_vec(),
            capitals_url: "countries_full_ru.txt".into(),
            names_url: "footballers.txt".into(),
            mapping_url: "wordMapping.json".into(),
            capitals_image_dir: "images/capitals".into(),
            footballers_image_dir: "images/footballers".into(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let cfg: GameConfig = serde_json::from_str(json)?;
        Ok(cfg)
    }

    /// Fall speed for targets spawned at `level`.
    pub fn spawn_speed(&self, level: u32) -> f64 {
        self.base_speed + level.saturating_sub(1) as f64 * self.spawn_speed_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{ "miss_penalty": 7 }"#).unwrap();
        assert_eq!(cfg.miss_penalty, 7);
        assert_eq!(cfg.match_points, 10);
        assert_eq!(cfg.levels, DEFAULT_LEVELS.to_vec());
    }

    #[test]
    fn spawn_speed_steps_per_level() {
        let cfg = GameConfig::default();
        assert!((cfg.spawn_speed(1) - 0.3).abs() < 1e-9);
        assert!((cfg.spawn_speed(2) - 0.5).abs() < 1e-9);
        assert!((cfg.spawn_speed(3) - 0.7).abs() < 1e-9);
        assert!((cfg.spawn_speed(0) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(GameConfig::from_json("{ not json").is_err());
    }
}
