// Theme datasets: capitals / footballer names and the text -> image code table.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::config::GameConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Cities,
    Footballers,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Cities => "cities",
            Theme::Footballers => "footballers",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cities" => Ok(Theme::Cities),
            "footballers" => Ok(Theme::Footballers),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Capital {
    pub capital: String,
    pub code: String,
}

/// Parses `unused - code - capital` lines. Lines that do not split into exactly
/// three parts, or have an empty capital, are dropped.
pub fn parse_capitals(text: &str) -> Vec<Capital> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(" - ").collect();
            match parts.as_slice() {
                [_, code, capital] => Some(Capital {
                    capital: capital.trim().to_string(),
                    code: code.trim().to_string(),
                }),
                _ => None,
            }
        })
        .filter(|c| !c.capital.is_empty())
        .collect()
}

pub fn parse_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct RawMapping {
    #[serde(default)]
    cities: HashMap<String, String>,
    #[serde(default)]
    footballers: HashMap<String, String>,
}

/// Display text -> image code, per theme. Keys are stored uppercased so lookups
/// ignore the dataset's casing.
#[derive(Clone, Debug, Default)]
pub struct WordMapping {
    cities: HashMap<String, String>,
    footballers: HashMap<String, String>,
}

impl WordMapping {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: RawMapping = serde_json::from_str(json).context("invalid word mapping JSON")?;
        let upper = |m: HashMap<String, String>| {
            m.into_iter().map(|(k, v)| (k.trim().to_uppercase(), v)).collect()
        };
        Ok(Self { cities: upper(raw.cities), footballers: upper(raw.footballers) })
    }

    pub fn code(&self, theme: Theme, text: &str) -> Option<&str> {
        let table = match theme {
            Theme::Cities => &self.cities,
            Theme::Footballers => &self.footballers,
        };
        table.get(&text.trim().to_uppercase()).map(String::as_str)
    }

    pub fn len(&self, theme: Theme) -> usize {
        match theme {
            Theme::Cities => self.cities.len(),
            Theme::Footballers => self.footballers.len(),
        }
    }
}

/// Everything loaded at startup.
#[derive(Clone, Debug, Default)]
pub struct Datasets {
    pub cities: Vec<Capital>,
    pub footballers: Vec<String>,
    pub mapping: WordMapping,
}

impl Datasets {
    pub fn from_sources(capitals: &str, names: &str, mapping_json: &str) -> anyhow::Result<Self> {
        Ok(Self {
            cities: parse_capitals(capitals),
            footballers: parse_names(names),
            mapping: WordMapping::from_json(mapping_json)?,
        })
    }

    pub fn len(&self, theme: Theme) -> usize {
        match theme {
            Theme::Cities => self.cities.len(),
            Theme::Footballers => self.footballers.len(),
        }
    }

    /// Display text of the `idx`-th item of a theme.
    pub fn item(&self, theme: Theme, idx: usize) -> Option<&str> {
        match theme {
            Theme::Cities => self.cities.get(idx).map(|c| c.capital.as_str()),
            Theme::Footballers => self.footballers.get(idx).map(String::as_str),
        }
    }

    /// Image path for a word, or None when the mapping has no entry for it.
    pub fn image_path(&self, cfg: &GameConfig, theme: Theme, text: &str) -> Option<String> {
        let code = self.mapping.code(theme, text)?;
        Some(match theme {
            Theme::Cities => format!("{}/{}.png", cfg.capitals_image_dir, code.to_uppercase()),
            Theme::Footballers => format!("{}/{}.png", cfg.footballers_image_dir, code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitals_keep_only_three_part_lines() {
        let text = "RU - RU - Москва\r\nbroken line\nFR - FR - Париж\nX - Y - \nA - B - C - D\n";
        let caps = parse_capitals(text);
        assert_eq!(
            caps,
            vec![
                Capital { capital: "Москва".into(), code: "RU".into() },
                Capital { capital: "Париж".into(), code: "FR".into() },
            ]
        );
    }

    #[test]
    fn names_are_trimmed_and_non_empty() {
        let names = parse_names("  Месси \n\n\t\nРоналду\r\n");
        assert_eq!(names, vec!["Месси".to_string(), "Роналду".to_string()]);
    }

    #[test]
    fn theme_round_trips_through_selector_values() {
        assert_eq!("cities".parse::<Theme>().unwrap(), Theme::Cities);
        assert_eq!("footballers".parse::<Theme>().unwrap(), Theme::Footballers);
        assert!("planets".parse::<Theme>().is_err());
        assert_eq!(Theme::Footballers.to_string(), "footballers");
    }

    #[test]
    fn image_paths_per_theme() {
        let data = Datasets::from_sources(
            "ru - ru - Москва",
            "Месси",
            r#"{"cities": {"МОСКВА": "ru"}, "footballers": {"Месси": "messi"}}"#,
        )
        .unwrap();
        let cfg = GameConfig::default();
        assert_eq!(
            data.image_path(&cfg, Theme::Cities, "Москва").as_deref(),
            Some("images/capitals/RU.png")
        );
        assert_eq!(
            data.image_path(&cfg, Theme::Footballers, "МЕССИ").as_deref(),
            Some("images/footballers/messi.png")
        );
        assert_eq!(data.image_path(&cfg, Theme::Cities, "Париж"), None);
    }

    #[test]
    fn missing_sub_table_defaults_to_empty() {
        let m = WordMapping::from_json(r#"{"cities": {"РИМ": "IT"}}"#).unwrap();
        assert_eq!(m.len(Theme::Footballers), 0);
        assert_eq!(m.code(Theme::Cities, "Рим"), Some("IT"));
    }

    #[test]
    fn malformed_mapping_fails_load() {
        assert!(Datasets::from_sources("", "", "[1, 2").is_err());
    }
}
