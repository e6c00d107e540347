use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placement options shared by every layout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub spacing: f32,
    pub start_x: f32,
    pub start_y: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            spacing: 80.0,
            start_x: 50.0,
            start_y: 50.0,
        }
    }
}

impl LayoutOptions {
    pub fn new(spacing: f32, start_x: f32, start_y: f32) -> Self {
        Self {
            spacing,
            start_x,
            start_y,
        }
    }
}

/// Label metrics used when sizing shapes to their text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFitConfig {
    pub avg_char_width: f32,
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
}

impl Default for TextFitConfig {
    fn default() -> Self {
        Self {
            avg_char_width: 8.0,
            line_height: 20.0,
            padding_x: 20.0,
            padding_y: 20.0,
            min_width: 120.0,
            min_height: 40.0,
            max_width: 200.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub layout: LayoutOptions,
    pub text: TextFitConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    spacing: Option<f32>,
    start_x: Option<f32>,
    start_y: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TextConfigFile {
    avg_char_width: Option<f32>,
    line_height: Option<f32>,
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    min_width: Option<f32>,
    min_height: Option<f32>,
    max_width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    text: Option<TextConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config; every field is optional and overrides the default.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.spacing {
            config.layout.spacing = v;
        }
        if let Some(v) = layout.start_x {
            config.layout.start_x = v;
        }
        if let Some(v) = layout.start_y {
            config.layout.start_y = v;
        }
    }

    if let Some(text) = parsed.text {
        if let Some(v) = text.avg_char_width {
            config.text.avg_char_width = v;
        }
        if let Some(v) = text.line_height {
            config.text.line_height = v;
        }
        if let Some(v) = text.padding_x {
            config.text.padding_x = v;
        }
        if let Some(v) = text.padding_y {
            config.text.padding_y = v;
        }
        if let Some(v) = text.min_width {
            config.text.min_width = v;
        }
        if let Some(v) = text.min_height {
            config.text.min_height = v;
        }
        if let Some(v) = text.max_width {
            config.text.max_width = v;
        }
    }

    Ok(config)
}
