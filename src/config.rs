use crate::theme::Theme;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// Row planner: generations, partnerships, row-local centering.
    #[default]
    Planner,
    /// Layered DAG layout with synthetic partnership nodes.
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub engine: LayoutEngine,
    /// Vertical pitch between generation rows.
    pub generation_spacing: f32,
    /// Centre distance between two partners inside one block.
    pub partner_spacing: f32,
    /// Centre distance between neighbouring blocks in a row.
    pub block_spacing: f32,
    /// Every row is centred on this x.
    pub canvas_midline: f32,
    /// Width of the bus stub drawn above an only child.
    pub stub_width: f32,
    pub backend: BackendConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: LayoutEngine::Planner,
            generation_spacing: 150.0,
            partner_spacing: 120.0,
            block_spacing: 180.0,
            canvas_midline: 400.0,
            stub_width: 40.0,
            backend: BackendConfig::default(),
        }
    }
}

/// Rank assignment used by dagre. Network simplex is not offered: on some
/// small families the registry implementation never terminates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranker {
    #[default]
    TightTree,
    LongestPath,
}

impl Ranker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TightTree => "tight-tree",
            Self::LongestPath => "longest-path",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    pub ranker: Ranker,
    pub node_width: f32,
    pub node_height: f32,
    pub dummy_size: f32,
    pub node_sep: f32,
    pub rank_sep: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ranker: Ranker::default(),
            node_width: 120.0,
            node_height: 80.0,
            dummy_size: 0.0,
            node_sep: 150.0,
            rank_sep: 200.0,
            margin_x: 100.0,
            margin_y: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Edge length of a square symbol and diameter of a circle.
    pub symbol_size: f32,
    pub margin: f32,
    pub partner_stroke_width: f32,
    pub line_stroke_width: f32,
    /// Fallback canvas size for PNG rasterisation.
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            symbol_size: 80.0,
            margin: 100.0,
            partner_stroke_width: 3.0,
            line_stroke_width: 2.0,
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    line_color: Option<String>,
    background: Option<String>,
    female_fill: Option<String>,
    female_stroke: Option<String>,
    male_fill: Option<String>,
    male_stroke: Option<String>,
    married_color: Option<String>,
    divorced_color: Option<String>,
    conflicted_color: Option<String>,
    separated_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<Value>,
    render: Option<Value>,
}

/// Reads a JSON or JSON5 config file; `None` yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

/// Applies a `%%{init: {...}}%%` directive on top of an already loaded config.
/// A directive that does not match the config shape is ignored.
pub fn merge_init_config(config: Config, init: Value) -> Config {
    let mut merged = config.clone();
    let applied = serde_json::from_value::<ConfigFile>(init)
        .map_err(anyhow::Error::from)
        .and_then(|parsed| apply_config_file(&mut merged, parsed));
    match applied {
        Ok(()) => merged,
        Err(err) => {
            tracing::warn!(%err, "ignoring init directive");
            config
        }
    }
}

/// Fields present in a config section override `base`; absent ones keep
/// their current value rather than falling back to the defaults.
fn overlay<T: Serialize + DeserializeOwned>(base: &T, patch: Value) -> anyhow::Result<T> {
    let mut value = serde_json::to_value(base)?;
    merge_values(&mut value, patch);
    Ok(serde_json::from_value(value)?)
}

fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    if let Some(layout) = parsed.layout {
        config.layout = overlay(&config.layout, layout)?;
    }
    if let Some(render) = parsed.render {
        config.render = overlay(&config.render, render)?;
    }
    Ok(())
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        theme.font_size = v;
    }
    if let Some(v) = vars.text_color {
        theme.text_color = v;
    }
    if let Some(v) = vars.line_color {
        theme.line_color = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
    if let Some(v) = vars.female_fill {
        theme.female_fill = v;
    }
    if let Some(v) = vars.female_stroke {
        theme.female_stroke = v;
    }
    if let Some(v) = vars.male_fill {
        theme.male_fill = v;
    }
    if let Some(v) = vars.male_stroke {
        theme.male_stroke = v;
    }
    if let Some(v) = vars.married_color {
        theme.married_color = v;
    }
    if let Some(v) = vars.divorced_color {
        theme.divorced_color = v;
    }
    if let Some(v) = vars.conflicted_color {
        theme.conflicted_color = v;
    }
    if let Some(v) = vars.separated_color {
        theme.separated_color = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.engine, LayoutEngine::Planner);
        assert_eq!(config.layout.generation_spacing, 150.0);
    }

    #[test]
    fn partial_layout_and_theme_overrides() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("genogram-config-{}.json5", std::process::id()));
        std::fs::write(
            &path,
            r##"{
                // JSON5 comments are allowed
                theme: "modern",
                themeVariables: { lineColor: "#123456" },
                layout: { engine: "hierarchical", generationSpacing: 10 },
            }"##,
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.theme.line_color, "#123456");
        assert_eq!(config.layout.engine, LayoutEngine::Hierarchical);
        assert_eq!(config.layout.generation_spacing, 10.0);
        assert_eq!(config.layout.partner_spacing, 120.0);
    }

    #[test]
    fn init_directive_overrides_theme_variables() {
        let init = serde_json::json!({
            "themeVariables": { "fontSize": 18, "divorcedColor": "#000000" },
            "layout": { "stubWidth": 24 }
        });
        let config = merge_init_config(Config::default(), init);
        assert_eq!(config.theme.font_size, 18.0);
        assert_eq!(config.theme.divorced_color, "#000000");
        assert_eq!(config.layout.stub_width, 24.0);
        assert_eq!(config.theme.line_color, Theme::classic().line_color);
    }

    #[test]
    fn init_directive_keeps_earlier_layout_overrides() {
        let mut base = Config::default();
        base.layout.engine = LayoutEngine::Hierarchical;
        base.layout.backend.node_sep = 90.0;
        let init = serde_json::json!({ "layout": { "backend": { "rankSep": 120 } } });
        let config = merge_init_config(base, init);
        assert_eq!(config.layout.engine, LayoutEngine::Hierarchical);
        assert_eq!(config.layout.backend.node_sep, 90.0);
        assert_eq!(config.layout.backend.rank_sep, 120.0);
    }

    #[test]
    fn ranker_is_configurable_but_never_network_simplex() {
        let init = serde_json::json!({ "layout": { "backend": { "ranker": "longest-path" } } });
        let config = merge_init_config(Config::default(), init);
        assert_eq!(config.layout.backend.ranker, Ranker::LongestPath);

        let init = serde_json::json!({ "layout": { "backend": { "ranker": "network-simplex" } } });
        let config = merge_init_config(Config::default(), init);
        assert_eq!(config.layout.backend.ranker, Ranker::TightTree);
    }

    #[test]
    fn malformed_init_directive_is_ignored() {
        let config = merge_init_config(Config::default(), serde_json::json!({ "layout": 5 }));
        assert_eq!(config.layout.stub_width, 40.0);
    }
}
