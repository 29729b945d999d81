//! Container configuration
//!
//! Read from TOML:
//!
//! ```toml
//! scroll_throttle_ms = 50
//! scroll_end_debounce_ms = 100
//! report_through = false
//!
//! [[points]]
//! reference = "bottom"
//! displacement = 100
//! ```
//!
//! Malformed values never fail the whole configuration: they fall back to
//! their defaults and are reported as diagnostics on the returned
//! [`Parsed`] value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use scrollwatch_core::{EngineError, Result};

use crate::point::{ObservationPoint, PointSpec, Reference, DEFAULT_DISPLACEMENT};

/// A value parsed leniently, plus what had to be defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Vec<String>,
}

impl<T> Parsed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Log every diagnostic and return the value
    pub fn into_value(self) -> T {
        for diagnostic in &self.diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        self.value
    }
}

/// Tunables of one scroll container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Minimum spacing of `on_scroll` notifications
    #[serde(default = "default_scroll_throttle_ms")]
    pub scroll_throttle_ms: u64,
    /// Quiet period before `on_scroll_end`
    #[serde(default = "default_scroll_end_debounce_ms")]
    pub scroll_end_debounce_ms: u64,
    /// Tolerance for treating an intersection ratio as 0 or 1
    #[serde(default = "default_ratio_epsilon")]
    pub ratio_epsilon: f32,
    /// Band disagreement below this is rounding noise
    #[serde(default = "default_calibration_tolerance_px")]
    pub calibration_tolerance_px: f32,
    /// Margins smaller than this are not used for calibration
    #[serde(default = "default_min_calibration_margin_px")]
    pub min_calibration_margin_px: f32,
    /// Report items straddling a point's line
    #[serde(default)]
    pub report_through: bool,
    #[serde(default)]
    pub points: Vec<PointSpec>,
}

fn default_scroll_throttle_ms() -> u64 {
    50
}

fn default_scroll_end_debounce_ms() -> u64 {
    100
}

fn default_ratio_epsilon() -> f32 {
    0.01
}

fn default_calibration_tolerance_px() -> f32 {
    0.5
}

fn default_min_calibration_margin_px() -> f32 {
    1.0
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            scroll_throttle_ms: default_scroll_throttle_ms(),
            scroll_end_debounce_ms: default_scroll_end_debounce_ms(),
            ratio_epsilon: default_ratio_epsilon(),
            calibration_tolerance_px: default_calibration_tolerance_px(),
            min_calibration_margin_px: default_min_calibration_margin_px(),
            report_through: false,
            points: Vec::new(),
        }
    }
}

impl ContainerConfig {
    /// Parse a TOML document
    ///
    /// Only syntax errors and wrongly typed fields are errors. Unknown point
    /// references and out-of-range tunables fall back with a diagnostic.
    pub fn from_toml_str(source: &str) -> Result<Parsed<Self>> {
        let mut table: toml::Table = source
            .parse()
            .map_err(|e: toml::de::Error| EngineError::Config(e.to_string()))?;

        let mut diagnostics = Vec::new();
        if let Some(toml::Value::Array(points)) = table.get_mut("points") {
            for (index, point) in points.iter_mut().enumerate() {
                normalize_reference(index, point, &mut diagnostics);
            }
        }

        let mut config: ContainerConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| EngineError::Config(e.to_string()))?;
        config.sanitize(&mut diagnostics);

        Ok(Parsed {
            value: config,
            diagnostics,
        })
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Parsed<Self>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Observation points for the configured specs, without callbacks
    pub fn observation_points(&self) -> impl Iterator<Item = ObservationPoint> + '_ {
        self.points
            .iter()
            .map(|spec| ObservationPoint::new(*spec).report_through(self.report_through))
    }

    /// Replace out-of-range values by their defaults
    fn sanitize(&mut self, diagnostics: &mut Vec<String>) {
        if !(0.0..0.5).contains(&self.ratio_epsilon) {
            diagnostics.push(format!(
                "ratio_epsilon {} out of range [0, 0.5), using {}",
                self.ratio_epsilon,
                default_ratio_epsilon()
            ));
            self.ratio_epsilon = default_ratio_epsilon();
        }
        if !(self.calibration_tolerance_px >= 0.0) {
            diagnostics.push(format!(
                "calibration_tolerance_px {} is negative, using {}",
                self.calibration_tolerance_px,
                default_calibration_tolerance_px()
            ));
            self.calibration_tolerance_px = default_calibration_tolerance_px();
        }
        if !(self.min_calibration_margin_px >= 0.0) {
            diagnostics.push(format!(
                "min_calibration_margin_px {} is negative, using {}",
                self.min_calibration_margin_px,
                default_min_calibration_margin_px()
            ));
            self.min_calibration_margin_px = default_min_calibration_margin_px();
        }
        for (index, point) in self.points.iter_mut().enumerate() {
            if !point.displacement.is_finite() {
                diagnostics.push(format!(
                    "points[{}]: displacement is not finite, using {}",
                    index, DEFAULT_DISPLACEMENT
                ));
                point.displacement = DEFAULT_DISPLACEMENT;
            }
        }
    }
}

/// Rewrite a point's `reference` to its canonical form, defaulting unknown
/// values to the bottom edge
fn normalize_reference(index: usize, point: &mut toml::Value, diagnostics: &mut Vec<String>) {
    let Some(reference) = point.get_mut("reference") else {
        return;
    };

    let parsed = match &*reference {
        toml::Value::String(s) => Reference::parse(s),
        toml::Value::Integer(n) => Reference::parse(&n.to_string()),
        _ => None,
    };
    let resolved = parsed.unwrap_or_else(|| {
        diagnostics.push(format!(
            "points[{}]: unknown reference {}, using {}",
            index,
            reference,
            Reference::default()
        ));
        Reference::default()
    });
    *reference = toml::Value::String(resolved.to_string());
}

// ============================================================================
// Query strings
// ============================================================================

impl PointSpec {
    /// Parse `reference=top&displacement=-40`, never failing
    ///
    /// Missing parameters keep their defaults (bottom, 100) silently;
    /// unreadable or unknown ones keep them with a diagnostic. A leading `?`
    /// is ignored.
    pub fn parse_query(query: &str) -> Parsed<PointSpec> {
        let mut spec = PointSpec::default();
        let mut diagnostics = Vec::new();

        let query = query.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key.trim() {
                "reference" => match Reference::parse(value) {
                    Some(reference) => spec.reference = reference,
                    None => diagnostics.push(format!(
                        "unknown reference `{}`, using {}",
                        value,
                        Reference::default()
                    )),
                },
                "displacement" => match value.trim().parse::<f32>() {
                    Ok(displacement) if displacement.is_finite() => {
                        spec.displacement = displacement
                    }
                    _ => diagnostics.push(format!(
                        "unreadable displacement `{}`, using {}",
                        value, DEFAULT_DISPLACEMENT
                    )),
                },
                other => diagnostics.push(format!("ignored query parameter `{}`", other)),
            }
        }

        Parsed {
            value: spec,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert_eq!(config.scroll_throttle_ms, 50);
        assert_eq!(config.scroll_end_debounce_ms, 100);
        assert_eq!(config.ratio_epsilon, 0.01);
        assert!(!config.report_through);
        assert!(config.points.is_empty());
    }

    #[test]
    fn test_empty_document_is_default() {
        let parsed = ContainerConfig::from_toml_str("").expect("empty document parses");
        assert!(parsed.is_clean());
        assert_eq!(parsed.value, ContainerConfig::default());
    }

    #[test]
    fn test_points_and_overrides() {
        let parsed = ContainerConfig::from_toml_str(
            r#"
            scroll_throttle_ms = 16
            report_through = true

            [[points]]
            reference = "TOP"
            displacement = -40.0

            [[points]]
            reference = 2
            displacement = 100.0

            [[points]]
            displacement = 20.0
            "#,
        )
        .expect("valid document");

        assert!(parsed.is_clean(), "{:?}", parsed.diagnostics);
        let config = parsed.value;
        assert_eq!(config.scroll_throttle_ms, 16);
        assert_eq!(
            config.points,
            vec![PointSpec::top(-40.0), PointSpec::bottom(100.0), PointSpec::bottom(20.0)]
        );
        assert!(config.observation_points().all(|p| p.reports_through()));
    }

    #[test]
    fn test_unknown_reference_falls_back_to_bottom() {
        let parsed = ContainerConfig::from_toml_str(
            r#"
            [[points]]
            reference = "left"
            displacement = 30.0
            "#,
        )
        .expect("document still parses");

        assert_eq!(parsed.value.points, vec![PointSpec::bottom(30.0)]);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(parsed.diagnostics[0].contains("left"));
    }

    #[test]
    fn test_out_of_range_epsilon_is_defaulted() {
        let parsed = ContainerConfig::from_toml_str("ratio_epsilon = 0.9").expect("parses");
        assert_eq!(parsed.value.ratio_epsilon, 0.01);
        assert!(!parsed.is_clean());
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        let result = ContainerConfig::from_toml_str("points = [");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ContainerConfig::default();
        config.points.push(PointSpec::top(0.0));
        let text = config.to_toml_string().expect("serializes");
        let parsed = ContainerConfig::from_toml_str(&text).expect("parses");
        assert_eq!(parsed.value, config);
    }

    #[test]
    fn test_parse_query() {
        let parsed = PointSpec::parse_query("?reference=top&displacement=-40");
        assert!(parsed.is_clean());
        assert_eq!(parsed.value, PointSpec::top(-40.0));
    }

    #[test]
    fn test_parse_query_defaults() {
        let parsed = PointSpec::parse_query("");
        assert!(parsed.is_clean());
        assert_eq!(parsed.value, PointSpec::default());

        let parsed = PointSpec::parse_query("reference=middle&displacement=abc&zoom=2");
        assert_eq!(parsed.value, PointSpec::default());
        assert_eq!(parsed.diagnostics.len(), 3);
    }
}
