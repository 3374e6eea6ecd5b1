//! SVG rendering of a strip log: one coloured column with depth ticks on
//! the left, levels on the right and the water table marked.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use super::GroundModel;
use crate::errors::{GroundError, GroundResult};
use crate::soil::SoilBehaviour;

/// Upper bound on depth ticks per log.
pub const MAX_TICKS: usize = 1000;

const GROUNDWATER_STROKE: &str = "#1E90FF";
const LINE_STEP_PX: f64 = 14.0;
/// Average glyph width as a fraction of the font size.
const CHAR_WIDTH_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripLogColours {
    pub cohesive: String,
    pub granular: String,
    pub rock: String,
    pub background: String,
}

impl Default for StripLogColours {
    fn default() -> Self {
        StripLogColours {
            cohesive: "#B8906B".to_string(),
            granular: "#F6D04D".to_string(),
            rock: "#9BA3AD".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl StripLogColours {
    fn fill(&self, behaviour: SoilBehaviour) -> &str {
        match behaviour {
            SoilBehaviour::Cohesive => &self.cohesive,
            SoilBehaviour::Granular => &self.granular,
            SoilBehaviour::Rock => &self.rock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripLogRenderOptions {
    pub column_width_px: f64,
    /// Vertical scale; `None` fits the log to `target_height_px`
    pub px_per_metre: Option<f64>,
    pub target_height_px: f64,
    pub margin_left_px: f64,
    pub margin_right_px: f64,
    pub margin_top_px: f64,
    pub margin_bottom_px: f64,
    pub tick_interval_m: f64,
    pub show_grid: bool,
    pub show_labels: bool,
    /// Unit shown on the level axis
    pub axis_unit_label: String,
    pub font_family: String,
    pub font_size_px: f64,
    pub title: Option<String>,
    pub colours: StripLogColours,
}

impl Default for StripLogRenderOptions {
    fn default() -> Self {
        StripLogRenderOptions {
            column_width_px: 220.0,
            px_per_metre: None,
            target_height_px: 600.0,
            margin_left_px: 64.0,
            margin_right_px: 64.0,
            margin_top_px: 28.0,
            margin_bottom_px: 28.0,
            tick_interval_m: 1.0,
            show_grid: true,
            show_labels: true,
            axis_unit_label: "m".to_string(),
            font_family: "Segoe UI, Arial, sans-serif".to_string(),
            font_size_px: 12.0,
            title: None,
            colours: StripLogColours::default(),
        }
    }
}

impl StripLogRenderOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn validate(&self) -> GroundResult<()> {
        let positive = [
            ("column_width_px", self.column_width_px),
            ("target_height_px", self.target_height_px),
            ("tick_interval_m", self.tick_interval_m),
            ("font_size_px", self.font_size_px),
        ];
        let non_negative = [
            ("margin_left_px", self.margin_left_px),
            ("margin_right_px", self.margin_right_px),
            ("margin_top_px", self.margin_top_px),
            ("margin_bottom_px", self.margin_bottom_px),
        ];
        let scale = self.px_per_metre.map(|v| ("px_per_metre", v));

        for (field, value) in positive.into_iter().chain(scale) {
            if !(value.is_finite() && value > 0.0) {
                return Err(GroundError::invalid_parameter(
                    field,
                    value.to_string(),
                    "Must be a positive finite number",
                ));
            }
        }
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GroundError::invalid_parameter(
                    field,
                    value.to_string(),
                    "Must be a non-negative finite number",
                ));
            }
        }
        Ok(())
    }
}

impl GroundModel {
    /// Strip log as a standalone SVG document.
    pub fn strip_log_svg(&self, options: &StripLogRenderOptions) -> GroundResult<String> {
        options.validate()?;
        let (top, base) = self
            .extent()
            .ok_or_else(|| GroundError::not_found("layers in model", self.reference()))?;
        let top = top.min(0.0);
        let range = base - top;

        let ticks = (range / options.tick_interval_m).floor() + 1.0;
        if ticks > MAX_TICKS as f64 {
            return Err(GroundError::invalid_parameter(
                "tick_interval_m",
                options.tick_interval_m.to_string(),
                format!("Interval gives more than {} ticks over {} m", MAX_TICKS, range),
            ));
        }

        let px_per_metre = options.px_per_metre.unwrap_or(options.target_height_px / range);
        render(self, options, top, base, px_per_metre, ticks as usize).map_err(GroundError::serialization)
    }
}

fn render(
    model: &GroundModel,
    options: &StripLogRenderOptions,
    top: f64,
    base: f64,
    px_per_metre: f64,
    ticks: usize,
) -> Result<String, fmt::Error> {
    let column_x = options.margin_left_px;
    let column_right = column_x + options.column_width_px;
    let width = column_right + options.margin_right_px;
    let height = options.margin_top_px + (base - top) * px_per_metre + options.margin_bottom_px;
    let y_at = |depth: f64| options.margin_top_px + (depth - top) * px_per_metre;
    let font = escape_xml(&options.font_family);
    let size = format_number(options.font_size_px);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}" font-size="{size}">"#,
        w = format_number(width),
        h = format_number(height),
    )?;
    writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        format_number(width),
        format_number(height),
        escape_xml(&options.colours.background)
    )?;
    if let Some(title) = &options.title {
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-weight="bold">{}</text>"#,
            format_number(width / 2.0),
            format_number(options.margin_top_px / 2.0 + options.font_size_px / 3.0),
            escape_xml(title)
        )?;
    }

    for layer in model.layers() {
        let y = y_at(layer.top_m);
        let h = layer.thickness_m() * px_per_metre;
        writeln!(
            svg,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#000000" stroke-width="1"/>"##,
            format_number(column_x),
            format_number(y),
            format_number(options.column_width_px),
            format_number(h),
            escape_xml(options.colours.fill(layer.params.behaviour()))
        )?;

        if options.show_labels {
            let label = layer.description.as_deref().unwrap_or_else(|| layer.params.reference());
            let max_chars = ((options.column_width_px - 8.0) / (CHAR_WIDTH_RATIO * options.font_size_px)).floor();
            let max_lines = (h / LINE_STEP_PX).floor() as usize;
            let lines: Vec<String> = wrap_text(label, max_chars.max(1.0) as usize)
                .into_iter()
                .take(max_lines)
                .collect();
            let first = y + h / 2.0 - (lines.len() as f64 - 1.0) * LINE_STEP_PX / 2.0 + options.font_size_px / 3.0;
            for (i, line) in lines.iter().enumerate() {
                writeln!(
                    svg,
                    r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
                    format_number((column_x + column_right) / 2.0),
                    format_number(first + i as f64 * LINE_STEP_PX),
                    escape_xml(line)
                )?;
            }
        }
    }

    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="end">m bGL</text>"#,
        format_number(column_x - 8.0),
        format_number(options.margin_top_px - 8.0)
    )?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}">{}</text>"#,
        format_number(column_right + 8.0),
        format_number(options.margin_top_px - 8.0),
        escape_xml(&options.axis_unit_label)
    )?;
    for i in 0..ticks {
        let depth = top + i as f64 * options.tick_interval_m;
        let y = y_at(depth);
        if options.show_grid {
            writeln!(
                svg,
                r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#CCCCCC" stroke-width="0.5"/>"##,
                format_number(column_x),
                format_number(column_right),
                y = format_number(y)
            )?;
        }
        writeln!(
            svg,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#000000"/>"##,
            format_number(column_x - 5.0),
            format_number(column_x),
            y = format_number(y)
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="end">{}</text>"#,
            format_number(column_x - 8.0),
            format_number(y + options.font_size_px / 3.0),
            format_number(depth)
        )?;
        writeln!(
            svg,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#000000"/>"##,
            format_number(column_right),
            format_number(column_right + 5.0),
            y = format_number(y)
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}">{}</text>"#,
            format_number(column_right + 8.0),
            format_number(y + options.font_size_px / 3.0),
            format_number(model.level_at_depth(depth))
        )?;
    }

    if let Some(water) = model.groundwater_depth_m().filter(|w| (top..=base).contains(w)) {
        let y = format_number(y_at(water));
        writeln!(
            svg,
            r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{GROUNDWATER_STROKE}" stroke-width="2" stroke-dasharray="6,4"/>"#,
            format_number(column_x - 10.0),
            format_number(column_right + 10.0),
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{GROUNDWATER_STROKE}">Groundwater</text>"#,
            format_number(column_x + 4.0),
            format_number(y_at(water) - 4.0)
        )?;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Greedy word wrap; words longer than `max_chars` get a line of their own.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// At most three decimals, trailing zeros dropped.
fn format_number(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
