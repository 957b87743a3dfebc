use serde::{Deserialize, Serialize};

use crate::ir::{PartnerStatus, Shape};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub line_color: String,
    pub background: String,
    pub female_fill: String,
    pub female_stroke: String,
    pub male_fill: String,
    pub male_stroke: String,
    pub married_color: String,
    pub divorced_color: String,
    pub conflicted_color: String,
    pub separated_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#1F2937".to_string(),
            line_color: "#6B7280".to_string(),
            background: "#FFFFFF".to_string(),
            female_fill: "#FCE7F3".to_string(),
            female_stroke: "#EC4899".to_string(),
            male_fill: "#E6F3FF".to_string(),
            male_stroke: "#2563EB".to_string(),
            married_color: "#374151".to_string(),
            divorced_color: "#EF4444".to_string(),
            conflicted_color: "#F59E0B".to_string(),
            separated_color: "#6B7280".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
            female_fill: "#FFF5FA".to_string(),
            female_stroke: "#C7D2E5".to_string(),
            male_fill: "#F8FAFF".to_string(),
            male_stroke: "#C7D2E5".to_string(),
            married_color: "#1C2430".to_string(),
            divorced_color: "#D64545".to_string(),
            conflicted_color: "#D98E04".to_string(),
            separated_color: "#7A8AA6".to_string(),
        }
    }

    /// `(fill, stroke)` for a person symbol.
    pub fn symbol_colors(&self, shape: Shape) -> (&str, &str) {
        match shape {
            Shape::Circle => (&self.female_fill, &self.female_stroke),
            Shape::Rect => (&self.male_fill, &self.male_stroke),
        }
    }

    pub fn partner_color(&self, status: Option<PartnerStatus>) -> &str {
        match status.unwrap_or_default() {
            PartnerStatus::Married => &self.married_color,
            PartnerStatus::Divorced => &self.divorced_color,
            PartnerStatus::Conflicted => &self.conflicted_color,
            PartnerStatus::Separated => &self.separated_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
