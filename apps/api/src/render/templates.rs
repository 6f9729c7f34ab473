//! The closed set of CV templates and their visual parameters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::layout::FontFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateId {
    /// Sidebar with avatar. Also the fallback for unknown ids.
    #[default]
    Moderne,
    /// Single-column formal layout.
    Classique,
    /// Timeline with an accent sidebar.
    Creatif,
    /// Typographic, no decoration beyond thin rules.
    Minimaliste,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Moderne,
        TemplateId::Classique,
        TemplateId::Creatif,
        TemplateId::Minimaliste,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Moderne => "moderne",
            TemplateId::Classique => "classique",
            TemplateId::Creatif => "creatif",
            TemplateId::Minimaliste => "minimaliste",
        }
    }

    /// Maps any identifier to a template; unknown ids get `Moderne`.
    pub fn resolve(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "classique" | "classic" => TemplateId::Classique,
            "creatif" | "créatif" | "creative" => TemplateId::Creatif,
            "minimaliste" | "minimalist" | "minimal" => TemplateId::Minimaliste,
            _ => TemplateId::Moderne,
        }
    }

    pub fn style(&self) -> TemplateStyle {
        match self {
            TemplateId::Moderne => TemplateStyle {
                layout: Layout::Sidebar,
                font: FontFamily::Helvetica,
                accent: Rgb([37, 99, 235]),
                date_style: DateStyle::FullMonth,
                range_separator: " - ",
                lowercase_present: false,
            },
            TemplateId::Classique => TemplateStyle {
                layout: Layout::SingleColumn,
                font: FontFamily::Times,
                accent: Rgb([55, 65, 81]),
                date_style: DateStyle::FullMonth,
                range_separator: " - ",
                lowercase_present: false,
            },
            TemplateId::Creatif => TemplateStyle {
                layout: Layout::Timeline,
                font: FontFamily::Helvetica,
                accent: Rgb([234, 88, 12]),
                date_style: DateStyle::ShortMonth,
                range_separator: " - ",
                lowercase_present: false,
            },
            TemplateId::Minimaliste => TemplateStyle {
                layout: Layout::Minimal,
                font: FontFamily::Helvetica,
                accent: Rgb([124, 58, 237]),
                date_style: DateStyle::Numeric,
                range_separator: " — ",
                lowercase_present: true,
            },
        }
    }
}

impl Serialize for TemplateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TemplateId::resolve(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Sidebar,
    SingleColumn,
    Timeline,
    Minimal,
    Letter,
}

impl Layout {
    pub fn has_sidebar(&self) -> bool {
        matches!(self, Layout::Sidebar | Layout::Timeline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `janvier 2022`
    FullMonth,
    /// `janv. 2022`
    ShortMonth,
    /// `01.2022`
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const INK: Rgb = Rgb([31, 41, 55]);
    pub const MUTED: Rgb = Rgb([107, 114, 128]);
    pub const TRACK: Rgb = Rgb([229, 231, 235]);

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }

    /// Mixes towards white; `amount` 0.0 keeps the colour, 1.0 gives white.
    pub fn tint(&self, amount: f32) -> Rgb {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
        Rgb([mix(self.0[0]), mix(self.0[1]), mix(self.0[2])])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateStyle {
    pub layout: Layout,
    pub font: FontFamily,
    pub accent: Rgb,
    pub date_style: DateStyle,
    pub range_separator: &'static str,
    pub lowercase_present: bool,
}

impl TemplateStyle {
    pub fn letter() -> Self {
        TemplateStyle {
            layout: Layout::Letter,
            font: FontFamily::Times,
            accent: Rgb::INK,
            date_style: DateStyle::FullMonth,
            range_separator: " - ",
            lowercase_present: false,
        }
    }
}

/// Catalog entry shown on the template picker.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub accent: String,
}

pub fn catalog() -> Vec<TemplateInfo> {
    TemplateId::ALL
        .iter()
        .map(|id| {
            let (name, description) = match id {
                TemplateId::Moderne => (
                    "Moderne",
                    "Design épuré avec des accents colorés, parfait pour les métiers créatifs et tech.",
                ),
                TemplateId::Classique => (
                    "Classique",
                    "Format traditionnel et professionnel, idéal pour les secteurs corporate.",
                ),
                TemplateId::Creatif => (
                    "Créatif",
                    "Design audacieux avec des éléments graphiques pour se démarquer.",
                ),
                TemplateId::Minimaliste => (
                    "Minimaliste",
                    "Simplicité et élégance, focus sur le contenu essentiel.",
                ),
            };
            TemplateInfo {
                id: *id,
                name,
                description,
                accent: id.style().accent.to_hex(),
            }
        })
        .collect()
}
