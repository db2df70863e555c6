use serde::{Deserialize, Serialize};
use std::fmt;

use super::jurisdiction::JurisdictionProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Joist,
    Truss,
    #[serde(rename = "Multi-Truss")]
    MultiTruss,
}

impl ConnectionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Joist => "Joist (Flush Top)",
            Self::Truss => "Truss (Flush Bottom)",
            Self::MultiTruss => "Multi-Truss (Flush Bottom)",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "joist" => Some(Self::Joist),
            "truss" => Some(Self::Truss),
            "multitruss" => Some(Self::MultiTruss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HangerType {
    #[default]
    AllTypes,
    FaceMount,
    TopFlange,
    ConcealedFlange,
}

impl HangerType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllTypes => "All Types",
            Self::FaceMount => "Face Mount",
            Self::TopFlange => "Top Flange",
            Self::ConcealedFlange => "Concealed Flange",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "all" | "alltypes" => Some(Self::AllTypes),
            "facemount" => Some(Self::FaceMount),
            "topflange" => Some(Self::TopFlange),
            "concealedflange" => Some(Self::ConcealedFlange),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighLowCenter {
    High,
    Low,
    Center,
}

/// Inclusive bounds for an angle slider, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    /// Clamps a requested angle; non-finite input becomes 0.
    pub fn clamp(self, degrees: f32) -> f32 {
        if degrees.is_finite() {
            degrees.clamp(self.min, self.max)
        } else {
            0.0
        }
    }
}

pub const SKEW_RANGE: AngleRange = AngleRange { min: -45.0, max: 45.0 };
pub const SLOPE_RANGE: AngleRange = AngleRange { min: -45.0, max: 45.0 };
pub const TOP_FLANGE_BEND_RANGE: AngleRange = AngleRange { min: -30.0, max: 30.0 };
pub const TOP_FLANGE_SLOPE_RANGE: AngleRange = AngleRange { min: -35.0, max: 35.0 };
pub const MAX_PLIES: u8 = 3;

/// The connection being configured. Only the store hands out mutated copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub jurisdiction: String,
    pub language: String,
    pub connection_type: Option<ConnectionType>,
    pub hanger_type: HangerType,
    pub load_duration: String,
    pub uplift_duration: String,
    pub job_label: String,
    pub quantity: u32,
    pub member_type: String,
    pub lumber_species: String,
    pub width: String,
    pub depth: String,
    pub plies: u8,
    pub member_id: String,
    pub rough_sawn_finish: bool,
    pub skew_degrees: f32,
    pub slope_degrees: f32,
    pub top_flange_bend_degrees: f32,
    pub top_flange_slope_degrees: f32,
    pub offset_direction: Option<OffsetDirection>,
    pub high_low_center: Option<HighLowCenter>,
    pub language_manually_overridden: bool,
}

impl ConnectionSpec {
    pub fn defaults_for(profile: &JurisdictionProfile) -> Self {
        Self {
            jurisdiction: profile.id.to_string(),
            language: profile.default_language.to_string(),
            connection_type: None,
            hanger_type: HangerType::AllTypes,
            load_duration: profile.default_load_duration().code.to_string(),
            uplift_duration: profile.default_uplift_duration().code.to_string(),
            job_label: "Job 1".to_string(),
            quantity: 1,
            member_type: "Solid Sawn".to_string(),
            lumber_species: "DF (Douglas Fir)".to_string(),
            width: "2x (1 1/2\")".to_string(),
            depth: "6 (5 1/2\")".to_string(),
            plies: 1,
            member_id: String::new(),
            rough_sawn_finish: false,
            skew_degrees: 0.0,
            slope_degrees: 0.0,
            top_flange_bend_degrees: 0.0,
            top_flange_slope_degrees: 0.0,
            offset_direction: None,
            high_low_center: None,
            language_manually_overridden: false,
        }
    }

    /// Fields that must be filled before the catalog can be queried.
    pub fn missing_for_search(&self) -> Vec<SpecField> {
        let mut missing = Vec::new();
        if self.connection_type.is_none() {
            missing.push(SpecField::ConnectionType);
        }
        missing
    }

    pub fn is_search_ready(&self) -> bool {
        self.missing_for_search().is_empty()
    }
}

/// Wire names of the editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Jurisdiction,
    Language,
    ConnectionType,
    HangerType,
    LoadDuration,
    UpliftDuration,
    JobLabel,
    Quantity,
    MemberType,
    LumberSpecies,
    Width,
    Depth,
    Plies,
    MemberId,
    RoughSawnFinish,
    SkewDegrees,
    SlopeDegrees,
    TopFlangeBendDegrees,
    TopFlangeSlopeDegrees,
    OffsetDirection,
    HighLowCenter,
}

impl SpecField {
    pub const ALL: [Self; 21] = [
        Self::Jurisdiction,
        Self::Language,
        Self::ConnectionType,
        Self::HangerType,
        Self::LoadDuration,
        Self::UpliftDuration,
        Self::JobLabel,
        Self::Quantity,
        Self::MemberType,
        Self::LumberSpecies,
        Self::Width,
        Self::Depth,
        Self::Plies,
        Self::MemberId,
        Self::RoughSawnFinish,
        Self::SkewDegrees,
        Self::SlopeDegrees,
        Self::TopFlangeBendDegrees,
        Self::TopFlangeSlopeDegrees,
        Self::OffsetDirection,
        Self::HighLowCenter,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Jurisdiction => "jurisdiction",
            Self::Language => "language",
            Self::ConnectionType => "connection_type",
            Self::HangerType => "hanger_type",
            Self::LoadDuration => "load_duration",
            Self::UpliftDuration => "uplift_duration",
            Self::JobLabel => "job_label",
            Self::Quantity => "quantity",
            Self::MemberType => "member_type",
            Self::LumberSpecies => "lumber_species",
            Self::Width => "width",
            Self::Depth => "depth",
            Self::Plies => "plies",
            Self::MemberId => "member_id",
            Self::RoughSawnFinish => "rough_sawn_finish",
            Self::SkewDegrees => "skew_degrees",
            Self::SlopeDegrees => "slope_degrees",
            Self::TopFlangeBendDegrees => "top_flange_bend_degrees",
            Self::TopFlangeSlopeDegrees => "top_flange_slope_degrees",
            Self::OffsetDirection => "offset_direction",
            Self::HighLowCenter => "high_low_center",
        }
    }

    /// Accepts the snake_case wire name or the legacy camelCase form.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = name.trim().replace(['_', '-'], "").to_ascii_lowercase();
        let folded = match folded.as_str() {
            "downloadduration" => "loadduration".to_string(),
            "jobid" => "joblabel".to_string(),
            "numberofplies" => "plies".to_string(),
            "lumberfinishroughsawn" => "roughsawnfinish".to_string(),
            _ => folded,
        };
        Self::ALL
            .into_iter()
            .find(|field| field.name().replace('_', "") == folded)
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed edit. Numeric payloads are raw requests; the store clamps them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Jurisdiction(String),
    Language(String),
    ConnectionType(Option<ConnectionType>),
    HangerType(HangerType),
    LoadDuration(String),
    UpliftDuration(String),
    JobLabel(String),
    Quantity(i64),
    MemberType(String),
    LumberSpecies(String),
    Width(String),
    Depth(String),
    Plies(i64),
    MemberId(String),
    RoughSawnFinish(bool),
    SkewDegrees(f32),
    SlopeDegrees(f32),
    TopFlangeBendDegrees(f32),
    TopFlangeSlopeDegrees(f32),
    OffsetDirection(Option<OffsetDirection>),
    HighLowCenter(Option<HighLowCenter>),
}

impl FieldUpdate {
    pub fn field(&self) -> SpecField {
        match self {
            Self::Jurisdiction(_) => SpecField::Jurisdiction,
            Self::Language(_) => SpecField::Language,
            Self::ConnectionType(_) => SpecField::ConnectionType,
            Self::HangerType(_) => SpecField::HangerType,
            Self::LoadDuration(_) => SpecField::LoadDuration,
            Self::UpliftDuration(_) => SpecField::UpliftDuration,
            Self::JobLabel(_) => SpecField::JobLabel,
            Self::Quantity(_) => SpecField::Quantity,
            Self::MemberType(_) => SpecField::MemberType,
            Self::LumberSpecies(_) => SpecField::LumberSpecies,
            Self::Width(_) => SpecField::Width,
            Self::Depth(_) => SpecField::Depth,
            Self::Plies(_) => SpecField::Plies,
            Self::MemberId(_) => SpecField::MemberId,
            Self::RoughSawnFinish(_) => SpecField::RoughSawnFinish,
            Self::SkewDegrees(_) => SpecField::SkewDegrees,
            Self::SlopeDegrees(_) => SpecField::SlopeDegrees,
            Self::TopFlangeBendDegrees(_) => SpecField::TopFlangeBendDegrees,
            Self::TopFlangeSlopeDegrees(_) => SpecField::TopFlangeSlopeDegrees,
            Self::OffsetDirection(_) => SpecField::OffsetDirection,
            Self::HighLowCenter(_) => SpecField::HighLowCenter,
        }
    }

    /// Interprets form text for `field`. Numbers that fail to parse are passed on as
    /// out-of-range requests so the store's coercion policy applies; unrecognised
    /// choices return the reason they were dropped.
    pub fn from_raw(field: SpecField, raw: &str) -> Result<Self, String> {
        let text = raw.trim();
        let update = match field {
            SpecField::Jurisdiction => Self::Jurisdiction(text.to_string()),
            SpecField::Language => Self::Language(text.to_string()),
            SpecField::ConnectionType if text.is_empty() => Self::ConnectionType(None),
            SpecField::ConnectionType => Self::ConnectionType(Some(
                ConnectionType::parse(text)
                    .ok_or_else(|| format!("unknown connection type '{text}'"))?,
            )),
            SpecField::HangerType => Self::HangerType(
                HangerType::parse(text).ok_or_else(|| format!("unknown hanger type '{text}'"))?,
            ),
            SpecField::LoadDuration => Self::LoadDuration(text.to_string()),
            SpecField::UpliftDuration => Self::UpliftDuration(text.to_string()),
            SpecField::JobLabel => Self::JobLabel(text.to_string()),
            SpecField::Quantity => Self::Quantity(parse_whole(text)),
            SpecField::MemberType => Self::MemberType(text.to_string()),
            SpecField::LumberSpecies => Self::LumberSpecies(text.to_string()),
            SpecField::Width => Self::Width(text.to_string()),
            SpecField::Depth => Self::Depth(text.to_string()),
            SpecField::Plies => Self::Plies(parse_whole(text)),
            SpecField::MemberId => Self::MemberId(text.to_string()),
            SpecField::RoughSawnFinish => Self::RoughSawnFinish(
                parse_flag(text).ok_or_else(|| format!("'{text}' is not a yes/no value"))?,
            ),
            SpecField::SkewDegrees => Self::SkewDegrees(parse_degrees(text)),
            SpecField::SlopeDegrees => Self::SlopeDegrees(parse_degrees(text)),
            SpecField::TopFlangeBendDegrees => Self::TopFlangeBendDegrees(parse_degrees(text)),
            SpecField::TopFlangeSlopeDegrees => Self::TopFlangeSlopeDegrees(parse_degrees(text)),
            SpecField::OffsetDirection => Self::OffsetDirection(match text.to_ascii_lowercase().as_str() {
                "" | "none" => None,
                "left" => Some(OffsetDirection::Left),
                "right" => Some(OffsetDirection::Right),
                _ => return Err(format!("unknown offset direction '{text}'")),
            }),
            SpecField::HighLowCenter => Self::HighLowCenter(match text.to_ascii_lowercase().as_str() {
                "" | "none" => None,
                "high" => Some(HighLowCenter::High),
                "low" => Some(HighLowCenter::Low),
                "center" | "centre" => Some(HighLowCenter::Center),
                _ => return Err(format!("unknown high/low/center option '{text}'")),
            }),
        };
        Ok(update)
    }
}

/// Whole-number form input; fractional input truncates and garbage becomes 0.
fn parse_whole(text: &str) -> i64 {
    text.parse::<i64>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        })
        .unwrap_or(0)
}

fn parse_degrees(text: &str) -> f32 {
    text.trim_end_matches(['°', ' '])
        .parse::<f32>()
        .unwrap_or(f32::NAN)
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// What happened to a requested edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FieldOutcome {
    Applied,
    Coerced { requested: String, applied: String },
    Ignored { reason: String },
}

impl FieldOutcome {
    pub(crate) fn coerced(requested: impl fmt::Display, applied: impl fmt::Display) -> Self {
        Self::Coerced {
            requested: requested.to_string(),
            applied: applied.to_string(),
        }
    }

    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    pub fn was_applied(&self) -> bool {
        !matches!(self, Self::Ignored { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecFieldError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
}
