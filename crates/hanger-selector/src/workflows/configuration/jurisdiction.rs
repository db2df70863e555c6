use serde::Serialize;
use tracing::warn;

use crate::workflows::normalizer::normalize_key;

pub const USA_ID: &str = "USA";
pub const CANADA_ID: &str = "CAN";
pub const FALLBACK_ID: &str = "INTL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignMethod {
    AllowableStressDesign,
    LimitStatesDesign,
}

impl DesignMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllowableStressDesign => "Allowable Stress Design (ASD)",
            Self::LimitStatesDesign => "Limit States Design (LSD)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    Imperial,
    Metric,
}

/// One selectable load-duration bucket. `code` is what a spec stores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationOption {
    pub code: &'static str,
    pub label: &'static str,
    pub factor: f32,
}

const DEAD_90: DurationOption = DurationOption {
    code: "dead_90",
    label: "Dead (90)",
    factor: 0.90,
};
const FLOOR_100: DurationOption = DurationOption {
    code: "floor_100",
    label: "Floor (100)",
    factor: 1.00,
};
const SNOW_115: DurationOption = DurationOption {
    code: "snow_115",
    label: "Snow (115)",
    factor: 1.15,
};
const ROOF_125: DurationOption = DurationOption {
    code: "roof_125",
    label: "Roof (125)",
    factor: 1.25,
};
const QUAKE_WIND_160: DurationOption = DurationOption {
    code: "quake_wind_160",
    label: "Quake/Wind (160)",
    factor: 1.60,
};
const NORMAL_100: DurationOption = DurationOption {
    code: "normal_100",
    label: "Normal (100)",
    factor: 1.00,
};
const STANDARD_TERM_100: DurationOption = DurationOption {
    code: "standard_term_100",
    label: "Standard Term 1.00",
    factor: 1.00,
};
const SHORT_TERM_115: DurationOption = DurationOption {
    code: "short_term_115",
    label: "Short Term 1.15",
    factor: 1.15,
};
const MEDIUM_TERM_150: DurationOption = DurationOption {
    code: "medium_term_150",
    label: "Medium Term 1.5",
    factor: 1.50,
};

const NDS_LOAD_DURATIONS: &[DurationOption] =
    &[DEAD_90, FLOOR_100, SNOW_115, ROOF_125, QUAKE_WIND_160];
const NDS_UPLIFT_DURATIONS: &[DurationOption] = &[QUAKE_WIND_160, NORMAL_100];
const CSA_LOAD_DURATIONS: &[DurationOption] = &[STANDARD_TERM_100];
const CSA_UPLIFT_DURATIONS: &[DurationOption] = &[STANDARD_TERM_100, SHORT_TERM_115];
const EUROCODE_UPLIFT_DURATIONS: &[DurationOption] = &[SHORT_TERM_115, MEDIUM_TERM_150];

/// Design context for a country of use. Profiles are static and never mutated.
#[derive(Debug, PartialEq, Serialize)]
pub struct JurisdictionProfile {
    pub id: &'static str,
    pub iso_code: &'static str,
    pub display_name: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub default_language: &'static str,
    pub design_standard: &'static str,
    pub design_method: DesignMethod,
    pub unit_system: UnitSystem,
    pub load_durations: &'static [DurationOption],
    pub uplift_durations: &'static [DurationOption],
    /// When set the load duration is pinned to its first option and edits are ignored.
    pub load_duration_locked: bool,
}

impl JurisdictionProfile {
    pub fn default_load_duration(&self) -> &'static DurationOption {
        &self.load_durations[0]
    }

    pub fn default_uplift_duration(&self) -> &'static DurationOption {
        &self.uplift_durations[0]
    }

    pub fn load_duration(&self, code: &str) -> Option<&'static DurationOption> {
        self.load_durations.iter().find(|option| option.code == code)
    }

    pub fn uplift_duration(&self, code: &str) -> Option<&'static DurationOption> {
        self.uplift_durations.iter().find(|option| option.code == code)
    }

    /// Returns `code` when it belongs to the load set, otherwise the set's first code.
    pub fn clamp_load_duration(&self, code: &str) -> &'static str {
        if self.load_duration_locked {
            return self.default_load_duration().code;
        }
        self.load_duration(code)
            .unwrap_or_else(|| self.default_load_duration())
            .code
    }

    pub fn clamp_uplift_duration(&self, code: &str) -> &'static str {
        self.uplift_duration(code)
            .unwrap_or_else(|| self.default_uplift_duration())
            .code
    }

    pub fn is_fallback(&self) -> bool {
        self.id == FALLBACK_ID
    }

    fn matches(&self, normalized: &str) -> bool {
        normalize_key(self.id) == normalized
            || normalize_key(self.iso_code) == normalized
            || normalize_key(self.display_name) == normalized
            || self
                .aliases
                .iter()
                .any(|alias| normalize_key(alias) == normalized)
    }
}

const fn eurocode(
    id: &'static str,
    iso_code: &'static str,
    display_name: &'static str,
    default_language: &'static str,
) -> JurisdictionProfile {
    JurisdictionProfile {
        id,
        iso_code,
        display_name,
        aliases: &[],
        default_language,
        design_standard: "EN 1995-1-1",
        design_method: DesignMethod::LimitStatesDesign,
        unit_system: UnitSystem::Metric,
        load_durations: NDS_LOAD_DURATIONS,
        uplift_durations: EUROCODE_UPLIFT_DURATIONS,
        load_duration_locked: false,
    }
}

static PROFILES: [JurisdictionProfile; 12] = [
    JurisdictionProfile {
        id: USA_ID,
        iso_code: "US",
        display_name: "United States",
        aliases: &["united states of america", "america"],
        default_language: "en",
        design_standard: "NDS (ANSI/AWC)",
        design_method: DesignMethod::AllowableStressDesign,
        unit_system: UnitSystem::Imperial,
        load_durations: NDS_LOAD_DURATIONS,
        uplift_durations: NDS_UPLIFT_DURATIONS,
        load_duration_locked: false,
    },
    JurisdictionProfile {
        id: CANADA_ID,
        iso_code: "CA",
        display_name: "Canada",
        aliases: &[],
        default_language: "en",
        design_standard: "CSA O86",
        design_method: DesignMethod::LimitStatesDesign,
        unit_system: UnitSystem::Metric,
        load_durations: CSA_LOAD_DURATIONS,
        uplift_durations: CSA_UPLIFT_DURATIONS,
        load_duration_locked: true,
    },
    JurisdictionProfile {
        aliases: &["uk", "great britain", "england"],
        ..eurocode("GBR", "GB", "United Kingdom", "en")
    },
    eurocode("NOR", "NO", "Norway", "no"),
    eurocode("POL", "PL", "Poland", "pl"),
    eurocode("DEU", "DE", "Germany", "de"),
    eurocode("DNK", "DK", "Denmark", "da"),
    eurocode("FRA", "FR", "France", "fr"),
    eurocode("AUT", "AT", "Austria", "de"),
    eurocode("SWE", "SE", "Sweden", "sv"),
    eurocode("ITA", "IT", "Italy", "it"),
    JurisdictionProfile {
        id: "NZL",
        iso_code: "NZ",
        display_name: "New Zealand",
        aliases: &[],
        default_language: "en",
        design_standard: "NZS AS 1720.1",
        design_method: DesignMethod::LimitStatesDesign,
        unit_system: UnitSystem::Metric,
        load_durations: NDS_LOAD_DURATIONS,
        uplift_durations: EUROCODE_UPLIFT_DURATIONS,
        load_duration_locked: false,
    },
];

static FALLBACK: JurisdictionProfile = JurisdictionProfile {
    aliases: &["international"],
    ..eurocode(FALLBACK_ID, "", "International", "en")
};

/// Language codes the product ships translations for, with their English names.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("cs", "Czech"),
    ("ro", "Romanian"),
    ("no", "Norwegian"),
    ("sv", "Swedish"),
    ("da", "Danish"),
];

/// All known profiles in display order. The fallback profile is not listed.
pub fn profiles() -> &'static [JurisdictionProfile] {
    &PROFILES
}

pub fn fallback() -> &'static JurisdictionProfile {
    &FALLBACK
}

/// Strict lookup; `None` for keys outside the known set.
pub fn find(key: &str) -> Option<&'static JurisdictionProfile> {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return None;
    }
    PROFILES
        .iter()
        .chain(std::iter::once(&FALLBACK))
        .find(|profile| profile.matches(&normalized))
}

/// Total lookup: unknown keys resolve to the international default profile.
pub fn resolve(key: &str) -> &'static JurisdictionProfile {
    find(key).unwrap_or_else(|| {
        warn!(jurisdiction = key, fallback = FALLBACK_ID, "unknown jurisdiction, using default profile");
        &FALLBACK
    })
}

/// Canonical language code for a code or English language name.
pub fn supported_language(code: &str) -> Option<&'static str> {
    let normalized = normalize_key(code);
    LANGUAGES
        .iter()
        .find(|(language, name)| *language == normalized || normalize_key(name) == normalized)
        .map(|(language, _)| *language)
}

pub fn is_supported_language(code: &str) -> bool {
    supported_language(code).is_some()
}
