use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    ConnectionSpec, FieldOutcome, FieldUpdate, SpecField, SpecFieldError, MAX_PLIES, SKEW_RANGE,
    SLOPE_RANGE, TOP_FLANGE_BEND_RANGE, TOP_FLANGE_SLOPE_RANGE,
};
use super::jurisdiction::{self, JurisdictionProfile};

/// Whether the spec language follows the jurisdiction or was pinned by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMode {
    Auto,
    Manual,
}

impl LanguageMode {
    /// Any direct language edit pins the language.
    pub const fn on_language_edit(self) -> Self {
        Self::Manual
    }

    /// Only the explicit override reset releases it.
    pub const fn on_override_reset(self) -> Self {
        Self::Auto
    }

    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Owns one session's connection spec and enforces the jurisdiction cascade.
///
/// Every operation builds the next spec on a copy and swaps it in, so readers of
/// [`ConnectionSpecStore::snapshot`] never see a partially applied edit.
#[derive(Debug, Clone)]
pub struct ConnectionSpecStore {
    spec: ConnectionSpec,
}

impl ConnectionSpecStore {
    pub fn new(jurisdiction_key: &str) -> Self {
        let profile = jurisdiction::resolve(jurisdiction_key);
        Self {
            spec: ConnectionSpec::defaults_for(profile),
        }
    }

    /// Adopts a previously saved spec, re-validating it against its profile.
    pub fn from_spec(spec: ConnectionSpec) -> Self {
        let mut store = Self {
            spec: ConnectionSpec::defaults_for(jurisdiction::fallback()),
        };
        store.replace(spec);
        store
    }

    pub fn snapshot(&self) -> &ConnectionSpec {
        &self.spec
    }

    pub fn into_spec(self) -> ConnectionSpec {
        self.spec
    }

    pub fn profile(&self) -> &'static JurisdictionProfile {
        jurisdiction::resolve(&self.spec.jurisdiction)
    }

    pub fn language_mode(&self) -> LanguageMode {
        if self.spec.language_manually_overridden {
            LanguageMode::Manual
        } else {
            LanguageMode::Auto
        }
    }

    pub fn set_field(&mut self, update: FieldUpdate) -> FieldOutcome {
        let mut next = self.spec.clone();
        let outcome = apply_update(&mut next, update);
        self.spec = next;
        outcome
    }

    /// Form-level entry point: `name` is the wire field name, `value` the raw text.
    pub fn set_field_raw(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<FieldOutcome, SpecFieldError> {
        let field =
            SpecField::from_name(name).ok_or_else(|| SpecFieldError::UnknownField(name.to_string()))?;
        let outcome = match FieldUpdate::from_raw(field, value) {
            Ok(update) => self.set_field(update),
            Err(reason) => {
                debug!(field = %field, value, %reason, "ignoring unrecognised field value");
                FieldOutcome::ignored(reason)
            }
        };
        Ok(outcome)
    }

    /// Applies a batch of edits in order and commits them together.
    pub fn apply<I>(&mut self, updates: I) -> Vec<FieldOutcome>
    where
        I: IntoIterator<Item = FieldUpdate>,
    {
        let mut next = self.spec.clone();
        let outcomes = updates
            .into_iter()
            .map(|update| apply_update(&mut next, update))
            .collect();
        self.spec = next;
        outcomes
    }

    /// Replaces the whole spec, normalizing every field against its jurisdiction.
    pub fn replace(&mut self, spec: ConnectionSpec) {
        self.spec = normalize(spec);
    }

    pub fn set_jurisdiction(&mut self, key: &str) -> FieldOutcome {
        self.set_field(FieldUpdate::Jurisdiction(key.to_string()))
    }

    pub fn set_language(&mut self, code: &str) -> FieldOutcome {
        self.set_field(FieldUpdate::Language(code.to_string()))
    }

    /// Returns the language to the jurisdiction default and resumes following it.
    pub fn reset_jurisdiction_override(&mut self) {
        let mut next = self.spec.clone();
        release_language(&mut next);
        self.spec = next;
    }

    /// Jurisdiction change issued from the configuration surface.
    pub fn change_jurisdiction(&mut self, key: &str, reset_language: bool) -> FieldOutcome {
        let mut next = self.spec.clone();
        if reset_language {
            release_language(&mut next);
        }
        let outcome = apply_update(&mut next, FieldUpdate::Jurisdiction(key.to_string()));
        self.spec = next;
        outcome
    }

    /// Restores the defaults of the current jurisdiction and drops any language pin.
    pub fn reset(&mut self) {
        self.spec = ConnectionSpec::defaults_for(self.profile());
    }
}

fn release_language(spec: &mut ConnectionSpec) {
    let mode = LanguageMode::Manual.on_override_reset();
    spec.language_manually_overridden = mode.is_manual();
    spec.language = jurisdiction::resolve(&spec.jurisdiction)
        .default_language
        .to_string();
}

/// Re-establishes the profile invariants: durations inside the valid sets, and the
/// language on the jurisdiction default unless pinned.
fn revalidate(spec: &mut ConnectionSpec, profile: &JurisdictionProfile) {
    if !spec.language_manually_overridden {
        spec.language = profile.default_language.to_string();
    }

    let load = profile.clamp_load_duration(&spec.load_duration);
    if spec.load_duration != load {
        debug!(from = %spec.load_duration, to = load, jurisdiction = profile.id, "load duration reset");
        spec.load_duration = load.to_string();
    }

    let uplift = profile.clamp_uplift_duration(&spec.uplift_duration);
    if spec.uplift_duration != uplift {
        debug!(from = %spec.uplift_duration, to = uplift, jurisdiction = profile.id, "uplift duration reset");
        spec.uplift_duration = uplift.to_string();
    }
}

fn normalize(mut spec: ConnectionSpec) -> ConnectionSpec {
    let profile = jurisdiction::resolve(&spec.jurisdiction);
    spec.jurisdiction = profile.id.to_string();
    match jurisdiction::supported_language(&spec.language) {
        Some(language) if spec.language_manually_overridden => spec.language = language.to_string(),
        _ => spec.language_manually_overridden = false,
    }
    spec.quantity = spec.quantity.max(1);
    spec.plies = spec.plies.clamp(1, MAX_PLIES);
    spec.skew_degrees = SKEW_RANGE.clamp(spec.skew_degrees);
    spec.slope_degrees = SLOPE_RANGE.clamp(spec.slope_degrees);
    spec.top_flange_bend_degrees = TOP_FLANGE_BEND_RANGE.clamp(spec.top_flange_bend_degrees);
    spec.top_flange_slope_degrees = TOP_FLANGE_SLOPE_RANGE.clamp(spec.top_flange_slope_degrees);
    revalidate(&mut spec, profile);
    spec
}

fn apply_update(spec: &mut ConnectionSpec, update: FieldUpdate) -> FieldOutcome {
    match update {
        FieldUpdate::Jurisdiction(key) => {
            let profile = jurisdiction::resolve(&key);
            spec.jurisdiction = profile.id.to_string();
            revalidate(spec, profile);
            if profile.is_fallback() && jurisdiction::find(&key).is_none() {
                FieldOutcome::coerced(key, profile.id)
            } else {
                FieldOutcome::Applied
            }
        }
        FieldUpdate::Language(code) => match jurisdiction::supported_language(&code) {
            Some(language) => {
                let mode = LanguageMode::Auto.on_language_edit();
                spec.language = language.to_string();
                spec.language_manually_overridden = mode.is_manual();
                FieldOutcome::Applied
            }
            None => FieldOutcome::ignored(format!("unsupported language '{code}'")),
        },
        FieldUpdate::ConnectionType(value) => {
            spec.connection_type = value;
            FieldOutcome::Applied
        }
        FieldUpdate::HangerType(value) => {
            spec.hanger_type = value;
            FieldOutcome::Applied
        }
        FieldUpdate::LoadDuration(code) => {
            let profile = jurisdiction::resolve(&spec.jurisdiction);
            if profile.load_duration_locked {
                return FieldOutcome::ignored(format!(
                    "load duration is fixed to '{}' in {}",
                    profile.default_load_duration().code,
                    profile.display_name
                ));
            }
            let applied = profile.clamp_load_duration(&code);
            spec.load_duration = applied.to_string();
            settle(code, applied)
        }
        FieldUpdate::UpliftDuration(code) => {
            let applied = jurisdiction::resolve(&spec.jurisdiction).clamp_uplift_duration(&code);
            spec.uplift_duration = applied.to_string();
            settle(code, applied)
        }
        FieldUpdate::JobLabel(label) => {
            spec.job_label = label;
            FieldOutcome::Applied
        }
        FieldUpdate::Quantity(requested) => {
            let applied = u32::try_from(requested).ok().filter(|value| *value >= 1).unwrap_or(1);
            spec.quantity = applied;
            settle(requested, applied)
        }
        FieldUpdate::MemberType(value) => {
            spec.member_type = value;
            FieldOutcome::Applied
        }
        FieldUpdate::LumberSpecies(value) => {
            spec.lumber_species = value;
            FieldOutcome::Applied
        }
        FieldUpdate::Width(value) => {
            spec.width = value;
            FieldOutcome::Applied
        }
        FieldUpdate::Depth(value) => {
            spec.depth = value;
            FieldOutcome::Applied
        }
        FieldUpdate::Plies(requested) => {
            let applied = requested.clamp(1, i64::from(MAX_PLIES)) as u8;
            spec.plies = applied;
            settle(requested, applied)
        }
        FieldUpdate::MemberId(value) => {
            spec.member_id = value;
            FieldOutcome::Applied
        }
        FieldUpdate::RoughSawnFinish(value) => {
            spec.rough_sawn_finish = value;
            FieldOutcome::Applied
        }
        FieldUpdate::SkewDegrees(requested) => {
            spec.skew_degrees = SKEW_RANGE.clamp(requested);
            settle_angle(requested, spec.skew_degrees)
        }
        FieldUpdate::SlopeDegrees(requested) => {
            spec.slope_degrees = SLOPE_RANGE.clamp(requested);
            settle_angle(requested, spec.slope_degrees)
        }
        FieldUpdate::TopFlangeBendDegrees(requested) => {
            spec.top_flange_bend_degrees = TOP_FLANGE_BEND_RANGE.clamp(requested);
            settle_angle(requested, spec.top_flange_bend_degrees)
        }
        FieldUpdate::TopFlangeSlopeDegrees(requested) => {
            spec.top_flange_slope_degrees = TOP_FLANGE_SLOPE_RANGE.clamp(requested);
            settle_angle(requested, spec.top_flange_slope_degrees)
        }
        FieldUpdate::OffsetDirection(value) => {
            spec.offset_direction = value;
            FieldOutcome::Applied
        }
        FieldUpdate::HighLowCenter(value) => {
            spec.high_low_center = value;
            FieldOutcome::Applied
        }
    }
}

fn settle<R, A>(requested: R, applied: A) -> FieldOutcome
where
    R: ToString,
    A: ToString,
{
    let requested = requested.to_string();
    let applied = applied.to_string();
    if requested == applied {
        FieldOutcome::Applied
    } else {
        debug!(%requested, %applied, "field value coerced");
        FieldOutcome::Coerced { requested, applied }
    }
}

fn settle_angle(requested: f32, applied: f32) -> FieldOutcome {
    if requested == applied {
        FieldOutcome::Applied
    } else {
        FieldOutcome::coerced(requested, applied)
    }
}
