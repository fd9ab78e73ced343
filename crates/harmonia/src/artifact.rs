//! The persisted calibration artifact (`p1_visual_vector.json`)

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Marker written for detected traits until a trait classifier exists
pub const PENDING_TRAIT: &str = "placeholder";
/// Marker written for mandatory attraction triggers until a trait classifier exists
pub const PENDING_POSITIVE_TRIGGER: &str = "placeholder_positive_trait";
/// Marker written for negative attraction triggers until a trait classifier exists
pub const PENDING_NEGATIVE_TRIGGER: &str = "placeholder_negative_trait";

const PENDING_MARKERS: [&str; 3] = [PENDING_TRAIT, PENDING_POSITIVE_TRIGGER, PENDING_NEGATIVE_TRIGGER];

const UNSPECIFIED: &str = "unspecified";

/// A list of trait labels, or an explicit marker that detection has not run.
///
/// On the wire both forms are a list of strings; `Pending` is a one-element
/// list holding exactly one of the pending markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum TraitList {
  Pending(String),
  Detected(Vec<String>),
}

impl TraitList {
  pub fn pending(marker: &str) -> Self {
    Self::Pending(marker.to_string())
  }

  pub fn is_pending(&self) -> bool {
    matches!(self, Self::Pending(_))
  }
}

impl JsonSchema for TraitList {
  fn schema_name() -> String {
    "TraitList".to_string()
  }

  fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    <Vec<String>>::json_schema(gen)
  }
}

impl From<Vec<String>> for TraitList {
  fn from(values: Vec<String>) -> Self {
    match values.as_slice() {
      [single] if PENDING_MARKERS.contains(&single.as_str()) => Self::Pending(single.clone()),
      _ => Self::Detected(values),
    }
  }
}

impl From<TraitList> for Vec<String> {
  fn from(list: TraitList) -> Self {
    match list {
      TraitList::Pending(marker) => vec![marker],
      TraitList::Detected(values) => values,
    }
  }
}

/// Full calibration result for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualVector {
  pub meta: VisualVectorMeta,
  pub self_analysis: SelfAnalysis,
  pub preference_model: PreferenceModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualVectorMeta {
  pub user_id: String,
  pub gender: String,
  pub preference_target: String,
  /// ISO-8601 UTC timestamp with a `Z` suffix
  pub calibration_timestamp: String,
  pub images_rated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelfAnalysis {
  /// Generated weight slice of the parameter generator (512 floats)
  pub embedding_vector: Vec<f32>,
  pub detected_traits: DetectedTraits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedTraits {
  pub facial_landmarks: TraitList,
  pub style_presentation: TraitList,
  pub vibe_tags: TraitList,
}

impl DetectedTraits {
  pub fn pending() -> Self {
    Self {
      facial_landmarks: TraitList::pending(PENDING_TRAIT),
      style_presentation: TraitList::pending(PENDING_TRAIT),
      vibe_tags: TraitList::pending(PENDING_TRAIT),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PreferenceModel {
  /// Centroid of the liked images' features, empty when nothing was rated 4 or 5
  pub ideal_vector: Vec<f32>,
  pub attraction_triggers: AttractionTriggers,
  /// In `[0, 1]`, two decimals
  pub calibration_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttractionTriggers {
  pub mandatory_traits: TraitList,
  pub negative_traits: TraitList,
}

impl AttractionTriggers {
  pub fn pending() -> Self {
    Self {
      mandatory_traits: TraitList::pending(PENDING_POSITIVE_TRIGGER),
      negative_traits: TraitList::pending(PENDING_NEGATIVE_TRIGGER),
    }
  }
}

impl VisualVectorMeta {
  pub fn new(
    user_id: &str,
    gender: Option<&str>,
    preference_target: Option<&str>,
    calibrated_at: DateTime<Utc>,
    images_rated: usize,
  ) -> Self {
    Self {
      user_id: user_id.to_string(),
      gender: or_unspecified(gender),
      preference_target: or_unspecified(preference_target),
      calibration_timestamp: calibrated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
      images_rated,
    }
  }
}

fn or_unspecified(value: Option<&str>) -> String {
  value.filter(|v| !v.trim().is_empty()).unwrap_or(UNSPECIFIED).to_string()
}
