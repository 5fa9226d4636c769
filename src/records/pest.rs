//! Crop health diagnosis from a photo.

use super::{overlay_strings, pick, Confidence, Graded, ShapeError, Translatable};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PestPayload {
    pub issue_name: String,
    pub confidence_score: f64,
    pub severity: String,
    pub action_steps: Vec<String>,
    pub detected_crop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PestDiagnosis {
    pub issue_name: String,
    pub confidence: Confidence,
    pub severity: Graded,
    pub action_steps: Vec<String>,
    pub detected_crop: String,
}

impl TryFrom<PestPayload> for PestDiagnosis {
    type Error = anyhow::Error;

    fn try_from(payload: PestPayload) -> Result<Self> {
        Ok(Self {
            issue_name: payload.issue_name,
            confidence: Confidence::from_raw(payload.confidence_score),
            severity: Graded::parse_canonical("severity", &payload.severity)?,
            action_steps: payload.action_steps,
            detected_crop: payload.detected_crop,
        })
    }
}

impl Translatable for PestDiagnosis {
    type Payload = PestPayload;
    type Translation = PestPayload;

    const PRODUCT: &'static str = "pest_diagnosis";

    fn to_payload(&self) -> PestPayload {
        PestPayload {
            issue_name: self.issue_name.clone(),
            confidence_score: self.confidence.fraction(),
            severity: self.severity.label.clone(),
            action_steps: self.action_steps.clone(),
            detected_crop: self.detected_crop.clone(),
        }
    }

    fn overlay(&self, translated: PestPayload) -> Result<Self, ShapeError> {
        Ok(Self {
            issue_name: pick(translated.issue_name, &self.issue_name),
            confidence: self.confidence,
            severity: self.severity.relabel(translated.severity),
            action_steps: overlay_strings(
                "actionSteps",
                &self.action_steps,
                translated.action_steps,
            )?,
            detected_crop: pick(translated.detected_crop, &self.detected_crop),
        })
    }
}
