//! Selector state as the UI shows it.
//!
//! Region and sub-region are held as DISPLAY strings, possibly translated.
//! Crop and soil type are held as their English keys. Everything is mapped
//! back to English before it goes into a request.

use crate::catalogue::{self, DISTRICT_REGION};
use crate::i18n::UiTextSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub region: String,
    pub sub_region: String,
    pub crop: String,
    pub soil_type: String,
}

/// Partial update from the UI; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionUpdate {
    pub region: Option<String>,
    pub sub_region: Option<String>,
    pub crop: Option<String>,
    pub soil_type: Option<String>,
}

/// Map a display string to its English key, matching catalogue names
/// case-insensitively. Unknown values are returned trimmed as typed.
fn resolve(texts: &UiTextSet, display: &str, known: &[&'static str]) -> String {
    let key = texts.canonical_key(display.trim());
    known
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(key))
        .map(|candidate| candidate.to_string())
        .unwrap_or_else(|| key.to_string())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Selection {
    pub fn update(&mut self, update: SelectionUpdate, texts: &UiTextSet) {
        if let Some(region) = update.region {
            self.region = region.trim().to_string();
        }
        if let Some(sub_region) = update.sub_region {
            self.sub_region = sub_region.trim().to_string();
        }
        if let Some(crop) = update.crop {
            self.crop = resolve(texts, &crop, catalogue::SUPPORTED_CROPS);
        }
        if let Some(soil) = update.soil_type {
            self.soil_type = resolve(texts, &soil, catalogue::SOIL_TYPES);
        }

        // Districts are only offered under Karnataka
        if self.canonical_region(texts) != DISTRICT_REGION {
            self.sub_region.clear();
        }
    }

    /// Re-display region and sub-region after the UI texts changed language.
    ///
    /// Each label is looked up in reverse in the old set to find its English
    /// key, then forward in the new set. Keys the new set lacks show in English.
    pub fn remap(&mut self, previous: &UiTextSet, next: &UiTextSet) {
        for label in [&mut self.region, &mut self.sub_region] {
            if label.is_empty() {
                continue;
            }
            let key = previous.canonical_key(label).to_string();
            *label = next.display(&key).unwrap_or(&key).to_string();
        }
    }

    pub fn canonical_region(&self, texts: &UiTextSet) -> String {
        resolve(texts, &self.region, catalogue::SUPPORTED_REGIONS)
    }

    pub fn canonical_sub_region(&self, texts: &UiTextSet) -> String {
        resolve(texts, &self.sub_region, catalogue::KARNATAKA_DISTRICTS)
    }

    pub fn canonical_crop(&self, texts: &UiTextSet) -> String {
        resolve(texts, &self.crop, catalogue::SUPPORTED_CROPS)
    }

    pub fn canonical_soil(&self, texts: &UiTextSet) -> String {
        resolve(texts, &self.soil_type, catalogue::SOIL_TYPES)
    }

    /// Region as sent to the service: "SubRegion, Region" when a sub-region is set.
    pub fn query_region(&self, texts: &UiTextSet) -> Option<String> {
        let region = non_empty(self.canonical_region(texts))?;
        match non_empty(self.canonical_sub_region(texts)) {
            Some(sub_region) => Some(format!("{}, {}", sub_region, region)),
            None => Some(region),
        }
    }

    /// Region the map centres on: the sub-region when it has coordinates.
    pub fn active_region(&self, texts: &UiTextSet) -> Option<String> {
        let sub_region = self.canonical_sub_region(texts);
        if !sub_region.is_empty() && catalogue::coordinates(&sub_region).is_some() {
            return Some(sub_region);
        }
        non_empty(self.canonical_region(texts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;

    fn hindi() -> UiTextSet {
        UiTextSet::from_pairs(
            Language::HINDI,
            [
                ("Karnataka", "कर्नाटक"),
                ("Punjab", "पंजाब"),
                ("Mysuru", "मैसूरु"),
                ("Wheat", "गेहूं"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    fn tamil() -> UiTextSet {
        UiTextSet::from_pairs(
            Language::TAMIL,
            [("Karnataka", "கர்நாடகா"), ("Punjab", "பஞ்சாப்")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    fn update(region: &str, sub_region: &str, crop: &str) -> SelectionUpdate {
        SelectionUpdate {
            region: Some(region.to_string()),
            sub_region: Some(sub_region.to_string()),
            crop: Some(crop.to_string()),
            soil_type: None,
        }
    }

    // ==================== Update Tests ====================

    #[test]
    fn test_sub_region_cleared_outside_karnataka() {
        let texts = UiTextSet::english();
        let mut selection = Selection::default();
        selection.update(update("Karnataka", "Mysuru", "Wheat"), &texts);
        assert_eq!(selection.sub_region, "Mysuru");

        selection.update(
            SelectionUpdate {
                region: Some("Punjab".to_string()),
                ..Default::default()
            },
            &texts,
        );
        assert_eq!(selection.sub_region, "");
    }

    #[test]
    fn test_translated_karnataka_keeps_sub_region() {
        let texts = hindi();
        let mut selection = Selection::default();
        selection.update(update("कर्नाटक", "मैसूरु", "गेहूं"), &texts);
        assert_eq!(selection.sub_region, "मैसूरु");
        assert_eq!(selection.crop, "Wheat");
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_query_region_uses_english_keys() {
        let texts = hindi();
        let mut selection = Selection::default();
        selection.update(update("कर्नाटक", "मैसूरु", "Wheat"), &texts);
        assert_eq!(selection.query_region(&texts).as_deref(), Some("Mysuru, Karnataka"));
        assert_eq!(selection.canonical_crop(&texts), "Wheat");
    }

    #[test]
    fn test_custom_region_used_verbatim() {
        let texts = hindi();
        let mut selection = Selection::default();
        selection.update(update("  Konkan coast ", "", "Rice"), &texts);
        assert_eq!(selection.query_region(&texts).as_deref(), Some("Konkan coast"));
    }

    #[test]
    fn test_region_matched_case_insensitively() {
        let texts = UiTextSet::english();
        let mut selection = Selection::default();
        selection.update(update("punjab", "", "wheat"), &texts);
        assert_eq!(selection.canonical_region(&texts), "Punjab");
        assert_eq!(selection.crop, "Wheat");
    }

    #[test]
    fn test_query_region_requires_region() {
        let selection = Selection::default();
        assert!(selection.query_region(&UiTextSet::english()).is_none());
        assert!(selection.active_region(&UiTextSet::english()).is_none());
    }

    #[test]
    fn test_active_region_prefers_district_with_coordinates() {
        let texts = UiTextSet::english();
        let mut selection = Selection::default();
        selection.update(update("Karnataka", "Mysuru", "Ragi"), &texts);
        assert_eq!(selection.active_region(&texts).as_deref(), Some("Mysuru"));

        selection.update(update("Karnataka", "Nowhere", "Ragi"), &texts);
        assert_eq!(selection.active_region(&texts).as_deref(), Some("Karnataka"));
    }

    // ==================== Remap Tests ====================

    #[test]
    fn test_remap_hindi_to_tamil() {
        let mut selection = Selection {
            region: "कर्नाटक".to_string(),
            sub_region: "मैसूरु".to_string(),
            crop: "Wheat".to_string(),
            soil_type: String::new(),
        };
        selection.remap(&hindi(), &tamil());
        assert_eq!(selection.region, "கர்நாடகா");
        // Tamil set has no entry for the district: English fallback
        assert_eq!(selection.sub_region, "Mysuru");
        assert_eq!(selection.crop, "Wheat");
    }

    #[test]
    fn test_remap_back_to_english() {
        let mut selection = Selection {
            region: "पंजाब".to_string(),
            ..Default::default()
        };
        selection.remap(&hindi(), &UiTextSet::english());
        assert_eq!(selection.region, "Punjab");
    }
}
