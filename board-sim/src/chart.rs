use serde::{Deserialize, Serialize};

/// The accumulating patient record shown to the resident.
///
/// Scalar fields hold the latest non-empty value supplied by the
/// collaborator. `imaging` and `pathology` are append-only: findings revealed
/// in earlier turns are never replaced or reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientChart {
    pub demographics: String,
    pub hpi: String,
    pub imaging: Vec<String>,
    pub pathology: Vec<String>,
    pub staging: String,
    pub comorbidities: String,
    pub labs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub illustration_url: Option<String>,
}

/// Partial chart update carried by a turn result. Absent scalars and empty
/// list deltas leave the chart untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartUpdate {
    pub demographics: Option<String>,
    pub hpi: Option<String>,
    pub imaging: Vec<String>,
    pub pathology: Vec<String>,
    pub staging: Option<String>,
    pub comorbidities: Option<String>,
    pub labs: Option<String>,
}

impl PatientChart {
    /// Merge a partial update into the chart.
    ///
    /// Scalars are overwritten only by non-empty values; an empty string is
    /// treated the same as an absent field. List deltas are appended verbatim,
    /// without deduplication.
    pub fn apply_update(&mut self, update: &ChartUpdate) {
        overwrite_if_present(&mut self.demographics, &update.demographics);
        overwrite_if_present(&mut self.hpi, &update.hpi);
        overwrite_if_present(&mut self.staging, &update.staging);
        overwrite_if_present(&mut self.comorbidities, &update.comorbidities);
        overwrite_if_present(&mut self.labs, &update.labs);

        self.imaging.extend(update.imaging.iter().cloned());
        self.pathology.extend(update.pathology.iter().cloned());
    }
}

fn overwrite_if_present(target: &mut String, candidate: &Option<String>) {
    if let Some(value) = candidate {
        if !value.is_empty() {
            *target = value.clone();
        }
    }
}
