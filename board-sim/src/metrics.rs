use serde::{Deserialize, Serialize};

const SCORE_CEILING: f64 = 100.0;

/// Performance scores for the resident across the current case.
///
/// Scores start at full scale and are overwritten by the latest graded turn.
/// The two string collections grow by set union and never shrink within a
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub clinical_reasoning: f64,
    pub guideline_adherence: f64,
    pub safety_awareness: f64,
    pub guidelines_cited: Vec<String>,
    pub improvement_areas: Vec<String>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            clinical_reasoning: SCORE_CEILING,
            guideline_adherence: SCORE_CEILING,
            safety_awareness: SCORE_CEILING,
            guidelines_cited: Vec::new(),
            improvement_areas: Vec::new(),
        }
    }
}

/// Partial metrics update from a turn result.
///
/// Each score carries an explicit presence marker: `None` means "not graded
/// this turn", while `Some(0.0)` is a real (failing) score and is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceUpdate {
    pub clinical_reasoning: Option<f64>,
    pub guideline_adherence: Option<f64>,
    pub safety_awareness: Option<f64>,
    pub guidelines_cited: Option<Vec<String>>,
    pub improvement_areas: Option<Vec<String>>,
}

impl PerformanceMetrics {
    pub fn apply_update(&mut self, update: &PerformanceUpdate) {
        if let Some(score) = update.clinical_reasoning {
            self.clinical_reasoning = clamp_score(score);
        }
        if let Some(score) = update.guideline_adherence {
            self.guideline_adherence = clamp_score(score);
        }
        if let Some(score) = update.safety_awareness {
            self.safety_awareness = clamp_score(score);
        }
        if let Some(cited) = &update.guidelines_cited {
            union_into(&mut self.guidelines_cited, cited);
        }
        if let Some(areas) = &update.improvement_areas {
            union_into(&mut self.improvement_areas, areas);
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, SCORE_CEILING)
}

/// Order-preserving set union: new entries are appended, exact duplicates of
/// existing entries are suppressed.
fn union_into(target: &mut Vec<String>, additions: &[String]) {
    for addition in additions {
        if !target.contains(addition) {
            target.push(addition.clone());
        }
    }
}
