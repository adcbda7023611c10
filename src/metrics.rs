use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scores reported by the backend for one evaluation dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bleu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rouge: Option<IndexMap<String, f64>>,
}

impl Metric {
    /// BLEU rendered with four decimals, if present
    pub fn bleu_display(&self) -> Option<String> {
        self.bleu.map(|bleu| format!("{bleu:.4}"))
    }

    /// ROUGE entries rendered as `label:value` with four decimals
    pub fn rouge_display(&self) -> Vec<String> {
        self.rouge
            .iter()
            .flatten()
            .map(|(label, value)| format!("{label}:{value:.4}"))
            .collect()
    }

    /// One-line summary, e.g. `A  BLEU 0.5000  ROUGE 1:0.3000`
    pub fn summary(&self) -> String {
        let mut line = self.dataset.clone();
        if let Some(bleu) = self.bleu_display() {
            line.push_str("  BLEU ");
            line.push_str(&bleu);
        }
        let rouge = self.rouge_display();
        if !rouge.is_empty() {
            line.push_str("  ROUGE ");
            line.push_str(&rouge.join(" "));
        }
        line
    }
}

/// Parse metric entries one by one, dropping the ones that do not fit.
pub fn parse_metrics(entries: Vec<Value>) -> Vec<Metric> {
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}
