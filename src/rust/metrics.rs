use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation summary: per-class metrics plus accuracy and the
/// macro and support-weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Compares predictions with the true labels. Both slices must have the
    /// same length; extra elements of the longer slice are ignored.
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Self {
        let labels: BTreeSet<&str> = y_true.iter().chain(y_pred.iter()).map(String::as_str).collect();
        let pairs: Vec<(&str, &str)> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t.as_str(), p.as_str()))
            .collect();
        let total = pairs.len();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| {
                let tp = pairs.iter().filter(|(t, p)| *t == label && *p == label).count();
                let predicted = pairs.iter().filter(|(_, p)| *p == label).count();
                let support = pairs.iter().filter(|(t, _)| *t == label).count();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1: harmonic_mean(precision, recall),
                    support,
                }
            })
            .collect();

        let correct = pairs.iter().filter(|(t, p)| t == p).count();
        let n_classes = classes.len().max(1) as f64;
        let weight_total = total.max(1) as f64;

        let macro_avg = ClassMetrics {
            label: "macro avg".into(),
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
            support: total,
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".into(),
            precision: classes.iter().map(|c| c.precision * c.support as f64).sum::<f64>() / weight_total,
            recall: classes.iter().map(|c| c.recall * c.support as f64).sum::<f64>() / weight_total,
            f1: classes.iter().map(|c| c.f1 * c.support as f64).sum::<f64>() / weight_total,
            support: total,
        };

        Self {
            classes,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for avg in [&self.macro_avg, &self.weighted_avg] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                avg.label, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_binary_report() {
        let y_true = strings(&["a", "a", "b", "b"]);
        let y_pred = strings(&["a", "b", "b", "b"]);
        let report = ClassificationReport::compute(&y_true, &y_pred);

        assert_eq!(report.accuracy, 0.75);
        let a = report.class("a").unwrap();
        assert_eq!(a.precision, 1.0);
        assert_eq!(a.recall, 0.5);
        assert_eq!(a.support, 2);
        let b = report.class("b").unwrap();
        assert!((b.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(b.recall, 1.0);
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn test_never_predicted_class_has_zero_precision() {
        let report = ClassificationReport::compute(&strings(&["x", "y"]), &strings(&["y", "y"]));
        let x = report.class("x").unwrap();
        assert_eq!(x.precision, 0.0);
        assert_eq!(x.f1, 0.0);
    }

    #[test]
    fn test_display_lists_every_class() {
        let report = ClassificationReport::compute(&strings(&["<=50K", ">50K"]), &strings(&["<=50K", ">50K"]));
        let rendered = report.to_string();
        assert!(rendered.contains("<=50K"));
        assert!(rendered.contains(">50K"));
        assert!(rendered.contains("accuracy"));
        assert!(rendered.contains("weighted avg"));
    }
}
