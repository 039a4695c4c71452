//! Loading labeled training data from headerless delimited files and
//! splitting it into train and validation parts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::schema::FieldKind;
use crate::{FieldValue, PipelineError, Record, Schema};

/// Records paired with their labels, row for row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub records: Vec<Record>,
    pub labels: Vec<String>,
}

/// What happened while reading a training file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_skipped: usize,
}

impl LabeledDataset {
    pub fn new(records: Vec<Record>, labels: Vec<String>) -> Result<Self, PipelineError> {
        if records.len() != labels.len() {
            return Err(PipelineError::ValidationError(format!(
                "Got {} labels for {} records",
                labels.len(),
                records.len()
            )));
        }
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shuffles rows with a seeded generator and holds out
    /// `ceil(len * test_fraction)` of them.
    ///
    /// Returns `(train, test)`.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), PipelineError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::ValidationError(format!(
                "Validation fraction must be between 0 and 1, got {}",
                test_fraction
            )));
        }
        let n_test = (self.len() as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= self.len() {
            return Err(PipelineError::ValidationError(format!(
                "Cannot hold out {} of {} rows and keep both parts non-empty",
                test_fraction,
                self.len()
            )));
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        let (test_idx, train_idx) = order.split_at(n_test);

        Ok((self.select(train_idx), self.select(test_idx)))
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

/// Reads a headerless comma-separated file whose columns follow
/// `schema.column_order()`.
///
/// Fields are trimmed. Numeric columns become [`FieldValue::Number`] or
/// [`FieldValue::Missing`] when blank or unparsable; categorical columns stay
/// text, blank becoming `Missing`. Rows with the wrong number of columns or an
/// empty label are skipped and counted.
pub fn load_csv(path: impl AsRef<Path>, schema: &Schema) -> Result<(LabeledDataset, LoadSummary), PipelineError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| PipelineError::DataError(format!("Failed to open '{}': {}", path.display(), e)))?;
    info!("Loading training data from {:?}", path);
    read_csv(file, schema)
}

/// Same as [`load_csv`] over any reader.
pub fn read_csv<R: Read>(reader: R, schema: &Schema) -> Result<(LabeledDataset, LoadSummary), PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<(&str, Option<FieldKind>)> = schema
        .column_order()
        .iter()
        .map(|name| (name.as_str(), schema.kind_of(name)))
        .collect();

    let mut dataset = LabeledDataset::default();
    let mut summary = LoadSummary::default();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 1;
        summary.rows_read += 1;
        let row = result?;

        if row.len() != columns.len() {
            warn!("Line {}: expected {} columns, found {}; skipping", line, columns.len(), row.len());
            summary.rows_skipped += 1;
            continue;
        }

        let mut record = Record::new();
        let mut label = None;
        for ((name, kind), raw) in columns.iter().zip(row.iter()) {
            match kind {
                Some(FieldKind::Numeric) => record.insert(*name, parse_numeric(raw)),
                Some(FieldKind::Categorical) => record.insert(*name, parse_categorical(raw)),
                Some(FieldKind::Label) => label = Some(raw.to_string()).filter(|l| !l.is_empty()),
                None => {}
            }
        }

        match label {
            Some(label) => {
                dataset.records.push(record);
                dataset.labels.push(label);
                summary.rows_used += 1;
            }
            None => {
                warn!("Line {}: empty label; skipping", line);
                summary.rows_skipped += 1;
            }
        }
    }

    info!(
        "Read {} rows ({} used, {} skipped)",
        summary.rows_read, summary.rows_used, summary.rows_skipped
    );
    Ok((dataset, summary))
}

fn parse_numeric(raw: &str) -> FieldValue {
    raw.parse::<f64>().ok().filter(|x| x.is_finite()).into()
}

fn parse_categorical(raw: &str) -> FieldValue {
    if raw.is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENSUS_SAMPLE: &str = "\
39, State-gov, 77516, Bachelors, 13, Never-married, Adm-clerical, Not-in-family, White, Male, 2174, 0, 40, United-States, <=50K
50, Self-emp-not-inc, 83311, Bachelors, 13, Married-civ-spouse, Exec-managerial, Husband, White, Male, 0, 0, 13, United-States, <=50K
52, Self-emp-inc, 287927, HS-grad, 9, Married-civ-spouse, Exec-managerial, Wife, White, Female, 15024, 0, 40, United-States, >50K

";

    #[test]
    fn test_reads_census_rows() {
        let (dataset, summary) = read_csv(CENSUS_SAMPLE.as_bytes(), &Schema::census_income()).unwrap();
        assert_eq!(summary.rows_used, 3);
        assert_eq!(summary.rows_skipped, 0);
        assert_eq!(dataset.labels, vec!["<=50K", "<=50K", ">50K"]);

        let first = &dataset.records[0];
        assert_eq!(first.get("age"), Some(&FieldValue::Number(39.0)));
        assert_eq!(first.get("workclass"), Some(&FieldValue::Text("State-gov".into())));
        assert_eq!(first.get("capital-gain"), Some(&FieldValue::Number(2174.0)));
        assert!(!first.contains("income"));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let data = "1, red, yes\n2, blue\nx, , no\n3, red, \n";
        let schema = Schema::new(vec!["n"], vec!["color"], "label").unwrap();
        let (dataset, summary) = read_csv(data.as_bytes(), &schema).unwrap();

        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.rows_used, 2);
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(dataset.records[1].get("n"), Some(&FieldValue::Missing));
        assert_eq!(dataset.records[1].get("color"), Some(&FieldValue::Missing));
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let records: Vec<Record> = (0..20).map(|i| Record::new().with("i", i as f64)).collect();
        let labels: Vec<String> = (0..20).map(|i| format!("l{}", i)).collect();
        let dataset = LabeledDataset::new(records, labels).unwrap();

        let (train, test) = dataset.train_test_split(0.25, 11).unwrap();
        assert_eq!(test.len(), 5);
        assert_eq!(train.len(), 15);
        assert!(test.labels.iter().all(|l| !train.labels.contains(l)));

        let (_, test_again) = dataset.train_test_split(0.25, 11).unwrap();
        assert_eq!(test.labels, test_again.labels);
    }

    #[test]
    fn test_split_rejects_bad_fractions() {
        let dataset = LabeledDataset::new(vec![Record::new(), Record::new()], vec!["a".into(), "b".into()]).unwrap();
        assert!(dataset.train_test_split(0.0, 1).is_err());
        assert!(dataset.train_test_split(1.0, 1).is_err());
        assert!(dataset.train_test_split(0.9, 1).is_err());
    }
}
