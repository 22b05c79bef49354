use serde::Serialize;

/// A monotonically increasing count.
#[derive(Debug, Default)]
pub struct Tally(u64);

impl Tally {
    /// Increments the tally and returns the value it had before.
    pub fn increment(&mut self) -> u64 {
        let previous = self.0;
        self.0 += 1;
        previous
    }

    pub fn add(&mut self, amount: u64) -> u64 {
        let previous = self.0;
        self.0 += amount;
        previous
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Per-file ingestion counts. A fresh counter is created for every file and consumed by
/// [`IngestCounter::finish`] once the file is exhausted.
#[derive(Debug, Default)]
pub struct IngestCounter {
    pub records: Tally,
    pub genomes: Tally,
    pub features: Tally,
    pub sequences: Tally,
}

impl IngestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Summary {
        Summary {
            records: self.records.value(),
            genomes: self.genomes.value(),
            features: self.features.value(),
            sequences: self.sequences.value(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub records: u64,
    pub genomes: u64,
    pub features: u64,
    pub sequences: u64,
}

impl Summary {
    pub fn found_records(&self) -> bool {
        self.records > 0
    }

    /// Human readable lines describing the run.
    pub fn lines(&self) -> Vec<String> {
        if !self.found_records() {
            return vec!["No Genomes found, make sure this is a GenBank file.".to_string()];
        }
        let mut lines = vec![format!(
            "{} Genomes found, {} new Genomes added.",
            self.records, self.genomes
        )];
        if self.features > 0 {
            lines.push(format!("{} Features added successfully!", self.features));
        }
        if self.sequences > 0 {
            lines.push(format!("{} Sequences added successfully!", self.sequences));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_returns_previous_value() {
        let mut tally = Tally::default();
        assert_eq!(tally.increment(), 0);
        assert_eq!(tally.increment(), 1);
        assert_eq!(tally.add(3), 2);
        assert_eq!(tally.value(), 5);
    }

    #[test]
    fn counts_are_independent() {
        let mut counter = IngestCounter::new();
        counter.records.increment();
        counter.records.increment();
        counter.features.add(4);
        let summary = counter.finish();
        assert_eq!(
            summary,
            Summary {
                records: 2,
                genomes: 0,
                features: 4,
                sequences: 0,
            }
        );
    }

    #[test]
    fn summary_lines_skip_zero_counts() {
        let summary = Summary {
            records: 3,
            genomes: 1,
            features: 0,
            sequences: 1,
        };
        assert_eq!(
            summary.lines(),
            vec![
                "3 Genomes found, 1 new Genomes added.".to_string(),
                "1 Sequences added successfully!".to_string(),
            ]
        );
    }

    #[test]
    fn empty_run_has_single_line() {
        let lines = Summary::default().lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("No Genomes found"));
    }
}
