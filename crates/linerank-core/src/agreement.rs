//! Agreement between two annotators' histories.
//!
//! The first history is treated as the reference. Only the first label of each
//! record is compared.

use crate::history::History;
use crate::task_id::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub task: TaskId,
    pub first: String,
    pub second: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgreementReport {
    pub correct: Vec<(TaskId, String)>,
    pub mismatch: Vec<Mismatch>,
    /// In the reference only.
    pub missed: Vec<(TaskId, String)>,
    /// In the second history only.
    pub added: Vec<(TaskId, String)>,
}

impl AgreementReport {
    pub fn compare(reference: &History, other: &History) -> Self {
        let mut report = Self::default();

        for entry in reference.iter() {
            let label = entry.record.primary().to_string();
            match other.get(&entry.task) {
                None => report.missed.push((entry.task.clone(), label)),
                Some(rec) if rec.primary() == label => {
                    report.correct.push((entry.task.clone(), label))
                }
                Some(rec) => report.mismatch.push(Mismatch {
                    task: entry.task.clone(),
                    first: label,
                    second: rec.primary().to_string(),
                }),
            }
        }

        for entry in other.iter().filter(|e| !reference.contains(&e.task)) {
            report
                .added
                .push((entry.task.clone(), entry.record.primary().to_string()));
        }

        report
    }

    /// Accumulate another report, e.g. from the next pair of result files.
    pub fn merge(&mut self, other: AgreementReport) {
        self.correct.extend(other.correct);
        self.mismatch.extend(other.mismatch);
        self.missed.extend(other.missed);
        self.added.extend(other.added);
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(
            self.correct.len(),
            self.correct.len() + self.added.len() + self.mismatch.len(),
        )
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(
            self.correct.len(),
            self.correct.len() + self.missed.len() + self.mismatch.len(),
        )
    }

    pub fn f_measure(&self) -> Option<f64> {
        let p = self.precision()?;
        let r = self.recall()?;
        if p + r == 0.0 {
            return None;
        }
        Some(2.0 * p * r / (p + r))
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ComparisonRecord;

    fn history(entries: &[(&str, &str)]) -> History {
        entries
            .iter()
            .map(|(key, label)| (TaskId::decode(key).unwrap(), ComparisonRecord::single(*label)))
            .collect()
    }

    #[test]
    fn classifies_every_key() {
        let a = history(&[
            ("d___1___2", "less"),
            ("d___2___3", "greater"),
            ("d___1___3", "less"),
        ]);
        let b = history(&[
            ("d___1___2", "less"),
            ("d___2___3", "less"),
            ("d___3___4", "equal"),
        ]);
        let report = AgreementReport::compare(&a, &b);
        assert_eq!(report.correct.len(), 1);
        assert_eq!(report.mismatch.len(), 1);
        assert_eq!(report.mismatch[0].first, "greater");
        assert_eq!(report.mismatch[0].second, "less");
        assert_eq!(report.missed[0].0.encode(), "d___1___3");
        assert_eq!(report.added[0].0.encode(), "d___3___4");
    }

    #[test]
    fn scores() {
        let a = history(&[
            ("d___1___2", "less"),
            ("d___2___3", "less"),
            ("d___3___4", "less"),
            ("d___4___5", "other"),
        ]);
        let b = history(&[
            ("d___1___2", "less"),
            ("d___2___3", "less"),
            ("d___3___4", "greater"),
            ("d___2___4", "less"),
        ]);
        let report = AgreementReport::compare(&a, &b);
        // correct 2, mismatch 1, missed 1, added 1
        assert_eq!(report.precision(), Some(0.5));
        assert_eq!(report.recall(), Some(0.5));
        assert_eq!(report.f_measure(), Some(0.5));
    }

    #[test]
    fn empty_histories_have_no_scores() {
        let report = AgreementReport::compare(&History::new(), &History::new());
        assert_eq!(report.precision(), None);
        assert_eq!(report.recall(), None);
        assert_eq!(report.f_measure(), None);
    }

    #[test]
    fn only_first_label_counts() {
        let mut a = History::new();
        a.push(
            TaskId::decode("d___1___2").unwrap(),
            ComparisonRecord::new(vec!["less".into(), "other".into()]).unwrap(),
        );
        let b = history(&[("d___1___2", "less")]);
        let report = AgreementReport::compare(&a, &b);
        assert_eq!(report.correct.len(), 1);
    }

    #[test]
    fn merge_accumulates() {
        let a = history(&[("d___1___2", "less")]);
        let b = history(&[("d___1___2", "greater")]);
        let mut total = AgreementReport::compare(&a, &a);
        total.merge(AgreementReport::compare(&a, &b));
        assert_eq!(total.correct.len(), 1);
        assert_eq!(total.mismatch.len(), 1);
        assert_eq!(total.precision(), Some(0.5));
    }
}
