//! Adaptive choice of the next pair of lines to compare.
//!
//! The scheduler is an online insertion sort with a human comparator. Each new
//! line is compared against a moving cursor; a `greater` verdict sends the
//! line backward along the chain of earlier judgments to find where it
//! belongs, and an indeterminate (`other`) verdict re-anchors on the last
//! settled line.
//!
//! # Rules
//!
//! Let `data` be the document's lines and `current` the index of the second
//! line of the document's most recent record.
//!
//! 1. No record for the document: compare `data[0]` with `data[1]`.
//! 2. Last outcome `other`: the anchor is the second line of the nearest
//!    earlier record that is not `other` (or the first line of the document's
//!    oldest record when every record is `other`). Compare the anchor with
//!    `data[current + 1]`.
//! 3. Last outcome `greater`: follow the trail of first lines backward through
//!    the history. The first record on the trail labelled `less` gives the
//!    anchor; compare it with `data[current]`. If the trail runs out, fall
//!    through to rule 4.
//! 4. Otherwise compare `data[current]` with `data[current + 1]`.
//!
//! Whenever `current + 1` would run past the end, the document is done.
//!
//! The scheduler keeps no state between calls. Everything is rebuilt from
//! `(document, history)`, so callers must serialize history updates for a
//! document themselves.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::config::{Config, Sampling};
use crate::document::{BoundingBox, Document, DocumentSet, Line};
use crate::error::ScheduleError;
use crate::history::{History, HistoryEntry};
use crate::label::{LabelScheme, Outcome};
use crate::task_id::TaskId;

/// Line reference handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    pub uid: String,
    pub img_name: String,
    pub bbox: BoundingBox,
}

impl From<&Line> for LineView {
    fn from(line: &Line) -> Self {
        Self {
            uid: line.uid.clone(),
            img_name: line.img_name.clone(),
            bbox: line.bbox,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPayload {
    pub first: LineView,
    pub second: LineView,
    /// Advisory pre-selection; never recorded until the annotator confirms.
    pub proposed_label: String,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub payload: TaskPayload,
}

pub struct Scheduler<'a> {
    scheme: &'a LabelScheme,
    default_label: &'a str,
    instruction: &'a str,
    sampling: Sampling,
}

impl<'a> Scheduler<'a> {
    pub fn new(scheme: &'a LabelScheme, default_label: &'a str) -> Self {
        Self {
            scheme,
            default_label,
            instruction: "",
            sampling: Sampling::Sequential,
        }
    }

    pub fn from_config(config: &'a Config, scheme: &'a LabelScheme) -> Self {
        Self {
            scheme,
            default_label: &config.default_label,
            instruction: &config.instruction,
            sampling: config.sampling,
        }
    }

    pub fn with_instruction(mut self, instruction: &'a str) -> Self {
        self.instruction = instruction;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Next comparison for one document, or `None` once it is exhausted.
    pub fn next_task(
        &self,
        doc: &Document,
        history: &History,
    ) -> Result<Option<ScheduledTask>, ScheduleError> {
        if !doc.is_eligible() {
            return Err(ScheduleError::TooFewLines {
                doc_name: doc.doc_name.clone(),
                lines: doc.len(),
            });
        }

        let records = history.for_document(&doc.doc_name);
        let Some(last) = records.last() else {
            debug!(doc = %doc.doc_name, "cold start");
            return self.make_task(doc, 0, 1).map(Some);
        };

        let n = doc.len();
        let current = resolve(doc, &last.task, last.task.second_uid())?;
        let outcome = self.outcome(last);

        let pair = match outcome {
            Outcome::Other => {
                let anchor = self.settled_anchor(doc, &records)?;
                (current + 1 < n).then_some((anchor, current + 1))
            }
            Outcome::Greater => match self.insertion_anchor(doc, &records)? {
                Some(anchor) => Some((anchor, current)),
                None => advance(current, n),
            },
            Outcome::Less | Outcome::Equal | Outcome::Unrecognized => advance(current, n),
        };

        debug!(
            doc = %doc.doc_name,
            last = %last.task,
            outcome = outcome.as_str(),
            current,
            next = ?pair,
            "scheduled"
        );

        pair.map(|(a, b)| self.make_task(doc, a, b)).transpose()
    }

    /// Next comparison across a document set.
    ///
    /// Documents are visited in sampling order; the first one that is not
    /// exhausted wins. Documents with fewer than two lines are skipped.
    pub fn next_in_set(
        &self,
        documents: &DocumentSet,
        history: &History,
    ) -> Result<Option<ScheduledTask>, ScheduleError> {
        for (_, doc) in visiting_order(documents, self.sampling) {
            if let Some(task) = self.next_task(doc, history)? {
                return Ok(Some(task));
            }
        }
        Ok(None)
    }

    /// Proposed label for a pair, derived from line categories when both
    /// carry a numeric level (lower level = more important).
    pub fn propose(&self, first: &Line, second: &Line) -> String {
        let levels = first
            .category
            .as_ref()
            .and_then(|c| c.level())
            .zip(second.category.as_ref().and_then(|c| c.level()));

        let derived = levels.and_then(|(a, b)| {
            let outcome = match b.partial_cmp(&a)? {
                Ordering::Less => Outcome::Greater,
                Ordering::Greater => Outcome::Less,
                Ordering::Equal => Outcome::Equal,
            };
            self.scheme.label_for(outcome)
        });

        derived.unwrap_or(self.default_label).to_string()
    }

    fn outcome(&self, entry: &HistoryEntry) -> Outcome {
        self.scheme.outcome(entry.record.effective())
    }

    /// Anchor after an indeterminate verdict: the last line that was settled
    /// by a real comparison.
    fn settled_anchor(
        &self,
        doc: &Document,
        records: &[&HistoryEntry],
    ) -> Result<usize, ScheduleError> {
        if let Some(settled) = records
            .iter()
            .rev()
            .find(|e| self.outcome(e) != Outcome::Other)
        {
            return resolve(doc, &settled.task, settled.task.second_uid());
        }
        // Every record is indeterminate: fall back to the chain origin.
        let origin = &records[0].task;
        resolve(doc, origin, origin.first_uid())
    }

    /// Anchor after a `greater` verdict, found by walking the trail of first
    /// lines back to the nearest `less`.
    fn insertion_anchor(
        &self,
        doc: &Document,
        records: &[&HistoryEntry],
    ) -> Result<Option<usize>, ScheduleError> {
        let Some(last) = records.last() else {
            return Ok(None);
        };
        let mut trail = last.task.first_uid();

        for entry in records.iter().rev() {
            if entry.task.second_uid() != trail {
                continue;
            }
            if self.outcome(entry) == Outcome::Less {
                return resolve(doc, &entry.task, entry.task.first_uid()).map(Some);
            }
            trail = entry.task.first_uid();
        }
        Ok(None)
    }

    fn make_task(
        &self,
        doc: &Document,
        first: usize,
        second: usize,
    ) -> Result<ScheduledTask, ScheduleError> {
        let a = &doc.data[first];
        let b = &doc.data[second];
        let id = TaskId::new(&doc.doc_name, &a.uid, &b.uid)?;
        Ok(ScheduledTask {
            id,
            payload: TaskPayload {
                first: a.into(),
                second: b.into(),
                proposed_label: self.propose(a, b),
                instruction: self.instruction.to_string(),
            },
        })
    }
}

fn advance(current: usize, n: usize) -> Option<(usize, usize)> {
    (current + 1 < n).then_some((current, current + 1))
}

fn resolve(doc: &Document, task: &TaskId, uid: &str) -> Result<usize, ScheduleError> {
    doc.position(uid).ok_or_else(|| ScheduleError::StaleHistory {
        task: task.clone(),
        uid: uid.to_string(),
    })
}

/// Eligible documents in the order they are offered.
fn visiting_order(documents: &DocumentSet, sampling: Sampling) -> Vec<(&str, &Document)> {
    let mut docs: Vec<(&str, &Document)> = documents.eligible().collect();
    match sampling {
        Sampling::Sequential => {}
        Sampling::Shuffle | Sampling::Random => {
            docs.sort_by_key(|(id, _)| (fnv1a(id.as_bytes()), *id));
        }
    }
    docs
}

/// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
