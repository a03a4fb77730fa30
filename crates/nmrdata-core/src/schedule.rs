//! Sample-Schedule Index for non-uniformly sampled acquisitions.
//!
//! A schedule is the ordered list of indirect-dimension coordinates that
//! were physically acquired.  The position of a coordinate in that list is
//! its physical row in the data file.

use crate::error::{NmrDataError, Result};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    points: Vec<Vec<usize>>,
    index: HashMap<Vec<usize>, usize>,
    end: Vec<usize>,
    demo: bool,
}

impl SampleSchedule {
    /// Build from sampled coordinates in acquisition order.
    ///
    /// Every point must have the same number of coordinates.  A repeated
    /// point keeps its first physical index.
    pub fn from_points(points: Vec<Vec<usize>>, demo: bool) -> Result<Self> {
        let n_dim = points.first().map(Vec::len).unwrap_or(0);
        let mut end = vec![0usize; n_dim];
        let mut index = HashMap::with_capacity(points.len());
        for (row, p) in points.iter().enumerate() {
            if p.len() != n_dim {
                return Err(NmrDataError::HeaderParse(format!(
                    "schedule point {} has {} coordinates, expected {}",
                    row,
                    p.len(),
                    n_dim
                )));
            }
            for (e, &c) in end.iter_mut().zip(p) {
                *e = (*e).max(c + 1);
            }
            index.entry(p.clone()).or_insert(row);
        }
        Ok(Self {
            points,
            index,
            end,
            demo,
        })
    }

    /// Parse a text schedule: one sampled point per line, whitespace
    /// separated coordinates, `#` starts a comment.
    pub fn parse(text: &str, demo: bool) -> Result<Self> {
        let mut points = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let point = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<usize>().map_err(|_| {
                        NmrDataError::HeaderParse(format!(
                            "schedule line {}: bad index '{}'",
                            lineno + 1,
                            tok
                        ))
                    })
                })
                .collect::<Result<Vec<usize>>>()?;
            points.push(point);
        }
        Self::from_points(points, demo)
    }

    pub fn read_file(path: &Path, demo: bool) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let schedule = Self::parse(&text, demo)?;
        log::info!(
            "Read sample schedule {} ({} points, {} dims)",
            path.display(),
            schedule.total_samples(),
            schedule.n_dim()
        );
        Ok(schedule)
    }

    /// Physical row of a logical coordinate, or `None` when not sampled.
    pub fn lookup(&self, point: &[usize]) -> Option<usize> {
        self.index.get(point).copied()
    }

    pub fn total_samples(&self) -> usize {
        self.points.len()
    }

    pub fn n_dim(&self) -> usize {
        self.end.len()
    }

    /// Full (uniform) grid size of each indirect dimension.
    pub fn end(&self) -> &[usize] {
        &self.end
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn set_demo(&mut self, demo: bool) {
        self.demo = demo;
    }

    pub fn points(&self) -> &[Vec<usize>] {
        &self.points
    }
}
