//! Acquisition order: the traversal order of indirect dimensions.
//!
//! The long form is a list of `p<dim>` (phase increment) and `d<dim>` (delay
//! increment) elements, innermost first.  The compact form is a digit string
//! such as `"321"`, outermost first, optionally led by the total dimension
//! count.

use crate::schedule::SampleSchedule;

/// `p1,d1,p2,d2,...` for the `n_dim - 1` indirect dimensions.
pub fn default_acq_order(n_dim: usize) -> Vec<String> {
    let n_indirect = n_dim.saturating_sub(1);
    let mut order = Vec::with_capacity(n_indirect * 2);
    for i in 1..=n_indirect {
        order.push(format!("p{}", i));
        order.push(format!("d{}", i));
    }
    order
}

/// Expand a compact digit string into the long form.
///
/// Strings of length `n_dim` or `n_dim - 1` drop the digit equal to `n_dim`;
/// longer strings drop the digit equal to `n_dim + 1`.  With `grouped` all
/// phase elements precede all delay elements, otherwise they alternate.
/// Shorter strings are not expandable and return `None`.
pub fn expand_acq_order(compact: &str, n_dim: usize, grouped: bool) -> Option<Vec<String>> {
    let len = compact.chars().count();
    let skip = if len == n_dim || len + 1 == n_dim {
        n_dim
    } else if len > n_dim {
        n_dim + 1
    } else {
        return None;
    };
    let skip = skip.to_string();
    let digits: Vec<String> = compact
        .chars()
        .rev()
        .map(|c| c.to_string())
        .filter(|d| *d != skip)
        .collect();

    let mut order = Vec::with_capacity(digits.len() * 2);
    if grouped {
        order.extend(digits.iter().map(|d| format!("p{}", d)));
        order.extend(digits.iter().map(|d| format!("d{}", d)));
    } else {
        for d in &digits {
            order.push(format!("p{}", d));
            order.push(format!("d{}", d));
        }
    }
    Some(order)
}

/// Compact form of `order`. Returns an empty string if any element is an
/// array (`a`) element.
pub fn short_acq_order(order: &[String], n_dim: usize) -> String {
    let mut out = if order.len() / 2 == n_dim {
        (order.len() / 2 + 1).to_string()
    } else {
        n_dim.to_string()
    };
    for elem in order.iter().rev() {
        let mut chars = elem.chars();
        match chars.next() {
            Some('p') => {
                if let Some(d) = chars.next() {
                    out.push(d);
                }
            }
            Some('a') => return String::new(),
            _ => {}
        }
    }
    out
}

/// Overridable acquisition order of one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcqOrder {
    order: Option<Vec<String>>,
}

impl AcqOrder {
    pub fn get(&self, n_dim: usize) -> Vec<String> {
        match &self.order {
            Some(order) => order.clone(),
            None => default_acq_order(n_dim),
        }
    }

    /// A single element is a compact string; anything else is copied as-is.
    /// An unexpandable compact string leaves the order unchanged.
    pub fn set(&mut self, new_order: &[String], n_dim: usize, schedule: Option<&SampleSchedule>) {
        if let [compact] = new_order {
            let grouped = schedule.map(|s| !s.is_demo()).unwrap_or(false);
            match expand_acq_order(compact, n_dim, grouped) {
                Some(order) => self.order = Some(order),
                None => log::debug!(
                    "Acquisition order '{}' too short for {} dims, unchanged",
                    compact,
                    n_dim
                ),
            }
        } else {
            self.order = Some(new_order.to_vec());
        }
    }

    pub fn reset(&mut self) {
        self.order = None;
    }

    pub fn short(&self, n_dim: usize) -> String {
        short_acq_order(&self.get(n_dim), n_dim)
    }
}
