//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::error::CroreError;

/// One arithmetic fragment of a cron field: every value `v` with
/// `min <= v <= max` and (`v == min` or `v % step == 0`) matches. The modulo
/// is taken on the absolute value, so `1/5` matches 1, 5, 10, 15, ... rather
/// than 1, 6, 11, 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Term {
    pub fn matches(&self, v: i64) -> bool {
        if v < self.min || v > self.max {
            return false;
        }
        v == self.min || v % self.step == 0
    }
}

/// Parse one positional cron field into its comma-separated terms.
pub fn parse_field(raw: &str, field_min: i64, field_max: i64) -> Result<Vec<Term>, CroreError> {
    raw.split(',')
        .map(|sub| parse_subterm(sub, field_min, field_max))
        .collect()
}

fn parse_subterm(sub: &str, field_min: i64, field_max: i64) -> Result<Term, CroreError> {
    if sub == "*" {
        return Ok(Term {
            min: field_min,
            max: field_max,
            step: 1,
        });
    }

    // `*` only has meaning in the lead position; elsewhere it degenerates to
    // a plain zero before the numeric split.
    let starred = sub.starts_with('*');
    let digits = sub.replace('*', "0");
    let (range_part, step_part) = match digits.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (digits.as_str(), None),
    };
    let (lo, hi) = match range_part.split_once('-') {
        Some((lo, hi)) => (lo, Some(hi)),
        None => (range_part, None),
    };

    let lo: i64 = lo.parse().map_err(|_| malformed(sub))?;
    let (min, mut max) = if starred { (field_min, field_max) } else { (lo, -1) };
    if let Some(hi) = hi {
        max = hi.parse().map_err(|_| malformed(sub))?;
    }

    let mut step = 1;
    if let Some(step_part) = step_part {
        step = step_part.parse().map_err(|_| malformed(sub))?;
        // A stepped single point means "from here to the end of the field",
        // so `5/5` runs from 5 every 5 up to the field max.
        if max == -1 || max == min {
            max = field_max;
        }
    }
    if max == -1 {
        max = min;
    }

    if step == 0 || min < field_min || max > field_max || min > max {
        return Err(malformed(sub));
    }

    Ok(Term { min, max, step })
}

fn malformed(sub: &str) -> CroreError {
    CroreError::InvalidExpression(format!("malformed term '{sub}'"))
}
