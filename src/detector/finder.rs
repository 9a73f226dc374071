/// Finder pattern detection: 1:1:3:1:1 run scanning on every row, confirmed by
/// vertical, horizontal and diagonal cross-checks
use log::trace;

use crate::models::{BitMatrix, Point};

/// A confirmed finder pattern center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    /// Center of the 3x3 core, in pixels
    pub center: Point,
    /// Row run width over 7; grows with rotation
    pub module_size: f32,
    /// Number of scan rows that confirmed this center
    pub count: usize,
}

impl FinderPattern {
    /// Pattern confirmed once
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
        }
    }

    /// Same pattern if within one module and of similar size
    fn about_equals(&self, module_size: f32, x: f32, y: f32) -> bool {
        if (y - self.center.y).abs() <= module_size && (x - self.center.x).abs() <= module_size {
            let diff = (module_size - self.module_size).abs();
            diff <= 1.0 || diff <= self.module_size
        } else {
            false
        }
    }

    /// Count-weighted average with a new observation
    fn combine(&self, x: f32, y: f32, module_size: f32) -> Self {
        let n = self.count as f32;
        let total = n + 1.0;
        Self {
            center: Point::new(
                (n * self.center.x + x) / total,
                (n * self.center.y + y) / total,
            ),
            module_size: (n * self.module_size + module_size) / total,
            count: self.count + 1,
        }
    }
}

/// Default cap on returned candidates
pub const DEFAULT_MAX_CANDIDATES: usize = 48;

/// Row scanner for finder patterns
pub struct FinderDetector;

impl FinderDetector {
    /// Candidates capped at [`DEFAULT_MAX_CANDIDATES`]
    pub fn detect(matrix: &BitMatrix) -> Vec<FinderPattern> {
        Self::detect_with_limit(matrix, DEFAULT_MAX_CANDIDATES)
    }

    /// Scan every row; keep candidates confirmed at least twice unless fewer
    /// than three would remain, most confirmed first
    pub fn detect_with_limit(matrix: &BitMatrix, max_candidates: usize) -> Vec<FinderPattern> {
        let mut candidates: Vec<FinderPattern> = Vec::new();
        for y in 0..matrix.height() {
            Self::scan_row(matrix, y, &mut candidates);
        }

        let confirmed = candidates.iter().filter(|c| c.count >= 2).count();
        if confirmed >= 3 {
            candidates.retain(|c| c.count >= 2);
        }
        candidates.sort_by(|a, b| b.count.cmp(&a.count));
        candidates.truncate(max_candidates);
        trace!("{} finder candidates", candidates.len());
        candidates
    }

    fn scan_row(matrix: &BitMatrix, y: usize, candidates: &mut Vec<FinderPattern>) {
        let width = matrix.width();
        let mut counts = [0usize; 5];
        let mut state = 0usize;

        for x in 0..width {
            if matrix.get(x, y) {
                // black after white starts the next run
                if state & 1 == 1 {
                    state += 1;
                }
                counts[state] += 1;
            } else if state & 1 == 1 {
                counts[state] += 1;
            } else if state == 4 {
                if found_pattern_cross(&counts)
                    && Self::handle_possible_center(matrix, &counts, x, y, candidates)
                {
                    counts = [0; 5];
                    state = 0;
                } else {
                    shift_counts_by_two(&mut counts);
                    state = 3;
                }
            } else {
                state += 1;
                counts[state] += 1;
            }
        }

        if found_pattern_cross(&counts) {
            Self::handle_possible_center(matrix, &counts, width, y, candidates);
        }
    }

    fn handle_possible_center(
        matrix: &BitMatrix,
        counts: &[usize; 5],
        end_x: usize,
        y: usize,
        candidates: &mut Vec<FinderPattern>,
    ) -> bool {
        let total: usize = counts.iter().sum();
        let center_x = center_from_end(counts, end_x);
        // each cross-check also tries the lines one module to either side
        let module = ((total as f32 / 7.0).round() as isize).max(1);
        let shifted = |at: f32| {
            [0, -module, module]
                .into_iter()
                .map(move |d| at as isize + d)
                .filter(|&p| p >= 0)
                .map(|p| p as usize)
        };

        let Some(center_y) = shifted(center_x)
            .find_map(|x| cross_check_vertical(matrix, y, x, counts[2], total))
        else {
            return false;
        };
        let Some(center_x) = shifted(center_y).find_map(|row| {
            cross_check_horizontal(matrix, center_x as usize, row, counts[2], total)
        }) else {
            return false;
        };
        if !shifted(center_x).any(|x| cross_check_diagonal(matrix, x, center_y as usize)) {
            return false;
        }

        let module_size = total as f32 / 7.0;
        match candidates
            .iter_mut()
            .find(|c| c.about_equals(module_size, center_x, center_y))
        {
            Some(existing) => *existing = existing.combine(center_x, center_y, module_size),
            None => candidates.push(FinderPattern::new(center_x, center_y, module_size)),
        }
        true
    }
}

/// Runs are within half a module of 1:1:3:1:1
pub fn found_pattern_cross(counts: &[usize; 5]) -> bool {
    pattern_matches(counts, 2.0)
}

/// Looser ratio used along the diagonal
fn found_pattern_diagonal(counts: &[usize; 5]) -> bool {
    pattern_matches(counts, 1.333)
}

fn pattern_matches(counts: &[usize; 5], variance_divisor: f32) -> bool {
    if counts.contains(&0) {
        return false;
    }
    let total: usize = counts.iter().sum();
    if total < 7 {
        return false;
    }
    let module = total as f32 / 7.0;
    let max_variance = module / variance_divisor;
    let near = |count: usize, modules: f32| (modules * module - count as f32).abs() < modules * max_variance;
    near(counts[0], 1.0)
        && near(counts[1], 1.0)
        && near(counts[2], 3.0)
        && near(counts[3], 1.0)
        && near(counts[4], 1.0)
}

fn shift_counts_by_two(counts: &mut [usize; 5]) {
    counts[0] = counts[2];
    counts[1] = counts[3];
    counts[2] = counts[4];
    counts[3] = 1;
    counts[4] = 0;
}

/// Center of the middle run, given the position just past the last run
fn center_from_end(counts: &[usize; 5], end: usize) -> f32 {
    end as f32 - counts[4] as f32 - counts[3] as f32 - counts[2] as f32 / 2.0
}

/// Walk a line through `(x, y)` in both directions and collect the five runs;
/// `at(i)` reads the pixel `i` steps along the line
fn cross_check_line(
    start: usize,
    limit: usize,
    max_count: usize,
    original_total: usize,
    at: impl Fn(usize) -> bool,
) -> Option<f32> {
    let mut counts = [0usize; 5];

    // towards lower indices
    let mut i = start as isize;
    while i >= 0 && at(i as usize) {
        counts[2] += 1;
        i -= 1;
    }
    if i < 0 {
        return None;
    }
    while i >= 0 && !at(i as usize) && counts[1] <= max_count {
        counts[1] += 1;
        i -= 1;
    }
    if i < 0 || counts[1] > max_count {
        return None;
    }
    while i >= 0 && at(i as usize) && counts[0] <= max_count {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] > max_count {
        return None;
    }

    // towards higher indices
    let mut i = start + 1;
    while i < limit && at(i) {
        counts[2] += 1;
        i += 1;
    }
    if i == limit {
        return None;
    }
    while i < limit && !at(i) && counts[3] < max_count {
        counts[3] += 1;
        i += 1;
    }
    if i == limit || counts[3] >= max_count {
        return None;
    }
    while i < limit && at(i) && counts[4] < max_count {
        counts[4] += 1;
        i += 1;
    }
    if counts[4] >= max_count {
        return None;
    }

    let total: usize = counts.iter().sum();
    if 5 * total.abs_diff(original_total) >= 2 * original_total {
        return None;
    }
    found_pattern_cross(&counts).then(|| center_from_end(&counts, i))
}

fn cross_check_vertical(
    matrix: &BitMatrix,
    start_y: usize,
    center_x: usize,
    max_count: usize,
    original_total: usize,
) -> Option<f32> {
    cross_check_line(start_y, matrix.height(), max_count, original_total, |y| {
        matrix.get(center_x, y)
    })
}

fn cross_check_horizontal(
    matrix: &BitMatrix,
    start_x: usize,
    center_y: usize,
    max_count: usize,
    original_total: usize,
) -> Option<f32> {
    cross_check_line(start_x, matrix.width(), max_count, original_total, |x| {
        matrix.get(x, center_y)
    })
}

/// The pattern must also read 1:1:3:1:1 along the main diagonal
fn cross_check_diagonal(matrix: &BitMatrix, center_x: usize, center_y: usize) -> bool {
    let mut counts = [0usize; 5];
    let up = |i: usize| matrix.get(center_x - i, center_y - i);
    let in_up = |i: usize| center_x >= i && center_y >= i;

    let mut i = 0;
    while in_up(i) && up(i) {
        counts[2] += 1;
        i += 1;
    }
    if counts[2] == 0 {
        return false;
    }
    while in_up(i) && !up(i) {
        counts[1] += 1;
        i += 1;
    }
    if counts[1] == 0 {
        return false;
    }
    while in_up(i) && up(i) {
        counts[0] += 1;
        i += 1;
    }
    if counts[0] == 0 {
        return false;
    }

    let down = |i: usize| matrix.get(center_x + i, center_y + i);
    let in_down = |i: usize| center_x + i < matrix.width() && center_y + i < matrix.height();
    let mut i = 1;
    while in_down(i) && down(i) {
        counts[2] += 1;
        i += 1;
    }
    while in_down(i) && !down(i) {
        counts[3] += 1;
        i += 1;
    }
    if counts[3] == 0 {
        return false;
    }
    while in_down(i) && down(i) {
        counts[4] += 1;
        i += 1;
    }
    if counts[4] == 0 {
        return false;
    }

    found_pattern_diagonal(&counts)
}
