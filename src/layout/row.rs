//! # Row Width Distribution
//!
//! A row partitions its content width among its flowing children. Columns
//! with a fixed width are carved out first, left to right, each taking at
//! most what is still left. The remainder is shared evenly by the
//! unconstrained columns: at each step a column receives
//! `remaining / unconstrained_left`.

/// Widths for a row's children given each child's fixed width, if any.
pub fn distribute(fixed: &[Option<f64>], available: f64) -> Vec<f64> {
    let mut remaining = available.max(0.0);
    let mut widths = vec![0.0; fixed.len()];

    for (slot, fixed) in widths.iter_mut().zip(fixed) {
        if let Some(f) = fixed {
            let w = f.max(0.0).min(remaining);
            *slot = w;
            remaining -= w;
        }
    }

    let mut unconstrained = fixed.iter().filter(|f| f.is_none()).count();
    for (slot, fixed) in widths.iter_mut().zip(fixed) {
        if fixed.is_none() {
            let w = remaining / unconstrained as f64;
            *slot = w;
            remaining -= w;
            unconstrained -= 1;
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split() {
        assert_eq!(distribute(&[None, None, None], 300.0), vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn fixed_column_is_carved_out_first() {
        assert_eq!(
            distribute(&[Some(50.0), None, None], 300.0),
            vec![50.0, 125.0, 125.0]
        );
        // Position of the fixed column does not change the shares.
        assert_eq!(
            distribute(&[None, None, Some(50.0)], 300.0),
            vec![125.0, 125.0, 50.0]
        );
    }

    #[test]
    fn fixed_columns_never_exceed_the_row() {
        let widths = distribute(&[Some(200.0), Some(200.0), None], 300.0);
        assert_eq!(widths, vec![200.0, 100.0, 0.0]);
        assert!(widths.iter().sum::<f64>() <= 300.0);
    }

    #[test]
    fn empty_row() {
        assert!(distribute(&[], 300.0).is_empty());
    }
}
