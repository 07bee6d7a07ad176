//! Gap-tolerant grouping of scan numbers.

/// Default number of missing scans tolerated inside a run.
pub const DEFAULT_MAX_GAP: usize = 2;

/// Default minimum run length.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;

/// Partition ascending scan numbers into maximal runs.
///
/// A scan joins the current run when it exceeds the run's last scan by at
/// most `max_gap + 1`; repeats of the last scan are ignored. Runs shorter than
/// `min_group_size` are dropped.
///
/// ```
/// use xenoscan::scoring::consecutive_scans;
///
/// assert_eq!(consecutive_scans(&[1, 2, 3, 10], 2, 2), vec![vec![1, 2, 3]]);
/// assert_eq!(consecutive_scans(&[1, 2, 4, 5], 2, 2), vec![vec![1, 2, 4, 5]]);
/// assert!(consecutive_scans(&[5], 2, 2).is_empty());
/// ```
pub fn consecutive_scans(scans: &[usize], max_gap: usize, min_group_size: usize) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &scan in scans {
        match groups.last_mut() {
            Some(group) => {
                let last = group[group.len() - 1];
                if scan == last {
                    continue;
                }
                if scan > last && scan - last <= max_gap + 1 {
                    group.push(scan);
                } else {
                    groups.push(vec![scan]);
                }
            }
            None => groups.push(vec![scan]),
        }
    }
    groups.retain(|group| group.len() >= min_group_size);
    groups
}
