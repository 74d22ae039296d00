use super::ResolvedEntry;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortResult {
    pub vs: Vec<String>,
    pub barycenter: Option<f64>,
    pub weight: f64,
}

/// Orders entries by barycenter. Entries without one keep their original index `i` and are
/// slotted back in at that position. Ties go to the lower index, or the higher one when
/// `bias_right` is set.
pub fn sort(entries: Vec<ResolvedEntry>, bias_right: bool) -> SortResult {
    let (mut sortable, mut unsortable): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|e| e.barycenter.is_some());
    unsortable.sort_by(|a, b| b.i.cmp(&a.i));
    sortable.sort_by(|a, b| compare_with_bias(a, b, bias_right));

    let mut vs: Vec<String> = Vec::new();
    let mut sum = 0.0;
    let mut weight = 0.0;
    let mut vs_index = consume_unsortable(&mut vs, &mut unsortable, 0);

    for entry in sortable {
        vs_index += entry.vs.len();
        sum += entry.barycenter.unwrap_or(0.0) * entry.weight;
        weight += entry.weight;
        vs.extend(entry.vs);
        vs_index = consume_unsortable(&mut vs, &mut unsortable, vs_index);
    }
    // Anything left had an index past the end.
    while let Some(last) = unsortable.pop() {
        vs.extend(last.vs);
    }

    SortResult {
        vs,
        barycenter: (weight != 0.0).then(|| sum / weight),
        weight,
    }
}

fn consume_unsortable(
    vs: &mut Vec<String>,
    unsortable: &mut Vec<ResolvedEntry>,
    mut index: usize,
) -> usize {
    while unsortable.last().is_some_and(|last| last.i <= index) {
        let Some(last) = unsortable.pop() else {
            break;
        };
        vs.extend(last.vs);
        index += 1;
    }
    index
}

fn compare_with_bias(a: &ResolvedEntry, b: &ResolvedEntry, bias_right: bool) -> Ordering {
    let (ab, bb) = (a.barycenter.unwrap_or(0.0), b.barycenter.unwrap_or(0.0));
    match ab.total_cmp(&bb) {
        Ordering::Equal if bias_right => b.i.cmp(&a.i),
        Ordering::Equal => a.i.cmp(&b.i),
        ord => ord,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(v: &str, i: usize, barycenter: Option<f64>, weight: f64) -> ResolvedEntry {
        ResolvedEntry {
            vs: vec![v.to_string()],
            i,
            barycenter,
            weight,
        }
    }

    fn names(result: &SortResult) -> Vec<&str> {
        result.vs.iter().map(String::as_str).collect()
    }

    #[test]
    fn sorts_by_barycenter_and_reports_weighted_mean() {
        let result = sort(
            vec![entry("a", 0, Some(3.0), 1.0), entry("b", 1, Some(1.0), 2.0)],
            false,
        );
        assert_eq!(names(&result), ["b", "a"]);
        assert_eq!(result.barycenter, Some((3.0 + 2.0) / 3.0));
        assert_eq!(result.weight, 3.0);
    }

    #[test]
    fn ties_follow_the_bias() {
        let entries = vec![entry("a", 0, Some(1.0), 1.0), entry("b", 1, Some(1.0), 1.0)];
        assert_eq!(names(&sort(entries.clone(), false)), ["a", "b"]);
        assert_eq!(names(&sort(entries, true)), ["b", "a"]);
    }

    #[test]
    fn unsortable_entries_keep_their_slot() {
        let result = sort(
            vec![
                entry("a", 0, Some(2.0), 1.0),
                entry("fixed", 1, None, 0.0),
                entry("c", 2, Some(1.0), 1.0),
            ],
            false,
        );
        assert_eq!(names(&result), ["c", "fixed", "a"]);
    }

    #[test]
    fn only_unsortable_entries_have_no_barycenter() {
        let result = sort(vec![entry("b", 1, None, 0.0), entry("a", 0, None, 0.0)], false);
        assert_eq!(names(&result), ["a", "b"]);
        assert_eq!(result.barycenter, None);
    }
}
