/// Insertions, deletions and substitutions needed to turn `a` into `b`,
/// counted over bytes.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let (short, long) = if a.len() <= b.len() {
        (a.as_bytes(), b.as_bytes())
    } else {
        (b.as_bytes(), a.as_bytes())
    };
    if short.is_empty() {
        return long.len();
    }

    // `row[i]` is the distance between `short[..i]` and the prefix of `long` seen so far.
    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (j, &lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = j + 1;
        for (i, &sc) in short.iter().enumerate() {
            let substitute = diagonal + usize::from(sc != lc);
            diagonal = row[i + 1];
            row[i + 1] = substitute.min(row[i] + 1).min(diagonal + 1);
        }
    }
    row[short.len()]
}

/// The candidate closest to `target` within `max_distance` edits, if any.
/// Ties go to the earliest candidate.
pub fn closest_within<'a, I>(target: &str, candidates: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, usize)> = None;
    for candidate in candidates {
        let d = levenshtein_distance(target, candidate);
        if d <= max_distance && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_zero() {
        assert_eq!(levenshtein_distance("model", "model"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn empty_string_is_length_of_other() {
        assert_eq!(levenshtein_distance("", "date"), 4);
        assert_eq!(levenshtein_distance("date", ""), 4);
    }

    #[test]
    fn transposition_costs_two() {
        assert_eq!(levenshtein_distance("model", "modle"), 2);
    }

    #[test]
    fn commutative() {
        assert_eq!(
            levenshtein_distance("quantity", "qty"),
            levenshtein_distance("qty", "quantity")
        );
    }

    #[test]
    fn closest_within_respects_limit() {
        let headers = ["order_no", "modle", "price"];
        assert_eq!(closest_within("model", headers, 2), Some("modle"));
        assert_eq!(closest_within("date", headers, 2), None);
    }

    #[test]
    fn single_edits_cost_one() {
        assert_eq!(levenshtein_distance("date", "data"), 1);
        assert_eq!(levenshtein_distance("price", "prices"), 1);
        assert_eq!(levenshtein_distance("amount", "amont"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn closest_within_prefers_nearer_then_earlier() {
        assert_eq!(closest_within("model", ["modle", "modl"], 2), Some("modl"));
        assert_eq!(closest_within("date", ["dat", "ate"], 1), Some("dat"));
    }
}
