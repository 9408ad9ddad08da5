//! Fuzzy string similarity for pairing library tracks with catalog tracks.
//!
//! Both strings are normalized, then every character of the longer one is
//! looked for in the shorter one near the same index. Characters found at a
//! consistent offset cost nothing, so an inserted word only costs once.

const STRIPPED_CHARS: &[char] = &[
    ' ', '(', ')', '[', ']', '{', '}', '/', '\\', '|', '-', '.', ',', ':', ';', '!', '@', '#', '$', '%', '^', '&',
    '*',
];

/// Lowercase, drop "feat"/"original mix"/"original" and punctuation.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .replace("feat", "")
        .replace("original mix", "")
        .replace("original", "")
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect()
}

/// Index in `shorter` where `longer[i]` is found, searching outwards from `i`
/// up to `i / 2` positions away. On a tie the lower index wins.
fn find_closest(longer: &[char], i: usize, shorter: &[char]) -> Option<usize> {
    let wanted = longer[i];
    for diff in 0..=i / 2 {
        let mut found = None;
        if shorter.get(i + diff) == Some(&wanted) {
            found = Some(i + diff);
        }
        if shorter.get(i - diff) == Some(&wanted) {
            found = Some(i - diff);
        }
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Similarity in `[0, 1]`; `1.0` for identical normalized strings.
pub fn score(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    let (longer, shorter) = if a.len() < b.len() { (b, a) } else { (a, b) };

    if longer.is_empty() {
        return 1.0;
    }

    let len = longer.len() as f64;
    let mut total = 0.0;
    let mut prev_dist = 0;

    for i in 0..longer.len() {
        total += match find_closest(&longer, i, &shorter) {
            Some(j) => {
                let dist = i.abs_diff(j);
                let cost = if dist == prev_dist { 0.0 } else { dist as f64 / len };
                prev_dist = dist;
                cost
            }
            None => 1.0,
        };
    }

    1.0 - total / len
}
