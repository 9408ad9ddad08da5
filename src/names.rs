//! Cleanup of catalog display strings and rendering of name lists.

/// Remove the `" (N)"` suffix Discogs appends to tell apart identically named
/// artists and labels: `"Titan (15)"` → `"Titan"`.
pub fn strip_duplicate_suffix(name: &str) -> String {
    if let Some(inner) = name.strip_suffix(')') {
        if let Some(idx) = inner.rfind(" (") {
            let digits = &inner[idx + 2..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return name[..idx].to_string();
            }
        }
    }
    name.to_string()
}

/// `"XX, The"` → `"The XX"`.
pub fn invert_leading_article(name: &str) -> String {
    match name.strip_suffix(", The") {
        Some(prefix) => format!("The {}", prefix),
        None => name.to_string(),
    }
}

/// Both catalog cleanups, duplicate suffix first: `"Test, The (22)"` → `"The Test"`.
pub fn fix_catalog_string(name: &str) -> String {
    invert_leading_article(&strip_duplicate_suffix(name))
}

/// Title cleanup applied to every catalog track title.
pub fn clean_track_title(title: &str) -> String {
    let mut title = title.replace("Rmx", "Remix");
    for noise in [" (Original Mix)", " (Original)"] {
        title = title.replace(noise, "");
    }
    title
}

// ── List concatenation ──────────────────────────────────────────────────────

/// How [`concat_names`] renders a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStyle {
    separator: Option<String>,
    dedup: bool,
    sort: bool,
}

impl Default for ListStyle {
    /// `"a, b, c & d"`, deduplicated and sorted.
    fn default() -> Self {
        ListStyle {
            separator: None,
            dedup: true,
            sort: true,
        }
    }
}

impl ListStyle {
    /// Join every element with `separator` (no `&` before the last one).
    /// Duplicates are dropped, first occurrence order is kept.
    pub fn joined(separator: &str) -> Self {
        ListStyle {
            separator: Some(separator.to_string()),
            dedup: true,
            sort: false,
        }
    }

    /// Sort (and deduplicate) before rendering.
    pub fn sorted(mut self) -> Self {
        self.sort = true;
        self.dedup = true;
        self
    }

    /// Render elements exactly as given, duplicates included.
    pub fn keep_order(mut self) -> Self {
        self.sort = false;
        self.dedup = false;
        self
    }
}

/// Render a list of names, e.g. `["B", "A", "C"]` → `"A, B & C"`.
pub fn concat_names<I, S>(items: I, style: &ListStyle) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for item in items {
        let item = item.as_ref();
        if style.dedup && names.iter().any(|n| n == item) {
            continue;
        }
        names.push(item.to_string());
    }
    if style.sort {
        names.sort();
    }

    match &style.separator {
        Some(sep) => names.join(sep),
        None => match names.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, init)) => format!("{} & {}", init.join(", "), last),
        },
    }
}

// ── Credit roles ────────────────────────────────────────────────────────────

/// Split a Discogs role string into its tags. Commas inside brackets belong
/// to the tag: `"Producer [Co-producer, Additional], Written-By"` gives two
/// tags.
pub fn split_roles(role: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in role.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_tag(&mut tags, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_tag(&mut tags, &current);
    tags
}

fn push_tag(tags: &mut Vec<String>, tag: &str) {
    let tag = tag.trim();
    if !tag.is_empty() {
        tags.push(tag.to_string());
    }
}

/// True when some tag contains an `include` keyword and none of the
/// `exclude` keywords (case-insensitive substring match).
pub fn roles_match<T, K>(tags: &[T], include: &[K], exclude: &[K]) -> bool
where
    T: AsRef<str>,
    K: AsRef<str>,
{
    tags.iter().any(|tag| {
        let tag = tag.as_ref().to_lowercase();
        let contains = |keyword: &K| tag.contains(&keyword.as_ref().to_lowercase());
        include.iter().any(contains) && !exclude.iter().any(contains)
    })
}
