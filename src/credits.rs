//! Contributor real-name resolution.
//!
//! Credits on a release name artists the way they were billed: aliases,
//! groups, project names. For composer fields we want the people behind them,
//! so every credited artist is looked up in the catalog and expanded:
//!
//! * groups expand to their members (recursively)
//! * aliases with a registered real name resolve to that name, tidied up
//! * everything else keeps its catalog name
//!
//! Resolved names are kept in a [`NameCache`] owned by the caller for the
//! duration of one run.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use crate::catalog::ArtistLookup;
use crate::error::{Error, Result};
use crate::exceptions::NameExceptions;
use crate::names::fix_catalog_string;

/// Catalog placeholder artist for compilations.
const VARIOUS_ARTISTS: &str = "Various";

/// Lowercase particles kept between first and last name ("Armand van Helden").
const SURNAME_PREFIXES: &[&str] = &["dal", "de", "der", "des", "dos", "du", "le", "van"];

/// Generational suffixes that stay attached to the surname.
const GENERATIONAL_SUFFIXES: &[&str] = &["Jr.", "Jr", "Sr.", "Sr", "II", "III", "IV", "V"];

/// Contributor id → resolved real names, shared by concurrent resolutions.
///
/// Created per run and dropped with it; entries are never invalidated.
#[derive(Debug, Default)]
pub struct NameCache {
    names: Mutex<HashMap<u64, Vec<String>>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<Vec<String>> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Later inserts for the same id replace earlier ones; both carry the
    /// same catalog data so the race is harmless.
    pub fn insert(&self, id: u64, names: Vec<String>) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, names);
    }

    pub fn len(&self) -> usize {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CreditResolver<'a, L: ArtistLookup + ?Sized> {
    lookup: &'a L,
    cache: &'a NameCache,
    exceptions: &'a NameExceptions,
}

impl<'a, L: ArtistLookup + ?Sized> CreditResolver<'a, L> {
    pub fn new(lookup: &'a L, cache: &'a NameCache, exceptions: &'a NameExceptions) -> Self {
        CreditResolver {
            lookup,
            cache,
            exceptions,
        }
    }

    /// Real names behind one credited contributor, in catalog order without
    /// duplicates. `id` 0 marks a name with no catalog page; it is only
    /// cleaned up, never looked up.
    pub fn resolve(&self, id: u64, name: &str) -> Result<Vec<String>> {
        let mut path = HashSet::new();
        let resolved = self.resolve_on_path(id, name, &mut path)?;
        Ok(resolved.names)
    }

    /// `path` holds the groups currently being expanded above `id`. A member
    /// already on it closes a cycle and is skipped; everything resolved
    /// around that cut depends on where the cycle was entered, so it is not
    /// cached.
    fn resolve_on_path(&self, id: u64, name: &str, path: &mut HashSet<u64>) -> Result<Resolved> {
        if id == 0 {
            return Ok(Resolved::complete(vec![fix_catalog_string(name)]));
        }
        if let Some(names) = self.cache.get(id) {
            return Ok(Resolved::complete(names));
        }
        if path.contains(&id) {
            warn!("Membership cycle at artist {} ({}), skipping", id, name);
            return Ok(Resolved {
                names: Vec::new(),
                cut: true,
            });
        }

        debug!("Looking up artist {} ({})", id, name);
        let artist = self.lookup.artist(id).map_err(|e| Error::UnresolvedContributor {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let mut cut = false;
        let names = if artist.name == VARIOUS_ARTISTS {
            Vec::new()
        } else if !artist.members.is_empty() {
            path.insert(id);
            let mut names = Vec::new();
            let mut members = Ok(());
            for member in &artist.members {
                match self.resolve_on_path(member.id, &member.name, path) {
                    Ok(resolved) => {
                        cut |= resolved.cut;
                        for name in resolved.names {
                            push_unique(&mut names, name);
                        }
                    }
                    Err(e) => {
                        members = Err(e);
                        break;
                    }
                }
            }
            path.remove(&id);
            members?;
            names
        } else if let Some(realname) = artist.realname.as_deref().filter(|r| !r.trim().is_empty()) {
            let mut names = Vec::new();
            for part in realname.split(" & ").flat_map(|p| p.split(", ")) {
                let part = part.trim();
                if !part.is_empty() {
                    push_unique(&mut names, fix_real_name(part, self.exceptions));
                }
            }
            names
        } else {
            vec![fix_catalog_string(&artist.name)]
        };

        if !cut {
            self.cache.insert(id, names.clone());
        }
        Ok(Resolved { names, cut })
    }

    /// Resolve several contributors at once.
    ///
    /// Each distinct contributor is resolved on its own scoped thread; the
    /// results are merged in input order once every thread has finished.
    pub fn resolve_all(&self, contributors: &[(u64, &str)]) -> Result<Vec<String>> {
        let mut unique: Vec<(u64, &str)> = Vec::new();
        for &(id, name) in contributors {
            let seen = unique
                .iter()
                .any(|&(other_id, other_name)| other_id == id && (id != 0 || other_name == name));
            if !seen {
                unique.push((id, name));
            }
        }

        let results: Vec<Result<Vec<String>>> = if unique.len() <= 1 {
            unique.iter().map(|&(id, name)| self.resolve(id, name)).collect()
        } else {
            thread::scope(|scope| {
                let handles: Vec<_> = unique
                    .iter()
                    .map(|&(id, name)| (name, scope.spawn(move || self.resolve(id, name))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(name, handle)| {
                        handle.join().unwrap_or_else(|_| {
                            Err(Error::UnresolvedContributor {
                                name: name.to_string(),
                                reason: "resolver thread panicked".to_string(),
                            })
                        })
                    })
                    .collect()
            })
        };

        let mut names = Vec::new();
        for result in results {
            for name in result? {
                push_unique(&mut names, name);
            }
        }
        Ok(names)
    }
}

struct Resolved {
    names: Vec<String>,
    /// A membership cycle was cut somewhere below.
    cut: bool,
}

impl Resolved {
    fn complete(names: Vec<String>) -> Self {
        Resolved { names, cut: false }
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Tidy a registered real name.
///
/// An entry in `exceptions` wins outright. Otherwise any trailing
/// parenthetical is dropped and multi-word names are reduced to
/// first + surname particles + last, e.g.
/// `"Norman Quentin Cook (born Quentin Leo Cook)"` → `"Norman Cook"`.
pub fn fix_real_name(name: &str, exceptions: &NameExceptions) -> String {
    if let Some(replacement) = exceptions.get(name) {
        return replacement.to_string();
    }

    let base = match name.find(" (") {
        Some(idx) => &name[..idx],
        None => name,
    };
    let tokens: Vec<&str> = base.split(' ').filter(|t| !t.is_empty()).collect();

    let Some((first, rest)) = tokens.split_first() else {
        return String::new();
    };
    let Some((last, middle)) = rest.split_last() else {
        return first.to_string();
    };

    let mut middle = middle.to_vec();
    let mut last = capitalize(last);
    // "Sammy Davis Jr. III": keep pulling the preceding word in while the
    // current last word is a suffix.
    while last
        .split(' ')
        .next()
        .is_some_and(|word| GENERATIONAL_SUFFIXES.contains(&word))
    {
        let Some(surname) = middle.pop() else {
            break;
        };
        last = format!("{} {}", capitalize(surname), last);
    }

    let mut parts = vec![capitalize(first)];
    parts.extend(
        middle
            .into_iter()
            .filter(|t| SURNAME_PREFIXES.contains(&t.to_lowercase().as_str()))
            .map(str::to_string),
    );
    parts.push(last);
    parts.join(" ")
}

/// Uppercase the first character only; `str::to_uppercase` on the whole word
/// would mangle "Faveris-Essadi" style names.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Artist, Member};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeLookup {
        artists: HashMap<u64, Artist>,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn with(mut self, artist: Artist) -> Self {
            self.artists.insert(artist.id, artist);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArtistLookup for FakeLookup {
        fn artist(&self, id: u64) -> Result<Artist> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.artists.get(&id).cloned().ok_or(Error::CatalogStatus {
                url: format!("/artists/{}", id),
                status: 404,
            })
        }
    }

    fn artist(id: u64, name: &str) -> Artist {
        Artist {
            id,
            name: name.to_string(),
            ..Artist::default()
        }
    }

    fn alias(id: u64, name: &str, realname: &str) -> Artist {
        Artist {
            realname: Some(realname.to_string()),
            ..artist(id, name)
        }
    }

    fn group(id: u64, name: &str, members: &[(u64, &str)]) -> Artist {
        Artist {
            members: members
                .iter()
                .map(|&(id, name)| Member {
                    id,
                    name: name.to_string(),
                    active: true,
                })
                .collect(),
            ..artist(id, name)
        }
    }

    #[test]
    fn test_fix_real_name() {
        let none = NameExceptions::new();
        assert_eq!(fix_real_name("Norman Quentin Cook (born Quentin Leo Cook)", &none), "Norman Cook");
        assert_eq!(fix_real_name("armand van helden", &none), "Armand van Helden");
        assert_eq!(fix_real_name("Harry Connick Jr.", &none), "Harry Connick Jr.");
        assert_eq!(fix_real_name("Mehdi Faveris-Essadi", &none), "Mehdi Faveris-Essadi");
        assert_eq!(fix_real_name("Madonna", &none), "Madonna");
        assert_eq!(fix_real_name("Jr.", &none), "Jr.");
    }

    #[test]
    fn test_fix_real_name_stacked_suffixes() {
        let none = NameExceptions::new();
        assert_eq!(fix_real_name("Sammy Davis Jr. III", &none), "Sammy Davis Jr. III");
        assert_eq!(fix_real_name("John Paul Smith Sr. II", &none), "John Smith Sr. II");
        assert_eq!(fix_real_name("Jr. III", &none), "Jr. III");
    }

    #[test]
    fn test_fix_real_name_exception_wins() {
        let mut exceptions = NameExceptions::new();
        exceptions.insert("Guillaume Emmanuel de Homem-Christo", "Guy-Manuel de Homem-Christo");
        assert_eq!(
            fix_real_name("Guillaume Emmanuel de Homem-Christo", &exceptions),
            "Guy-Manuel de Homem-Christo"
        );
    }

    #[test]
    fn test_alias_resolves_to_real_names() {
        let lookup = FakeLookup::default().with(alias(10, "Fatboy Slim", "Norman Quentin Cook & john smith"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(resolver.resolve(10, "Fatboy Slim").unwrap(), vec!["Norman Cook", "John Smith"]);
    }

    #[test]
    fn test_plain_artist_keeps_cleaned_name() {
        let lookup = FakeLookup::default().with(artist(11, "Titan (15)"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(resolver.resolve(11, "Titan (15)").unwrap(), vec!["Titan"]);
    }

    #[test]
    fn test_various_resolves_to_nothing() {
        let lookup = FakeLookup::default().with(artist(194, "Various"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert!(resolver.resolve(194, "Various").unwrap().is_empty());
    }

    #[test]
    fn test_group_expands_members() {
        let lookup = FakeLookup::default()
            .with(group(1, "Daft Punk", &[(2, "Thomas Bangalter"), (3, "Guy-Manuel de Homem-Christo")]))
            .with(alias(2, "Thomas Bangalter", "Thomas Bangalter"))
            .with(alias(3, "Guy-Manuel de Homem-Christo", "Guillaume Emmanuel de Homem-Christo"));
        let cache = NameCache::new();
        let mut exceptions = NameExceptions::new();
        exceptions.insert("Guillaume Emmanuel de Homem-Christo", "Guy-Manuel de Homem-Christo");
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(
            resolver.resolve(1, "Daft Punk").unwrap(),
            vec!["Thomas Bangalter", "Guy-Manuel de Homem-Christo"]
        );
        // Members were cached too
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_membership_cycle_terminates() {
        let lookup = FakeLookup::default()
            .with(group(1, "Loop A", &[(2, "Loop B"), (3, "Solo")]))
            .with(group(2, "Loop B", &[(1, "Loop A")]))
            .with(artist(3, "Solo"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(resolver.resolve(1, "Loop A").unwrap(), vec!["Solo"]);
    }

    #[test]
    fn test_cycle_members_resolve_the_same_after_an_earlier_cut() {
        let lookup = FakeLookup::default()
            .with(group(1, "Loop A", &[(2, "Loop B"), (3, "Solo")]))
            .with(group(2, "Loop B", &[(1, "Loop A"), (4, "Twin")]))
            .with(artist(3, "Solo"))
            .with(artist(4, "Twin"));
        let exceptions = NameExceptions::new();

        let fresh_cache = NameCache::new();
        let fresh = CreditResolver::new(&lookup, &fresh_cache, &exceptions)
            .resolve(2, "Loop B")
            .unwrap();
        assert_eq!(fresh, vec!["Solo", "Twin"]);

        let cache = NameCache::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);
        assert_eq!(resolver.resolve(1, "Loop A").unwrap(), vec!["Twin", "Solo"]);
        // Only the leaves are complete on their own
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(resolver.resolve(2, "Loop B").unwrap(), fresh);
    }

    #[test]
    fn test_shared_member_is_not_mistaken_for_a_cycle() {
        let lookup = FakeLookup::default()
            .with(group(1, "Supergroup", &[(2, "Band One"), (3, "Band Two")]))
            .with(group(2, "Band One", &[(4, "Drummer")]))
            .with(group(3, "Band Two", &[(4, "Drummer"), (5, "Singer")]))
            .with(artist(4, "Drummer"))
            .with(artist(5, "Singer"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(resolver.resolve(1, "Supergroup").unwrap(), vec!["Drummer", "Singer"]);
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_cache_avoids_second_lookup() {
        let lookup = FakeLookup::default().with(alias(10, "Fatboy Slim", "Norman Cook"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        let first = resolver.resolve(10, "Fatboy Slim").unwrap();
        let second = resolver.resolve(10, "Fatboy Slim").unwrap();
        assert_eq!(first, second);
        assert_eq!(lookup.calls(), 1);
    }

    #[test]
    fn test_unlinked_credit_is_not_looked_up() {
        let lookup = FakeLookup::default();
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert_eq!(resolver.resolve(0, "Someone, The").unwrap(), vec!["The Someone"]);
        assert_eq!(lookup.calls(), 0);
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let lookup = FakeLookup::default();
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        match resolver.resolve(99, "Ghost") {
            Err(Error::UnresolvedContributor { name, .. }) => assert_eq!(name, "Ghost"),
            other => panic!("expected UnresolvedContributor, got {:?}", other),
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolve_all_merges_in_input_order() {
        let lookup = FakeLookup::default()
            .with(alias(10, "Fatboy Slim", "Norman Cook"))
            .with(alias(20, "Pizzaman", "Norman Cook"))
            .with(artist(30, "Zed"))
            .with(artist(40, "Abe"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        let names = resolver
            .resolve_all(&[(30, "Zed"), (10, "Fatboy Slim"), (40, "Abe"), (30, "Zed"), (20, "Pizzaman")])
            .unwrap();
        assert_eq!(names, vec!["Zed", "Norman Cook", "Abe"]);
        // One lookup per distinct contributor
        assert_eq!(lookup.calls(), 4);
    }

    #[test]
    fn test_resolve_all_fails_when_any_contributor_fails() {
        let lookup = FakeLookup::default().with(artist(30, "Zed"));
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(&lookup, &cache, &exceptions);

        assert!(resolver.resolve_all(&[(30, "Zed"), (31, "Missing")]).is_err());
        assert!(resolver.resolve_all(&[]).unwrap().is_empty());
    }
}
