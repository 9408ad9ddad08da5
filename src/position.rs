//! Catalog track positions.
//!
//! Discogs writes a track's place on a release in several shapes:
//!
//! * `"7"`    : plain track number on the current disc
//! * `"2-13"` : disc 2, track 13
//! * `"C2"`   : vinyl side letter plus track; sides pair up into discs
//!   (A/B → disc 1, C/D → disc 2, …)
//!
//! Credits restricted to part of a release use ranges such as
//! `"A1 to B3, C2"`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// A parsed track position. Both fields are always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    // Field order gives the derived `Ord` disc-major ordering.
    pub disc: u32,
    pub track: u32,
}

impl Position {
    pub fn new(track: u32, disc: u32) -> Self {
        Position { disc, track }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.disc, self.track)
    }
}

/// Parse a position token.
///
/// `assumed_disc` is used for plain numeric tokens; `prior_side_tracks` is
/// added to the track number of side-letter tokens so that side B continues
/// counting where side A stopped.
pub fn parse_position(token: &str, assumed_disc: u32, prior_side_tracks: u32) -> Result<Position> {
    let token = token.trim();
    let first = token
        .chars()
        .next()
        .ok_or_else(|| Error::malformed_position(token))?;

    if first.is_ascii_digit() {
        let (disc, track) = match token.split_once('-') {
            Some((disc, track)) => (parse_number(disc, token)?, parse_number(track, token)?),
            None => (assumed_disc, parse_number(token, token)?),
        };
        if disc == 0 {
            return Err(Error::malformed_position(token));
        }
        return Ok(Position::new(track, disc));
    }

    if !first.is_ascii_alphabetic() {
        return Err(Error::malformed_position(token));
    }

    let side = (first.to_ascii_uppercase() as u8 - b'A') as u32;
    let disc = side / 2 + 1;

    let rest = &token[first.len_utf8()..];
    let track = if rest.is_empty() {
        1
    } else {
        parse_number(rest, token)?
    };

    Ok(Position::new(track + prior_side_tracks, disc))
}

/// Strictly positive decimal number, digits only.
fn parse_number(digits: &str, token: &str) -> Result<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_position(token));
    }
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::malformed_position(token)),
    }
}

/// One end of a track range. Numeric ends are coerced to integers, anything
/// else (vinyl tokens) is kept verbatim and compared by parsed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeEnd {
    Number(u32),
    Token(String),
}

impl RangeEnd {
    fn from_token(token: &str) -> Self {
        let token = token.trim();
        match token.parse::<u32>() {
            Ok(n) => RangeEnd::Number(n),
            Err(_) => RangeEnd::Token(token.to_string()),
        }
    }

    pub fn as_token(&self) -> String {
        match self {
            RangeEnd::Number(n) => n.to_string(),
            RangeEnd::Token(t) => t.clone(),
        }
    }
}

impl From<u32> for RangeEnd {
    fn from(n: u32) -> Self {
        RangeEnd::Number(n)
    }
}

impl From<&str> for RangeEnd {
    fn from(token: &str) -> Self {
        RangeEnd::Token(token.to_string())
    }
}

/// Split `"first to last"` into its two ends. A single token is a range of
/// one: `"2"` → `(2, 2)`.
pub fn parse_range(token: &str) -> (RangeEnd, RangeEnd) {
    match token.split_once(" to ") {
        Some((first, last)) => (RangeEnd::from_token(first), RangeEnd::from_token(last)),
        None => {
            let single = RangeEnd::from_token(token);
            (single.clone(), single)
        }
    }
}

/// Order two position tokens by `(disc, track)` after parsing both with the
/// default disc and no side offset.
pub fn compare_positions(a: &str, b: &str) -> Result<Ordering> {
    let a = parse_position(a, 1, 0)?;
    let b = parse_position(b, 1, 0)?;
    Ok(a.cmp(&b))
}

/// Whether `position` falls inside any range of a credit restriction such as
/// `"1 to 4, 7"` or `"A1 to A3, B2"`.
pub fn position_in_ranges(restriction: &str, position: &str) -> Result<bool> {
    for range in restriction.split(", ").filter(|r| !r.trim().is_empty()) {
        let (first, last) = parse_range(range);
        if compare_positions(&first.as_token(), position)? != Ordering::Greater
            && compare_positions(&last.as_token(), position)? != Ordering::Less
        {
            return Ok(true);
        }
    }
    Ok(false)
}
