// fBGP: Flow-based BGP Decision Core
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Filters (predicates over routes) used by policies.

use crate::policy::PolicyParseError;
use crate::rib::{AsId, Prefix, Route};
use ipnetwork::IpNetwork;
use itertools::Itertools;
use regex::Regex;
use std::fmt;

/// # Filter
/// Predicate tree over a route. Filters are stateless after construction. Use
/// [`Filter::parse`] to build a filter from the RPSL-like text representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every route
    Any,
    /// Matches no route
    None,
    /// Matches if both filters match
    And(Box<Filter>, Box<Filter>),
    /// Matches if the first or the second filter matches. The second one is only evaluated if
    /// the first one does not match.
    Or(Box<Filter>, Box<Filter>),
    /// Negation of a filter
    Not(Box<Filter>),
    /// Matches if the AS-PATH is exactly the given list
    ExactAsPath(Vec<AsId>),
    /// Matches if the AS-PATH matches the regular expression
    AsPathRegex(AsPathRegex),
    /// Matches if the prefix falls within any of the ranges
    PrefixRangeSet(Vec<PrefixRange>),
}

impl Filter {
    /// Returns true if the route matches the filter
    pub fn matches(&self, route: &Route) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::And(a, b) => a.matches(route) && b.matches(route),
            Self::Or(a, b) => a.matches(route) || b.matches(route),
            Self::Not(f) => !f.matches(route),
            Self::ExactAsPath(path) => &route.as_path == path,
            Self::AsPathRegex(regex) => regex.matches(&route.as_path),
            Self::PrefixRangeSet(ranges) => ranges.iter().any(|r| r.contains(route.prefix)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::None => f.write_str("NONE"),
            Self::And(a, b) => write!(f, "({} AND {})", a, b),
            Self::Or(a, b) => write!(f, "({} OR {})", a, b),
            Self::Not(x) => write!(f, "NOT {}", x),
            Self::ExactAsPath(path) => write!(f, "AS-PATH == [{}]", path.iter().join(" ")),
            Self::AsPathRegex(regex) => write!(f, "{}", regex),
            Self::PrefixRangeSet(ranges) => write!(f, "{{{}}}", ranges.iter().join(", ")),
        }
    }
}

/// # Prefix Range
/// A base network together with an inclusive range of prefix lengths. A prefix is contained in
/// the range, if it is a subnet of the base network, and its length lies within the range.
///
/// The text representation is `addr/len^op`, with the following operators:
///
/// | operator | lengths            |
/// |----------|--------------------|
/// | (none)   | `len`              |
/// | `^-`     | `len + 1 ..= max`  |
/// | `^+`     | `len ..= max`      |
/// | `^k`     | `k ..= max`        |
/// | `^k-j`   | `k ..= j`          |
///
/// ```
/// # use fbgp::policy::PrefixRange;
/// let range = PrefixRange::parse("10.0.0.0/16^+").unwrap();
/// assert!(range.contains("10.0.1.0/24".parse().unwrap()));
/// assert!(!range.contains("10.1.0.0/16".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefixRange {
    base: Prefix,
    min_len: u8,
    max_len: u8,
}

impl PrefixRange {
    /// Create a new prefix range. Host bits of the base network are cleared.
    pub fn new(base: Prefix, min_len: u8, max_len: u8) -> Self {
        let base = IpNetwork::new(base.network(), base.prefix()).unwrap_or(base);
        Self { base, min_len, max_len }
    }

    /// Parse a prefix range from its text representation, e.g. `10.0.0.0/16^+`.
    pub fn parse(s: &str) -> Result<Self, PolicyParseError> {
        let s = s.trim();
        let (base, op) = match s.find('^') {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };
        let base: Prefix =
            base.trim().parse().map_err(|_| PolicyParseError::InvalidPrefix(s.to_string()))?;
        let len = base.prefix();
        let max = max_prefix_len(&base);
        let parse_len = |x: &str| -> Result<u8, PolicyParseError> {
            match x.trim().parse::<u8>() {
                Ok(l) if l <= max => Ok(l),
                _ => Err(PolicyParseError::InvalidNumber(s.to_string())),
            }
        };

        let (min_len, max_len) = match op.map(str::trim) {
            None => (len, len),
            Some("-") => (len.saturating_add(1), max),
            Some("+") => (len, max),
            Some(op) => match op.find('-') {
                Some(pos) => (parse_len(&op[..pos])?, parse_len(&op[pos + 1..])?),
                None => (parse_len(op)?, max),
            },
        };

        Ok(Self::new(base, min_len, max_len))
    }

    /// Returns the base network
    pub fn base(&self) -> Prefix {
        self.base
    }

    /// Returns the inclusive range of accepted prefix lengths.
    pub fn lengths(&self) -> (u8, u8) {
        (self.min_len, self.max_len)
    }

    /// Returns true if the prefix is a subnet of the base network, and its length is within the
    /// range.
    pub fn contains(&self, prefix: Prefix) -> bool {
        let len = prefix.prefix();
        self.base.is_ipv4() == prefix.is_ipv4()
            && len >= self.base.prefix()
            && len >= self.min_len
            && len <= self.max_len
            && self.base.contains(prefix.network())
    }
}

impl fmt::Display for PrefixRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.base.prefix();
        let max = max_prefix_len(&self.base);
        match (self.min_len, self.max_len) {
            (a, b) if a == len && b == len => write!(f, "{}", self.base),
            (a, b) if a == len && b == max => write!(f, "{}^+", self.base),
            (a, b) if a == len + 1 && b == max => write!(f, "{}^-", self.base),
            (a, b) if b == max => write!(f, "{}^{}", self.base, a),
            (a, b) => write!(f, "{}^{}-{}", self.base, a, b),
        }
    }
}

fn max_prefix_len(prefix: &Prefix) -> u8 {
    if prefix.is_ipv4() {
        32
    } else {
        128
    }
}

/// # AS-PATH regular expression
///
/// Regular expression over AS numbers, e.g. `<^AS1 .* AS2$>`. Each whitespace separated element
/// is either an AS number (with or without the `AS` prefix) or `.`, which matches any single AS.
/// An element may be followed by one of the repetition operators `*`, `?`, `+` or `{n,m}`. The
/// operator applies to the AS together with its separating whitespace.
///
/// The expression is matched against the AS-PATH written as a string, where every AS is followed
/// by a single space. Bracketed alternations like `[2 3]{2}` are not supported.
///
/// ```
/// # use fbgp::policy::AsPathRegex;
/// # use fbgp::rib::AsId;
/// let regex = AsPathRegex::parse("<^AS1 .* AS2$>").unwrap();
/// assert!(regex.matches(&[AsId(1), AsId(5), AsId(7), AsId(2)]));
/// assert!(regex.matches(&[AsId(1), AsId(2)]));
/// assert!(!regex.matches(&[AsId(11), AsId(2)]));
/// ```
#[derive(Debug, Clone)]
pub struct AsPathRegex {
    source: String,
    regex: Regex,
}

impl AsPathRegex {
    /// Parse and translate an AS-PATH regex. The surrounding `<` and `>` are optional.
    pub fn parse(s: &str) -> Result<Self, PolicyParseError> {
        let source = s.trim().to_string();
        let body = source.trim_start_matches('<').trim_end_matches('>').trim().to_lowercase();

        if body.contains('[') || body.contains(']') {
            return Err(PolicyParseError::UnsupportedAlternation(source));
        }

        let (anchor_start, body) = match body.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, body.as_str()),
        };
        let (anchor_end, body) = match body.strip_suffix('$') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let mut pattern = String::from(if anchor_start { "^" } else { r"(?:^|\s)" });
        for token in body.split_whitespace() {
            let (atom, op) = split_repetition(token)
                .ok_or_else(|| PolicyParseError::Syntax(token.to_string()))?;
            let atom = match atom.trim_start_matches("as") {
                "." => r"\d+".to_string(),
                n if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => n.to_string(),
                _ => return Err(PolicyParseError::Syntax(token.to_string())),
            };
            pattern.push_str(&format!(r"(?:{}\s){}", atom, op));
        }
        if anchor_end {
            pattern.push('$');
        }

        let regex = Regex::new(&pattern).map_err(|_| PolicyParseError::InvalidRegex(source.clone()))?;
        Ok(Self { source, regex })
    }

    /// Returns the translated regular expression
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the AS-PATH matches the expression
    pub fn matches(&self, as_path: &[AsId]) -> bool {
        let path: String = as_path.iter().map(|a| format!("{} ", a)).collect();
        self.regex.is_match(&path)
    }
}

impl PartialEq for AsPathRegex {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

impl fmt::Display for AsPathRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split a trailing repetition operator (`*`, `?`, `+` or `{n,m}`) off a token.
fn split_repetition(token: &str) -> Option<(&str, &str)> {
    if let Some(pos) = token.find('{') {
        let op = &token[pos..];
        let inner = op.strip_prefix('{')?.strip_suffix('}')?;
        let valid = !inner.is_empty()
            && inner.split(',').count() <= 2
            && inner.split(',').enumerate().all(|(i, n)| {
                n.chars().all(|c| c.is_ascii_digit()) && (i > 0 || !n.is_empty())
            });
        return if valid { Some((&token[..pos], op)) } else { None };
    }
    match token.chars().last() {
        Some('*') | Some('?') | Some('+') if token.len() > 1 => {
            Some((&token[..token.len() - 1], &token[token.len() - 1..]))
        }
        _ => Some((token, "")),
    }
}
