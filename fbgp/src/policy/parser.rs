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

//! Parser for the RPSL-like text representation of filters.
//!
//! The parser does not implement operator precedence. The first `and` or `or` keyword splits the
//! expression into the part before and the part after, which are parsed recursively. Leaves
//! (expressions without any keyword) are classified in the following order:
//!
//! 1. empty: [`Filter::None`]
//! 2. contains `not`: [`Filter::Not`] of the remainder after `not`. The keyword may be directly
//!    followed by a group, as in `not{10.0.0.0/8}`.
//! 3. a single `<...>` group: [`Filter::AsPathRegex`]
//! 4. contains a `{...}` group: [`Filter::PrefixRangeSet`]
//! 5. `any`: [`Filter::Any`]
//! 6. contains `as`: [`Filter::ExactAsPath`] with the embedded AS number (`peeras` is not
//!    supported)
//! 7. anything else is a syntax error.

use crate::policy::{AsPathRegex, Filter, PolicyParseError, PrefixRange};
use crate::rib::AsId;
use itertools::Itertools;

impl Filter {
    /// Parse a filter from its text representation. The text is case-insensitive.
    ///
    /// ```
    /// # use fbgp::policy::Filter;
    /// let filter = Filter::parse("{1.0.0.0/20^+} OR AS234").unwrap();
    /// assert!(matches!(filter, Filter::Or(_, _)));
    /// ```
    pub fn parse(s: &str) -> Result<Self, PolicyParseError> {
        let s = s.trim().to_lowercase();
        let tokens = tokenize(&s);
        parse_tokens(&tokens)
    }
}

/// Split the text at whitespace. Groups enclosed in `<...>` or `{...}` are kept as a single
/// token, including the whitespace inside.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth: usize = 0;
    let mut start: Option<usize> = None;

    for (i, c) in s.char_indices() {
        match c {
            '<' | '{' => depth += 1,
            '>' | '}' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(st) = start.take() {
                    tokens.push(&s[st..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        tokens.push(&s[st..]);
    }
    tokens
}

fn parse_tokens(tokens: &[&str]) -> Result<Filter, PolicyParseError> {
    if let Some(pos) = tokens.iter().position(|t| *t == "or" || *t == "and") {
        let first = Box::new(parse_tokens(&tokens[..pos])?);
        let second = Box::new(parse_tokens(&tokens[pos + 1..])?);
        return Ok(if tokens[pos] == "and" {
            Filter::And(first, second)
        } else {
            Filter::Or(first, second)
        });
    }
    parse_leaf(tokens)
}

fn parse_leaf(tokens: &[&str]) -> Result<Filter, PolicyParseError> {
    let text = tokens.iter().join(" ");

    if tokens.is_empty() {
        return Ok(Filter::None);
    }

    if let Some(pos) = tokens.iter().position(|t| negated(t).is_some()) {
        let mut rest: Vec<&str> = negated(tokens[pos]).into_iter().filter(|t| !t.is_empty()).collect();
        rest.extend_from_slice(&tokens[pos + 1..]);
        return Ok(Filter::Not(Box::new(parse_tokens(&rest)?)));
    }

    if let [token] = tokens {
        if token.len() >= 2 && token.starts_with('<') && token.ends_with('>') {
            return Ok(Filter::AsPathRegex(AsPathRegex::parse(token)?));
        }
    }

    if let Some(group) = tokens.iter().find(|t| t.contains('{')) {
        let inner = group
            .find('{')
            .and_then(|start| group[start + 1..].find('}').map(|end| &group[start + 1..start + 1 + end]))
            .ok_or_else(|| PolicyParseError::Syntax(text.clone()))?;
        let ranges = inner
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(PrefixRange::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if ranges.is_empty() {
            return Err(PolicyParseError::Syntax(text));
        }
        return Ok(Filter::PrefixRangeSet(ranges));
    }

    if text == "any" {
        return Ok(Filter::Any);
    }

    if text.contains("as") {
        if text == "peeras" {
            return Err(PolicyParseError::Unsupported(text));
        }
        let digits: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return match digits.parse::<u32>() {
            Ok(asn) => Ok(Filter::ExactAsPath(vec![AsId(asn)])),
            Err(_) if digits.is_empty() => Err(PolicyParseError::Syntax(text)),
            Err(_) => Err(PolicyParseError::InvalidNumber(text)),
        };
    }

    Err(PolicyParseError::Syntax(text))
}

/// If the token is `not`, or `not` directly followed by a `<...>` or `{...}` group, return the
/// remainder after `not`.
fn negated(token: &str) -> Option<&str> {
    let rest = token.strip_prefix("not")?;
    if rest.is_empty() || rest.starts_with('<') || rest.starts_with('{') {
        Some(rest)
    } else {
        None
    }
}
