// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Function selectors and the canonical form of function signatures.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The first 4 bytes of the Keccak-256 hash of a canonical function signature,
/// which is what the diamond uses to route a call to a facet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Hash a signature that is already in canonical form, e.g. `addPlayer(address)`.
    pub fn from_canonical(signature: &str) -> Self {
        Self(ethers_core::utils::id(signature))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Selector {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl From<Selector> for [u8; 4] {
    fn from(value: Selector) -> Self {
        value.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| Error::InvalidSelector(s.to_owned()))?;
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| Error::InvalidSelector(s.to_owned()))?;
        Ok(Self(bytes))
    }
}

/// Normalize a human readable declaration and hash it into its selector.
///
/// Accepts anything from `addPlayer(address)` to
/// `function addPlayer(address playerAddress) external returns (bool ok)`.
pub fn selector_from_signature(signature: &str) -> Result<Selector, Error> {
    let canonical = canonical_signature(signature)?;
    Ok(Selector::from_canonical(&canonical))
}

/// Reduce a function declaration to `name(type1,type2,...)`.
///
/// Parameter names, data locations, `indexed`, modifiers and the `returns` clause
/// are dropped; `uint`, `int` and `byte` are widened to their canonical aliases.
/// Anything after the closing parenthesis of the parameter list is ignored.
pub fn canonical_signature(signature: &str) -> Result<String, Error> {
    let invalid = |reason: String| Error::invalid_signature(signature, reason);

    let decl = signature.trim();
    let decl = strip_keyword(decl, "function").unwrap_or(decl);

    let open = decl
        .find('(')
        .ok_or_else(|| invalid("missing parameter list".into()))?;

    let name = decl[..open].trim();
    if !is_identifier(name) {
        return Err(invalid(format!("invalid function name {name:?}")));
    }

    let close = matching_paren(decl, open).ok_or_else(|| invalid("unbalanced parentheses".into()))?;

    let types = param_types(&decl[open + 1..close]).map_err(invalid)?;

    Ok(format!("{name}({})", types.join(",")))
}

/// Strip a leading keyword if it is followed by whitespace.
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(keyword)?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Index of the parenthesis closing the one at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Canonical types of a comma separated parameter list, without the enclosing parentheses.
fn param_types(params: &str) -> Result<Vec<String>, String> {
    if params.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut types = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in params.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or("unbalanced parentheses")?,
            ',' if depth == 0 => {
                types.push(param_type(&params[start..i])?);
                start = i + 1;
            }
            _ => {}
        }
    }
    types.push(param_type(&params[start..])?);

    Ok(types)
}

fn param_type(param: &str) -> Result<String, String> {
    let param = param.trim();
    if param.is_empty() {
        return Err("empty parameter".into());
    }

    // `tuple(...)` is the ABI spelling of an anonymous struct.
    let decl = param
        .strip_prefix("tuple")
        .filter(|rest| rest.trim_start().starts_with('('))
        .map(str::trim_start)
        .unwrap_or(param);

    let (base, rest) = if decl.starts_with('(') {
        let close = matching_paren(decl, 0).ok_or("unbalanced parentheses")?;
        let inner = param_types(&decl[1..close])?;
        (format!("({})", inner.join(",")), &decl[close + 1..])
    } else {
        let end = decl
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(decl.len());
        (elementary_type(&decl[..end])?, &decl[end..])
    };

    let (suffix, rest) = array_suffix(rest)?;

    // What is left can be a data location, `indexed`, `payable` and the parameter name.
    let words = rest.split_whitespace().collect::<Vec<_>>();
    if words.len() > 2 || !words.iter().all(|w| is_identifier(w)) {
        return Err(format!("unexpected tokens in parameter {param:?}"));
    }

    Ok(format!("{base}{suffix}"))
}

fn array_suffix(rest: &str) -> Result<(String, &str), String> {
    let mut suffix = String::new();
    let mut rest = rest;

    while let Some(r) = rest.trim_start().strip_prefix('[') {
        let end = r.find(']').ok_or("unterminated array type")?;
        let len = r[..end].trim();
        if !len.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid array length {len:?}"));
        }
        suffix.push('[');
        suffix.push_str(len);
        suffix.push(']');
        rest = &r[end + 1..];
    }

    Ok((suffix, rest))
}

fn elementary_type(word: &str) -> Result<String, String> {
    let canonical = match word {
        "" => return Err("missing parameter type".into()),
        "uint" => "uint256",
        "int" => "int256",
        "byte" => "bytes1",
        "address" | "bool" | "string" | "bytes" | "function" => word,
        w if is_sized(w, "uint", 8, 256, 8)
            || is_sized(w, "int", 8, 256, 8)
            || is_sized(w, "bytes", 1, 32, 1) =>
        {
            w
        }
        other => return Err(format!("unsupported parameter type {other:?}")),
    };
    Ok(canonical.to_owned())
}

fn is_sized(word: &str, prefix: &str, min: u16, max: u16, step: u16) -> bool {
    let Some(digits) = word.strip_prefix(prefix) else {
        return false;
    };
    match digits.parse::<u16>() {
        Ok(n) => n.to_string() == digits && (min..=max).contains(&n) && n % step == 0,
        Err(_) => false,
    }
}
