//! Unix `ls -al` listing parser.
//!
//! Accepts rows such as:
//! ```text
//! drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
//! -rw-r--r--   1 user group  1234 Jan  1  2025 file name.txt
//! lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
//! ```
//! A batch is all-or-nothing: one row outside the grammar fails the whole
//! listing.

use crate::error::{XferError, XferResult};
use crate::types::{Entity, EntityType, Permission, Permissions};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNIX_ROW: Regex = Regex::new(
        r"(?x)
        ^([dplcbs-])                         # type
        ([rwxstST-]{3})                      # owner
        ([rwxstST-]{3})                      # group
        ([rwxstST-]{3})                      # other
        \S*\s+                               # ACL / xattr marker
        (\d+)\s+                             # link count
        (\S+)\s+                             # owner
        (\S+)\s+                             # group
        (\d+)\s+                             # size
        (\S+\s+\d+\s+(?:\d{2}:\d{2}|\d{4}))  # month day time-or-year
        \s+(.+)$                             # name, verbatim
        "
    )
    .expect("listing grammar");
    static ref TOTAL_ROW: Regex = Regex::new(r"^total\s+\d+\s*$").expect("total grammar");
}

/// Parse a full listing body. CRLF and LF line endings may be mixed.
pub fn parse_listing(raw: &str) -> XferResult<Vec<Entity>> {
    let mut entities = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() || TOTAL_ROW.is_match(line) {
            continue;
        }
        entities.push(parse_line(line)?);
    }
    log::debug!("parsed {} listing entries", entities.len());
    Ok(entities)
}

/// Parse one listing row.
pub fn parse_line(line: &str) -> XferResult<Entity> {
    let caps = UNIX_ROW
        .captures(line)
        .ok_or_else(|| XferError::parse(format!("unrecognised listing row: '{}'", line)))?;

    let type_char = caps[1].chars().next().unwrap_or('?');
    let permissions = parse_permissions(type_char, &caps[2], &caps[3], &caps[4])?;

    let links = caps[5]
        .parse::<u32>()
        .map_err(|e| XferError::parse(format!("link count '{}': {}", &caps[5], e)))?;
    let size = caps[8]
        .parse::<u64>()
        .map_err(|e| XferError::parse(format!("size '{}': {}", &caps[8], e)))?;

    Ok(Entity {
        permissions,
        links,
        owner: caps[6].to_string(),
        group: caps[7].to_string(),
        size,
        last_modified: caps[9].to_string(),
        name: caps[10].to_string(),
    })
}

/// Decode the ten-character mode column.
///
/// Special bits: `s`/`S` in the owner execute slot is setuid, `s`/`G` in the
/// group slot is setgid, `t`/`T` in the other slot is sticky. Lower-case `s`
/// and `t` also grant execute.
pub fn parse_permissions(
    type_char: char,
    owner: &str,
    group: &str,
    other: &str,
) -> XferResult<Permissions> {
    let entity_type = EntityType::from_char(type_char)
        .ok_or_else(|| XferError::parse(format!("unknown file type '{}'", type_char)))?;
    let (o, g, u) = (triplet(owner)?, triplet(group)?, triplet(other)?);

    Ok(Permissions {
        entity_type,
        sticky: matches!(u[2], 't' | 'T'),
        setuid: matches!(o[2], 's' | 'S'),
        setgid: matches!(g[2], 's' | 'G'),
        owner: principal(o),
        group: principal(g),
        other: principal(u),
    })
}

fn triplet(s: &str) -> XferResult<[char; 3]> {
    let mut it = s.chars();
    match (it.next(), it.next(), it.next(), it.next()) {
        (Some(a), Some(b), Some(c), None) => Ok([a, b, c]),
        _ => Err(XferError::parse(format!("permission triplet '{}'", s))),
    }
}

fn principal(t: [char; 3]) -> Permission {
    Permission {
        read: t[0] == 'r',
        write: t[1] == 'w',
        execute: matches!(t[2], 'x' | 's' | 't'),
    }
}
