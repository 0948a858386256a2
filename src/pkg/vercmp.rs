/*
 * ferrite-core
 *
 * Copyright (C) 2023-2024 Xavier Moffett <sapphirus@azorium.net>
 * SPDX-License-Identifier: GPL-3.0-only
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;

/// Compares two version or release strings with rpm segment semantics.
///
/// Strings are walked as alternating runs of digits and letters, with every
/// other byte treated as a separator. Numeric segments compare by value,
/// alphabetic segments lexically, and a numeric segment always outranks an
/// alphabetic one. A tilde sorts before anything, including the end of the
/// string, so `1.0~rc1` precedes `1.0`.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    loop {
        while i < a.len() && !a[i].is_ascii_alphanumeric() && a[i] != b'~' {
            i += 1;
        }
        while j < b.len() && !b[j].is_ascii_alphanumeric() && b[j] != b'~' {
            j += 1;
        }

        match (a.get(i) == Some(&b'~'), b.get(j) == Some(&b'~')) {
            (true, true) => {
                i += 1;
                j += 1;
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => (),
        }

        if i == a.len() || j == b.len() {
            break;
        }

        let numeric = a[i].is_ascii_digit();
        let sa = take_segment(a, &mut i, numeric);
        let sb = take_segment(b, &mut j, numeric);

        if sb.is_empty() {
            /* Mismatched segment types: numeric wins over alphabetic. */
            return if numeric { Ordering::Greater } else { Ordering::Less };
        }

        let ordering = if numeric {
            let sa = trim_zeroes(sa);
            let sb = trim_zeroes(sb);

            sa.len().cmp(&sb.len()).then_with(|| sa.cmp(sb))
        } else {
            sa.cmp(sb)
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    /* One string ran out of segments: the longer one is the newer version. */
    (a.len() - i).cmp(&(b.len() - j))
}

fn take_segment<'a>(s: &'a [u8], pos: &mut usize, numeric: bool) -> &'a [u8] {
    let start = *pos;

    while *pos < s.len() && if numeric { s[*pos].is_ascii_digit() } else { s[*pos].is_ascii_alphabetic() } {
        *pos += 1;
    }

    &s[start .. *pos]
}

fn trim_zeroes(s: &[u8]) -> &[u8] {
    let zeroes = s.iter().take_while(|b| **b == b'0').count();

    &s[zeroes ..]
}
