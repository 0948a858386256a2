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

use std::{
    env::var,
    time::{SystemTime, UNIX_EPOCH},
};

use lazy_static::lazy_static;

/* Package names permitted to retain multiple installed versions; updates to
 * these are demoted to plain installs. Callers may extend or replace the set. */
pub const INSTALLONLY_PKGS: &[&str] = &[
    "kernel",
    "kernel-PAE",
    "kernel-PAE-debug",
    "kernel-bigmem",
    "kernel-debug",
    "kernel-devel",
    "kernel-enterprise",
    "kernel-modules",
    "kernel-smp",
    "kernel-source",
    "kernel-unsupported",
];

const FERRITE_LOG_FILE: &str = "/var/log/ferrite/ferrite.log";

lazy_static! {
    pub static ref VERBOSE: bool = var("FERRITE_VERBOSE").is_ok_and(|v| v == "1");
    pub static ref TERM: String = env_opt("TERM");
    pub static ref LOG_LOCATION: String = env_default("FERRITE_LOG_FILE", FERRITE_LOG_FILE);
    pub static ref UNIX_TIMESTAMP: u64 = unix_epoch_time();
    pub static ref IS_COLOR_TERMINAL: bool = is_color_terminal();
    pub static ref BOLD: &'static str = ansi("\x1b[1m");
    pub static ref RESET: &'static str = ansi("\x1b[0m");
    pub static ref BOLD_RED: &'static str = ansi("\x1b[1;31m");
    pub static ref BOLD_YELLOW: &'static str = ansi("\x1b[1;33m");
}

fn env_opt(env: &str) -> String {
    var(env).unwrap_or_default()
}

fn env_default(env: &str, default: &str) -> String {
    var(env).unwrap_or_else(|_| default.into())
}

fn is_color_terminal() -> bool {
    !TERM.is_empty() && TERM.to_lowercase() != "dumb"
}

fn ansi(escape: &'static str) -> &'static str {
    if *IS_COLOR_TERMINAL {
        escape
    } else {
        ""
    }
}

fn unix_epoch_time() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("SystemTime before UNIX_EPOCH").as_secs()
}
