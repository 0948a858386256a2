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

use crate::{
    pkg::{PackageId, PackageRef},
    trans::Reason,
};

/// Narrow view of a package database, implemented by both the installed
/// database and the available (repository) database collaborators.
///
/// The transaction set treats the databases as consistent snapshots for the
/// duration of resolution; it never refreshes them.
pub trait PackageDatabase {
    fn contains(&self, id: &PackageId) -> bool;
    fn return_packages(&self, patterns: &[&str]) -> Vec<PackageRef>;
}

/// Per-package administrative metadata recorded at install time.
pub trait ReasonDatabase {
    fn reason(&self, pkg: &PackageRef) -> Option<Reason>;
}
