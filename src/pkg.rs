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
    cell::Cell,
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use crate::trans::OutputState;

use self::vercmp::vercmp;

pub mod vercmp;

/// Canonical identity of a package version: (name, arch, epoch, version, release).
///
/// Identities are immutable; two of them are equal iff all five fields are equal.
/// The ordering is name, then arch, then numeric epoch, with version and release
/// compared through [`vercmp`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageId {
    name: String,
    arch: String,
    epoch: u32,
    version: String,
    release: String,
}

impl PackageId {
    pub fn new(name: &str, arch: &str, epoch: u32, version: &str, release: &str) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
            epoch,
            version: version.into(),
            release: release.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn evr(&self) -> String {
        match self.epoch {
            0 => format!("{}-{}", self.version, self.release),
            epoch => format!("{}:{}-{}", epoch, self.version, self.release),
        }
    }
}

impl Display for PackageId {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}-{}.{}", self.name, self.evr(), self.arch)
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.arch.cmp(&other.arch))
            .then_with(|| self.epoch.cmp(&other.epoch))
            .then_with(|| segment(&self.version, &other.version))
            .then_with(|| segment(&self.release, &other.release))
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/* vercmp considers distinct strings such as "1.0" and "1.00" equal; fall back
 * to a lexical comparison so the ordering remains total and agrees with Eq. */
fn segment(a: &str, b: &str) -> Ordering {
    match vercmp(a, b) {
        Ordering::Equal => a.cmp(b),
        ordering => ordering,
    }
}

#[derive(Clone, Debug)]
struct PackageData {
    id: PackageId,
    repo: String,
    from_system: bool,
    provides: Vec<String>,
    state: Cell<Option<OutputState>>,
}

/// Opaque, cheaply clonable handle to a package known to either database.
///
/// Everything except the `state` annotation is read-only; the transaction set
/// stamps `state` when the package enters the set and clears it on removal.
#[derive(Clone, Debug)]
pub struct PackageRef(Rc<PackageData>);

impl PackageRef {
    pub fn new(id: PackageId, repo: &str) -> Self {
        Self(Rc::new(PackageData {
            id,
            repo: repo.into(),
            from_system: false,
            provides: Vec::new(),
            state: Cell::new(None),
        }))
    }

    pub fn installed(id: PackageId, repo: &str) -> Self {
        let mut pkg = Self::new(id, repo);

        Rc::make_mut(&mut pkg.0).from_system = true;
        pkg
    }

    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        Rc::make_mut(&mut self.0).provides = provides;
        self
    }

    pub fn id(&self) -> &PackageId {
        &self.0.id
    }

    pub fn name(&self) -> &str {
        self.0.id.name()
    }

    pub fn repo(&self) -> &str {
        &self.0.repo
    }

    pub fn from_system(&self) -> bool {
        self.0.from_system
    }

    pub fn provides(&self) -> &[String] {
        &self.0.provides
    }

    pub fn state(&self) -> Option<OutputState> {
        self.0.state.get()
    }

    pub(crate) fn set_state(&self, state: Option<OutputState>) {
        self.0.state.set(state)
    }

    /* Provenance tag used by the deterministic dump format. */
    pub(crate) fn origin(&self) -> char {
        if self.0.from_system {
            'i'
        } else {
            'a'
        }
    }
}

impl Display for PackageRef {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.0.id)
    }
}

impl PartialEq for PackageRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for PackageRef {}

impl Ord for PackageRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl PartialOrd for PackageRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
