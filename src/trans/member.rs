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
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult, Write},
};

use crate::{
    db::ReasonDatabase,
    pkg::{PackageId, PackageRef},
    trans::{CurrentState, MemberKey, OutputState, Reason, Relation, SortColor, TsState},
};

/// One intended operation on one package.
///
/// A member's package never changes for the member's lifetime; everything
/// else is owned state describing what the executor is to do with it, why,
/// and which other packages the operation relates to.
pub struct TransactionMember {
    package: PackageRef,
    current_state: Option<CurrentState>,
    ts_state: Option<TsState>,
    output_state: Option<OutputState>,
    is_dep: bool,
    reason: Reason,
    reinstall: bool,
    groups: Vec<String>,
    related_to: Vec<(PackageRef, Relation)>,
    depends_on: Vec<PackageRef>,
    obsoletes: Vec<PackageRef>,
    obsoleted_by: Vec<PackageRef>,
    updates: Vec<PackageRef>,
    updated_by: Vec<PackageRef>,
    downgrades: Vec<PackageRef>,
    downgraded_by: Vec<PackageRef>,
    sort_color: SortColor,
}

impl TransactionMember {
    pub fn new(package: PackageRef) -> Self {
        Self {
            package,
            current_state: None,
            ts_state: None,
            output_state: None,
            is_dep: false,
            reason: Reason::Unknown,
            reinstall: false,
            groups: Vec::new(),
            related_to: Vec::new(),
            depends_on: Vec::new(),
            obsoletes: Vec::new(),
            obsoleted_by: Vec::new(),
            updates: Vec::new(),
            updated_by: Vec::new(),
            downgrades: Vec::new(),
            downgraded_by: Vec::new(),
            sort_color: SortColor::White,
        }
    }

    pub fn package(&self) -> &PackageRef {
        &self.package
    }

    pub fn id(&self) -> &PackageId {
        self.package.id()
    }

    pub fn name(&self) -> &str {
        self.package.name()
    }

    pub fn key(&self) -> MemberKey {
        MemberKey {
            id: self.package.id().clone(),
            state: self.ts_state,
        }
    }

    pub fn current_state(&self) -> Option<CurrentState> {
        self.current_state
    }

    pub fn ts_state(&self) -> Option<TsState> {
        self.ts_state
    }

    pub fn output_state(&self) -> Option<OutputState> {
        self.output_state
    }

    pub fn is_dep(&self) -> bool {
        self.is_dep
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn reinstall(&self) -> bool {
        self.reinstall
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn related_to(&self) -> &[(PackageRef, Relation)] {
        &self.related_to
    }

    pub fn depends_on(&self) -> &[PackageRef] {
        &self.depends_on
    }

    pub fn obsoletes(&self) -> &[PackageRef] {
        &self.obsoletes
    }

    pub fn obsoleted_by(&self) -> &[PackageRef] {
        &self.obsoleted_by
    }

    pub fn updates(&self) -> &[PackageRef] {
        &self.updates
    }

    pub fn updated_by(&self) -> &[PackageRef] {
        &self.updated_by
    }

    pub fn downgrades(&self) -> &[PackageRef] {
        &self.downgrades
    }

    pub fn downgraded_by(&self) -> &[PackageRef] {
        &self.downgraded_by
    }

    pub fn set_reason(&mut self, reason: Reason) {
        self.reason = reason;
    }

    pub fn set_output_state(&mut self, state: OutputState) {
        self.output_state = Some(state);
    }

    pub fn add_group(&mut self, group: &str) {
        if !self.groups.iter().any(|g| g == group) {
            self.groups.push(group.into());
        }
    }

    /// Marks the member as dependency-pulled; when the depended-upon package
    /// is known, the relation is recorded as well.
    pub fn set_as_dep(&mut self, package: Option<&PackageRef>) {
        self.is_dep = true;

        if let Some(package) = package {
            self.link(package.clone(), Relation::DependsOn);
        }
    }

    /// Returns the member's reason, falling back to the recorded reason of the
    /// package it updates or downgrades. A package originally installed as a
    /// dependency keeps that status across an upgrade.
    pub fn propagated_reason(&self, reason_db: &dyn ReasonDatabase) -> Reason {
        if let Reason::User = self.reason {
            return self.reason;
        }

        let previously = if let Some(updated) = self.updates.first() {
            reason_db.reason(updated)
        } else if let Some(downgraded) = self.downgrades.first() {
            reason_db.reason(downgraded)
        } else {
            None
        };

        previously.unwrap_or(self.reason)
    }

    /// Deterministic textual representation for tests and debug logs.
    pub fn dump(&self) -> String {
        let id = self.package.id();
        let mut msg = format!(
            "mbr: {},{},{},{},{} {}\n",
            id.name(),
            id.arch(),
            id.epoch(),
            id.version(),
            id.release(),
            opt(self.current_state.map(|s| s.to_string()))
        );

        writeln!(msg, "  repo: {}", self.package.repo()).ok();
        writeln!(msg, "  ts_state: {}", opt(self.ts_state.map(|s| s.to_string()))).ok();
        writeln!(msg, "  output_state: {}", opt(self.output_state.map(|s| s.to_string()))).ok();
        writeln!(msg, "  is_dep: {}", self.is_dep).ok();
        writeln!(msg, "  reason: {}", self.reason).ok();
        writeln!(msg, "  reinstall: {}", self.reinstall).ok();

        if !self.related_to.is_empty() {
            msg.push_str("  relatedto:");

            for (package, relation) in &self.related_to {
                write!(msg, " {}@{}:{}", nevra(package), package.origin(), relation).ok();
            }

            msg.push('\n');
        }

        for (name, list) in [
            ("depends_on", &self.depends_on),
            ("obsoletes", &self.obsoletes),
            ("obsoleted_by", &self.obsoleted_by),
            ("downgrades", &self.downgrades),
            ("downgraded_by", &self.downgraded_by),
            ("updates", &self.updates),
            ("updated_by", &self.updated_by),
        ] {
            if list.is_empty() {
                continue;
            }

            write!(msg, "  {}:", name).ok();

            for package in list {
                write!(msg, " {}@{}", nevra(package), package.origin()).ok();
            }

            msg.push('\n');
        }

        if !self.groups.is_empty() {
            writeln!(msg, "  groups: {}", self.groups.join(" ")).ok();
        }

        msg
    }

    pub(crate) fn set_current_state(&mut self, state: CurrentState) {
        self.current_state = Some(state);
    }

    pub(crate) fn set_ts_state(&mut self, state: TsState) {
        self.ts_state = Some(state);
    }

    pub(crate) fn set_reinstall(&mut self, reinstall: bool) {
        self.reinstall = reinstall;
    }

    pub(crate) fn sort_color(&self) -> SortColor {
        self.sort_color
    }

    pub(crate) fn set_sort_color(&mut self, color: SortColor) {
        self.sort_color = color;
    }

    /* Records the relation both in the tagged list and its typed mirror. */
    pub(crate) fn link(&mut self, package: PackageRef, relation: Relation) {
        self.related_to.push((package.clone(), relation));

        match relation {
            Relation::DependsOn => self.depends_on.push(package),
            Relation::Updates => self.updates.push(package),
            Relation::UpdatedBy => self.updated_by.push(package),
            Relation::Downgrades => self.downgrades.push(package),
            Relation::DowngradedBy => self.downgraded_by.push(package),
            Relation::Obsoletes => self.obsoletes.push(package),
            Relation::ObsoletedBy => self.obsoleted_by.push(package),
        }
    }
}

impl Display for TransactionMember {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmter,
            "{}.{} {} - {}",
            self.package.name(),
            self.id().arch(),
            self.id().evr(),
            opt(self.ts_state.map(|s| s.to_string()))
        )
    }
}

impl PartialEq for TransactionMember {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TransactionMember {}

impl Ord for TransactionMember {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for TransactionMember {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn opt(field: Option<String>) -> String {
    field.unwrap_or_else(|| "none".into())
}

fn nevra(package: &PackageRef) -> String {
    let id = package.id();

    format!("{},{},{},{},{}", id.name(), id.arch(), id.epoch(), id.version(), id.release())
}
