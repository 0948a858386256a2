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

use std::ops::{Deref, DerefMut};

use crate::{
    pkg::PackageId,
    trans::{SortColor, TransactionSet},
};

/// A transaction set carrying a commit order over its members.
///
/// The order is computed by a three-colour depth-first walk of the
/// `depends_on` edges; a member's dependencies always commit before the
/// member itself. Cycles are recorded as loops of member names rather than
/// treated as fatal: the order still covers every identity, but the relative
/// order of cycle participants is unspecified.
pub struct SortableTransactionSet {
    trans: TransactionSet,
    sorted: Vec<PackageId>,
    path: Vec<String>,
    loops: Vec<Vec<String>>,
    counter: Option<usize>,
}

impl Default for SortableTransactionSet {
    fn default() -> Self {
        Self::new(TransactionSet::new())
    }
}

impl Deref for SortableTransactionSet {
    type Target = TransactionSet;

    fn deref(&self) -> &Self::Target {
        &self.trans
    }
}

impl DerefMut for SortableTransactionSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.trans
    }
}

impl SortableTransactionSet {
    pub fn new(trans: TransactionSet) -> Self {
        Self {
            trans,
            sorted: Vec::new(),
            path: Vec::new(),
            loops: Vec::new(),
            counter: None,
        }
    }

    pub fn into_inner(self) -> TransactionSet {
        self.trans
    }

    pub fn loops(&self) -> &[Vec<String>] {
        &self.loops
    }

    /// Returns the commit order: every identity in the set exactly once, each
    /// preceded by the identities it depends on. The result is cached until
    /// the underlying set mutates.
    pub fn sort(&mut self) -> &[PackageId] {
        if self.counter == Some(self.trans.state_counter()) {
            return &self.sorted;
        }

        self.sorted.clear();
        self.loops.clear();

        for member in self.trans.members_mut() {
            member.set_sort_color(SortColor::White);
        }

        let roots: Vec<PackageId> = self.trans.members().map(|member| member.id().clone()).collect();

        for root in roots {
            if let Some(SortColor::White) = self.color_of(&root) {
                self.path.clear();
                self.visit(root);
            }
        }

        self.counter = Some(self.trans.state_counter());
        &self.sorted
    }

    /* Iterative equivalent of the recursive colour walk: transaction graphs
     * grow large enough to overrun the stack otherwise. Members finish after
     * everything they depend on, so finishing order is the commit order. */
    fn visit(&mut self, root: PackageId) {
        let deps = self.deps_of(&root);
        let mut stack: Vec<(PackageId, Vec<PackageId>, usize)> = Vec::new();

        self.push_name(&root);
        self.set_color(&root, SortColor::Grey);
        stack.push((root, deps, 0));

        loop {
            let Some(frame) = stack.last_mut() else { break };
            let index = frame.2;

            frame.2 += 1;

            if let Some(dep) = frame.1.get(index) {
                let dep = dep.clone();

                match self.color_of(&dep) {
                    Some(SortColor::Grey) => {
                        let name = self.name_of(&dep);
                        self.do_loop(name);
                    }
                    Some(SortColor::White) => {
                        let deps = self.deps_of(&dep);

                        self.push_name(&dep);
                        self.set_color(&dep, SortColor::Grey);
                        stack.push((dep, deps, 0));
                    }
                    Some(SortColor::Black) => (),
                    None => self.trans.debug(&format!("Dependency {dep} not in transaction set, edge ignored")),
                }
            } else {
                let Some((id, ..)) = stack.pop() else { break };

                self.set_color(&id, SortColor::Black);
                self.sorted.push(id);
            }
        }
    }

    /* Cycle detection works on names: the recorded loop is the path suffix
     * beginning at the first visit of the closing vertex. */
    fn do_loop(&mut self, name: String) {
        self.path.push(name.clone());

        if let Some(index) = self.path.iter().position(|n| n == &name) {
            let looped = self.path[index ..].to_vec();

            if looped.len() > 2 {
                self.loops.push(looped);
            }
        }
    }

    fn color_of(&self, id: &PackageId) -> Option<SortColor> {
        self.trans.members_of(id).first().map(|member| member.sort_color())
    }

    fn set_color(&mut self, id: &PackageId, color: SortColor) {
        if let Some(member) = self.trans.first_member_mut(id) {
            member.set_sort_color(color);
        }
    }

    fn deps_of(&self, id: &PackageId) -> Vec<PackageId> {
        self.trans
            .members_of(id)
            .first()
            .map_or_else(Vec::new, |member| member.depends_on().iter().map(|package| package.id().clone()).collect())
    }

    fn name_of(&self, id: &PackageId) -> String {
        self.trans.members_of(id).first().map(|member| member.name().into()).unwrap_or_default()
    }

    fn push_name(&mut self, id: &PackageId) {
        let name = self.name_of(id);

        self.path.push(name);
    }
}
