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
    collections::{HashSet, VecDeque},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    constants::INSTALLONLY_PKGS,
    db::PackageDatabase,
    err,
    log::{Level, Logger},
    pkg::{PackageId, PackageRef},
    trans::{
        CurrentState,
        InstallFn,
        MemberKey,
        OutputState,
        Relation,
        Selector,
        TransError,
        TransFlags,
        TransactionMember,
        TsState,
    },
    Error,
    Result,
};

/// Classification of the set's members for user-visible reporting, rebuilt
/// from scratch by [`TransactionSet::makelists`].
#[derive(Default)]
pub struct Classified {
    pub installed: Vec<MemberKey>,
    pub updated: Vec<MemberKey>,
    pub removed: Vec<MemberKey>,
    pub obsoleted: Vec<MemberKey>,
    pub dep_installed: Vec<MemberKey>,
    pub dep_updated: Vec<MemberKey>,
    pub dep_removed: Vec<MemberKey>,
    pub reinstalled: Vec<MemberKey>,
    pub downgraded: Vec<MemberKey>,
    pub failed: Vec<MemberKey>,
    pub inst_groups: Vec<String>,
    pub removed_groups: Vec<String>,
}

impl Classified {
    fn sort(&mut self) {
        self.installed.sort();
        self.updated.sort();
        self.removed.sort();
        self.obsoleted.sort();
        self.dep_installed.sort();
        self.dep_updated.sort();
        self.dep_removed.sort();
        self.reinstalled.sort();
        self.downgraded.sort();
        self.failed.sort();
        self.inst_groups.sort();
        self.removed_groups.sort();
    }
}

/// The set of operations about to be committed to the package database.
///
/// Members are indexed by identity and by name; a single identity may carry
/// several members as long as their ts_states differ. The set tracks which
/// members still await dependency processing and exposes a monotonic
/// state counter so observers can detect mutation.
pub struct TransactionSet {
    by_id: IndexMap<PackageId, Vec<TransactionMember>>,
    by_name: IndexMap<String, Vec<MemberKey>>,
    unresolved: HashSet<MemberKey>,
    conditionals: IndexMap<String, Vec<PackageRef>>,
    selectors: Vec<Box<dyn Selector>>,
    state_counter: usize,
    changed: bool,
    installonly: HashSet<String>,
    upgrade_all: bool,
    flags: TransFlags,
    lists: Classified,
    installed_db: Option<Rc<dyn PackageDatabase>>,
    available_db: Option<Rc<dyn PackageDatabase>>,
    install: Option<InstallFn>,
    pending: VecDeque<(PackageRef, PackageRef)>,
    draining: bool,
    logger: Option<Logger>,
}

impl Default for TransactionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionSet {
    pub fn new() -> Self {
        Self {
            by_id: IndexMap::new(),
            by_name: IndexMap::new(),
            unresolved: HashSet::new(),
            conditionals: IndexMap::new(),
            selectors: Vec::new(),
            state_counter: 0,
            changed: false,
            installonly: INSTALLONLY_PKGS.iter().map(|name| (*name).into()).collect(),
            upgrade_all: false,
            flags: TransFlags::NONE,
            lists: Classified::default(),
            installed_db: None,
            available_db: None,
            install: None,
            pending: VecDeque::new(),
            draining: false,
            logger: None,
        }
    }

    pub fn installed_db(mut self, db: Rc<dyn PackageDatabase>) -> Self {
        self.installed_db = Some(db);
        self
    }

    pub fn available_db(mut self, db: Rc<dyn PackageDatabase>) -> Self {
        self.available_db = Some(db);
        self
    }

    pub fn install_fn(mut self, install: InstallFn) -> Self {
        self.install = Some(install);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn flag(mut self, flags: TransFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn installonly(mut self, names: &[&str]) -> Self {
        self.installonly = names.iter().map(|name| (*name).into()).collect();
        self
    }

    pub fn flags(&self) -> &TransFlags {
        &self.flags
    }

    pub fn state_counter(&self) -> usize {
        self.state_counter
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn upgrade_all(&self) -> bool {
        self.upgrade_all
    }

    pub fn set_upgrade_all(&mut self, upgrade_all: bool) {
        self.upgrade_all = upgrade_all;
    }

    pub fn lists(&self) -> &Classified {
        &self.lists
    }

    pub fn conditionals(&self) -> &IndexMap<String, Vec<PackageRef>> {
        &self.conditionals
    }

    /// Registers candidate packages to pull in automatically once a member
    /// named after the capability enters the set.
    pub fn add_conditional(&mut self, capability: &str, packages: Vec<PackageRef>) {
        self.conditionals.entry(capability.into()).or_default().extend(packages);
    }

    pub fn len(&self) -> usize {
        self.by_id.len() + self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn members(&self) -> impl Iterator<Item = &TransactionMember> {
        self.by_id.values().flatten()
    }

    pub fn members_of(&self, id: &PackageId) -> &[TransactionMember] {
        self.by_id.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn members_with_state(&self, states: &[OutputState]) -> Vec<&TransactionMember> {
        self.members().filter(|m| m.output_state().is_some_and(|state| states.contains(&state))).collect()
    }

    pub fn member(&self, key: &MemberKey) -> Option<&TransactionMember> {
        self.by_id.get(&key.id)?.iter().find(|m| m.ts_state() == key.state)
    }

    pub fn member_mut(&mut self, key: &MemberKey) -> Option<&mut TransactionMember> {
        self.by_id.get_mut(&key.id)?.iter_mut().find(|m| m.ts_state() == key.state)
    }

    pub fn exists(&self, id: &PackageId) -> bool {
        self.by_id.get(id).is_some_and(|members| !members.is_empty())
    }

    pub fn match_naevr(
        &self,
        name: Option<&str>,
        arch: Option<&str>,
        epoch: Option<u32>,
        version: Option<&str>,
        release: Option<&str>,
    ) -> Vec<&TransactionMember> {
        let members: Vec<&TransactionMember> = match name {
            Some(name) => match self.by_name.get(name) {
                Some(keys) => keys.iter().filter_map(|key| self.member(key)).collect(),
                None => return Vec::new(),
            },
            None => self.members().collect(),
        };

        members
            .into_iter()
            .filter(|member| {
                let id = member.id();

                arch.map_or(true, |arch| arch == id.arch())
                    && epoch.map_or(true, |epoch| epoch == id.epoch())
                    && version.map_or(true, |version| version == id.version())
                    && release.map_or(true, |release| release == id.release())
            })
            .collect()
    }

    /// Reports the user-intended action on the matched packages: an update
    /// anywhere wins over an install, which wins over whatever came first.
    pub fn get_mode(
        &self,
        name: Option<&str>,
        arch: Option<&str>,
        epoch: Option<u32>,
        version: Option<&str>,
        release: Option<&str>,
    ) -> Option<TsState> {
        let states: Vec<Option<TsState>> =
            self.match_naevr(name, arch, epoch, version, release).iter().map(|member| member.ts_state()).collect();

        if states.contains(&Some(TsState::Update)) {
            Some(TsState::Update)
        } else if states.contains(&Some(TsState::Install)) {
            Some(TsState::Install)
        } else {
            states.first().copied().flatten()
        }
    }

    /* Resolution order matters: sort so .i386 resolves identically to .x86_64. */
    pub fn unresolved_members(&self) -> Vec<MemberKey> {
        let mut members: Vec<MemberKey> = self.unresolved.iter().cloned().collect();

        members.sort();
        members
    }

    pub fn mark_resolved(&mut self, key: &MemberKey) {
        self.unresolved.remove(key);
    }

    /// After bulk mutation by the resolver, re-examining every member is
    /// cheaper than tracking fine-grained deltas. Returns whether a reset
    /// took place.
    pub fn reset_resolved(&mut self, hard: bool) -> bool {
        if hard || self.len() < self.unresolved.len() {
            self.unresolved.clear();
            self.unresolved.extend(self.by_id.values().flatten().map(TransactionMember::key));
            return true;
        }

        false
    }

    pub fn add(&mut self, member: TransactionMember) -> Result<MemberKey> {
        let key = member.key();

        if self.by_id.get(&key.id).is_some_and(|members| members.iter().any(|m| m.ts_state() == member.ts_state())) {
            self.debug(&format!("Package {} already in transaction set in the same mode, skipping.", member.package()));
            return Ok(key);
        }

        let package = member.package().clone();
        let name = member.name().to_string();

        self.by_id.entry(key.id.clone()).or_default().push(member);
        self.by_name.entry(name.clone()).or_default().push(key.clone());
        self.unresolved.insert(key.clone());
        self.changed = true;
        self.state_counter += 1;

        if let Some(candidates) = self.conditionals.get(&name) {
            for candidate in candidates.clone() {
                self.pending.push_back((candidate, package.clone()));
            }
        }

        self.drain_conditionals()?;
        Ok(key)
    }

    pub fn remove(&mut self, id: &PackageId) -> Vec<TransactionMember> {
        let members = match self.by_id.shift_remove(id) {
            Some(members) => members,
            None => {
                self.debug(&format!("Package {id} not in transaction set"));
                return Vec::new();
            }
        };

        for member in &members {
            let key = member.key();
            let empty = match self.by_name.get_mut(member.name()) {
                Some(keys) => {
                    keys.retain(|k| k != &key);
                    keys.is_empty()
                }
                None => false,
            };

            if empty {
                self.by_name.shift_remove(member.name());
            }

            /* Removal is pending work the resolver may need to revisit. */
            member.package().set_state(None);
            self.unresolved.insert(key);
        }

        self.changed = true;
        self.state_counter += 1;
        members
    }

    pub fn add_install(&mut self, package: PackageRef) -> Result<MemberKey> {
        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Available);
        txmbr.set_output_state(OutputState::Install);
        txmbr.set_ts_state(TsState::Install);
        package.set_state(Some(OutputState::Install));

        if self.flags.contains(TransFlags::DETECT_REINSTALL)
            && self.installed_db.as_ref().is_some_and(|db| db.contains(package.id()))
        {
            txmbr.set_reinstall(true);
        }

        self.add(txmbr)
    }

    pub fn add_true_install(&mut self, package: PackageRef) -> Result<MemberKey> {
        self.add_install(package)
    }

    pub fn add_erase(&mut self, package: PackageRef) -> Result<MemberKey> {
        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Installed);
        txmbr.set_output_state(OutputState::Erase);
        txmbr.set_ts_state(TsState::Erase);
        package.set_state(Some(OutputState::Erase));
        self.add(txmbr)
    }

    pub fn add_update(&mut self, package: PackageRef, old: Option<PackageRef>) -> Result<MemberKey> {
        if self.allowed_multiple_installs(&package) {
            return self.add_true_install(package);
        }

        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Available);
        txmbr.set_output_state(OutputState::Update);
        txmbr.set_ts_state(TsState::Update);
        package.set_state(Some(OutputState::Update));

        if let Some(old) = old {
            txmbr.link(old.clone(), Relation::Updates);
            self.add_updated(old, &package)?;
        }

        self.add(txmbr)
    }

    pub fn add_downgrade(&mut self, package: PackageRef, old: Option<PackageRef>) -> Result<MemberKey> {
        let installed = self.add_install(package.clone())?;

        if let Some(old) = old {
            let erased = self.add_erase(old.clone())?;

            if let Some(txmbr) = self.member_mut(&erased) {
                txmbr.link(package.clone(), Relation::DowngradedBy);
            }

            if let Some(txmbr) = self.member_mut(&installed) {
                txmbr.link(old, Relation::Downgrades);
            }
        }

        Ok(installed)
    }

    pub fn add_obsoleting(&mut self, package: PackageRef, old: &PackageRef) -> Result<MemberKey> {
        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Available);
        txmbr.set_output_state(OutputState::Obsoleting);
        txmbr.set_ts_state(TsState::Install);
        package.set_state(Some(OutputState::Obsoleting));
        txmbr.link(old.clone(), Relation::Obsoletes);
        self.add(txmbr)
    }

    pub fn add_obsoleted(&mut self, package: PackageRef, obsoleting: &PackageRef) -> Result<MemberKey> {
        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Installed);
        txmbr.set_output_state(OutputState::Obsoleted);
        txmbr.set_ts_state(TsState::Obsoleted);
        package.set_state(Some(OutputState::Obsoleted));
        txmbr.link(obsoleting.clone(), Relation::ObsoletedBy);
        self.add(txmbr)
    }

    pub fn add_selector_install(&mut self, selector: Box<dyn Selector>) {
        self.selectors.push(selector);
        self.changed = true;
        self.state_counter += 1;
    }

    pub fn selector_installs(&self) -> &[Box<dyn Selector>] {
        &self.selectors
    }

    /// User-orientated removal: cancels one pattern out of a larger install
    /// set, trying progressively coarser matches before falling back to the
    /// databases. Returns the members removed.
    pub fn deselect(&mut self, pattern: &str) -> Vec<TransactionMember> {
        let mut keys: Vec<MemberKey> =
            self.match_naevr(Some(pattern), None, None, None, None).iter().map(|member| member.key()).collect();

        if keys.is_empty() {
            if let Some((name, arch)) = pattern.rsplit_once('.') {
                keys = self.match_naevr(Some(name), Some(arch), None, None, None).iter().map(|member| member.key()).collect();
            }
        }

        if keys.is_empty() {
            let mut packages = self.available_db.as_ref().map_or_else(Vec::new, |db| db.return_packages(&[pattern]));

            if packages.is_empty() {
                packages = self.installed_db.as_ref().map_or_else(Vec::new, |db| db.return_packages(&[pattern]));
            }

            for package in packages {
                keys.extend(self.members_of(package.id()).iter().map(|member| member.key()));

                /* Also purge conditional group packages, so they don't get added later on. */
                for candidates in self.conditionals.values_mut() {
                    candidates.retain(|candidate| candidate != &package);
                }
            }
        }

        let mut ids: Vec<PackageId> = keys.into_iter().map(|key| key.id).collect();
        let mut removed = Vec::new();

        ids.dedup();

        for id in ids {
            removed.extend(self.remove(&id));
        }

        removed
    }

    /// Rebuilds the classification lists. Reinstalls and downgrades are only
    /// broken out when the caller asks for them; otherwise they classify as
    /// plain installs and erasures.
    pub fn makelists(&mut self, include_reinstall: bool, include_downgrade: bool) {
        let mut lists = Classified::default();

        for member in self.members() {
            let key = member.key();

            match member.output_state() {
                Some(OutputState::Update) =>
                    if member.is_dep() {
                        lists.dep_updated.push(key)
                    } else {
                        lists.updated.push(key)
                    },
                Some(OutputState::Install) | Some(OutputState::TrueInstall) =>
                    if include_reinstall && member.reinstall() {
                        lists.reinstalled.push(key);
                    } else if include_downgrade && !member.downgrades().is_empty() {
                        lists.downgraded.push(key);
                    } else {
                        for group in member.groups() {
                            if !lists.inst_groups.iter().any(|g| g == group) {
                                lists.inst_groups.push(group.clone());
                            }
                        }

                        if member.is_dep() {
                            lists.dep_installed.push(key)
                        } else {
                            lists.installed.push(key)
                        }
                    },
                Some(OutputState::Erase) =>
                    if include_downgrade && !member.downgraded_by().is_empty() {
                        /* The peer install is already counted as a downgrade. */
                    } else {
                        for group in member.groups() {
                            if !lists.removed_groups.iter().any(|g| g == group) {
                                lists.removed_groups.push(group.clone());
                            }
                        }

                        if member.is_dep() {
                            lists.dep_removed.push(key)
                        } else {
                            lists.removed.push(key)
                        }
                    },
                Some(OutputState::Obsoleted) => lists.obsoleted.push(key),
                Some(OutputState::Obsoleting) => lists.installed.push(key),
                Some(OutputState::Failed) => lists.failed.push(key),
                Some(OutputState::Updated) | None => (),
            }
        }

        lists.sort();
        self.lists = lists;
    }

    /// Guards the handoff to the executor: an empty transaction is an error.
    pub fn assert_ready(&self) -> Result<()> {
        if self.by_id.is_empty() {
            err!(TransError::NothingToDo)
        } else {
            Ok(())
        }
    }

    fn allowed_multiple_installs(&self, package: &PackageRef) -> bool {
        self.installonly.contains(package.name())
    }

    fn add_updated(&mut self, package: PackageRef, updating: &PackageRef) -> Result<MemberKey> {
        let mut txmbr = TransactionMember::new(package.clone());

        txmbr.set_current_state(CurrentState::Installed);
        txmbr.set_output_state(OutputState::Updated);
        txmbr.set_ts_state(TsState::Updated);
        package.set_state(Some(OutputState::Updated));
        txmbr.link(updating.clone(), Relation::UpdatedBy);
        self.add(txmbr)
    }

    /* Conditional expansion runs off a queue so a callback that re-enters
     * add never observes a held borrow of the indexes. */
    fn drain_conditionals(&mut self) -> Result<()> {
        if self.draining {
            return Ok(());
        }

        self.draining = true;

        while let Some((candidate, dependent)) = self.pending.pop_front() {
            if self.installed_db.as_ref().is_some_and(|db| db.contains(candidate.id())) {
                continue;
            }

            let mut install = match self.install.take() {
                Some(install) => install,
                None => {
                    self.draining = false;
                    return err!(TransError::InjectorUnset(candidate.name().into()));
                }
            };
            let added = install(self, &candidate);

            self.install = Some(install);

            match added {
                Ok(keys) =>
                    for key in keys {
                        if let Some(member) = self.member_mut(&key) {
                            member.set_as_dep(Some(&dependent));
                        }
                    },
                Err(error) => {
                    self.draining = false;
                    return Err(error);
                }
            }
        }

        self.draining = false;
        Ok(())
    }

    pub(crate) fn members_mut(&mut self) -> impl Iterator<Item = &mut TransactionMember> {
        self.by_id.values_mut().flatten()
    }

    pub(crate) fn first_member_mut(&mut self, id: &PackageId) -> Option<&mut TransactionMember> {
        self.by_id.get_mut(id)?.first_mut()
    }

    pub(crate) fn debug(&mut self, msg: &str) {
        if let Some(logger) = self.logger.as_mut() {
            logger.log(Level::Debug, msg).ok();
        }
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type IntoIter = std::iter::Flatten<indexmap::map::Values<'a, PackageId, Vec<TransactionMember>>>;
    type Item = &'a TransactionMember;

    fn into_iter(self) -> Self::IntoIter {
        self.by_id.values().flatten()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::{db::ReasonDatabase, trans::Reason};

    struct MockDb {
        packages: Vec<PackageRef>,
    }

    impl MockDb {
        fn new(packages: Vec<PackageRef>) -> Rc<Self> {
            Rc::new(Self { packages })
        }
    }

    impl PackageDatabase for MockDb {
        fn contains(&self, id: &PackageId) -> bool {
            self.packages.iter().any(|package| package.id() == id)
        }

        fn return_packages(&self, patterns: &[&str]) -> Vec<PackageRef> {
            self.packages.iter().filter(|package| patterns.contains(&package.name())).cloned().collect()
        }
    }

    struct MockReasonDb {
        reasons: HashMap<PackageId, Reason>,
    }

    impl ReasonDatabase for MockReasonDb {
        fn reason(&self, pkg: &PackageRef) -> Option<Reason> {
            self.reasons.get(pkg.id()).copied()
        }
    }

    #[derive(Clone, Debug)]
    struct PatternSelector(String);

    impl Selector for PatternSelector {
        fn pattern(&self) -> &str {
            &self.0
        }
    }

    fn package(name: &str, version: &str) -> PackageRef {
        PackageRef::new(PackageId::new(name, "noarch", 0, version, "1"), "main")
    }

    fn system_package(name: &str, version: &str) -> PackageRef {
        PackageRef::installed(PackageId::new(name, "noarch", 0, version, "1"), "@System")
    }

    fn injector() -> InstallFn {
        Box::new(|set: &mut TransactionSet, package: &PackageRef| Ok(vec![set.add_install(package.clone())?]))
    }

    #[test]
    fn install_one() {
        let tour = package("tour", "5");
        let mut set = TransactionSet::new();

        let key = set.add_install(tour.clone()).unwrap();

        set.makelists(false, false);

        assert_eq!(set.len(), 1);
        assert_eq!(set.lists().installed, [key]);
        assert!(set.lists().updated.is_empty());
        assert!(set.lists().removed.is_empty());
        assert!(set.lists().dep_installed.is_empty());
        assert!(set.exists(tour.id()));
        assert_eq!(tour.state(), Some(OutputState::Install));
    }

    #[test]
    fn duplicate_add_skipped() {
        let tour = package("tour", "5");
        let mut set = TransactionSet::new();

        set.add_install(tour.clone()).unwrap();
        set.add_install(tour.clone()).unwrap();

        assert_eq!(set.members().count(), 1);
        assert_eq!(set.state_counter(), 1);
    }

    #[test]
    fn erase_and_update_share_identity() {
        let tour = package("tour", "5");
        let mut set = TransactionSet::new();

        set.add_install(tour.clone()).unwrap();
        set.add_erase(tour.clone()).unwrap();

        assert_eq!(set.members_of(tour.id()).len(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_remove_roundtrip() {
        let tour = package("tour", "5");
        let mut set = TransactionSet::new();

        set.add_install(tour.clone()).unwrap();

        let removed = set.remove(tour.id());

        set.makelists(false, false);

        assert_eq!(removed.len(), 1);
        assert_eq!(set.state_counter(), 2);
        assert!(set.changed());
        assert!(set.is_empty());
        assert!(!set.exists(tour.id()));
        assert!(set.match_naevr(Some("tour"), None, None, None, None).is_empty());
        assert!(set.lists().installed.is_empty());
        assert_eq!(tour.state(), None);
    }

    #[test]
    fn name_index_survives_partial_removal() {
        let v4 = package("tour", "4");
        let v5 = package("tour", "5");
        let mut set = TransactionSet::new();

        set.add_install(v4.clone()).unwrap();
        set.add_install(v5.clone()).unwrap();
        set.remove(v4.id());

        let matched = set.match_naevr(Some("tour"), None, None, None, None);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id(), v5.id());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut set = TransactionSet::new();

        assert!(set.remove(package("ghost", "1").id()).is_empty());
        assert_eq!(set.state_counter(), 0);
        assert!(!set.changed());
    }

    #[test]
    fn counter_unchanged_by_queries() {
        let mut set = TransactionSet::new();

        set.add_install(package("tour", "5")).unwrap();

        let counter = set.state_counter();

        assert_eq!(set.members().count(), 1);
        set.match_naevr(None, None, None, None, None);
        set.get_mode(Some("tour"), None, None, None, None);
        set.unresolved_members();
        set.makelists(true, true);

        assert_eq!(set.state_counter(), counter);
    }

    #[test]
    fn update_pair() {
        let new = package("tour", "5");
        let old = system_package("tour", "4");
        let mut set = TransactionSet::new();

        let key = set.add_update(new.clone(), Some(old.clone())).unwrap();

        assert_eq!(set.members().count(), 2);

        let updated = set
            .member(&MemberKey {
                id: old.id().clone(),
                state: Some(TsState::Updated),
            })
            .unwrap();

        assert_eq!(updated.output_state(), Some(OutputState::Updated));
        assert_eq!(updated.updated_by(), [new.clone()]);

        let update = set.member(&key).unwrap();

        assert_eq!(update.updates(), [old]);

        set.makelists(false, false);

        assert_eq!(set.lists().updated, [key]);
        assert!(set.lists().installed.is_empty());
        assert!(set.lists().removed.is_empty());
        assert!(set.lists().obsoleted.is_empty());
    }

    #[test]
    fn dep_update_classifies_separately() {
        let new = package("tour", "5");
        let mut set = TransactionSet::new();

        let key = set.add_update(new, None).unwrap();

        set.member_mut(&key).unwrap().set_as_dep(None);
        set.makelists(false, false);

        assert_eq!(set.lists().dep_updated, [key]);
        assert!(set.lists().updated.is_empty());
    }

    #[test]
    fn installonly_update_becomes_install() {
        let new = package("kernel", "6");
        let old = system_package("kernel", "5");
        let mut set = TransactionSet::new();

        let key = set.add_update(new.clone(), Some(old)).unwrap();

        assert_eq!(set.members().count(), 1);
        assert_eq!(key.state, Some(TsState::Install));

        set.makelists(false, false);

        assert_eq!(set.lists().installed, [key]);
        assert!(set.lists().updated.is_empty());
    }

    #[test]
    fn downgrade_pair() {
        let target = package("tour", "4");
        let current = system_package("tour", "5");
        let mut set = TransactionSet::new();

        let key = set.add_downgrade(target.clone(), Some(current.clone())).unwrap();

        set.makelists(false, true);

        assert_eq!(set.lists().downgraded, [key.clone()]);
        assert!(set.lists().installed.is_empty());
        assert!(set.lists().removed.is_empty());

        /* Without the downgrade breakout both sides classify plainly. */
        set.makelists(false, false);

        assert_eq!(set.lists().installed, [key]);
        assert_eq!(set.lists().removed.len(), 1);
    }

    #[test]
    fn obsoletes_classification() {
        let new = package("tour-ng", "1");
        let old = system_package("tour", "5");
        let mut set = TransactionSet::new();

        let obsoleting = set.add_obsoleting(new.clone(), &old).unwrap();
        let obsoleted = set.add_obsoleted(old.clone(), &new).unwrap();

        set.makelists(false, false);

        assert_eq!(set.lists().installed, [obsoleting]);
        assert_eq!(set.lists().obsoleted, [obsoleted.clone()]);
        assert_eq!(set.member(&obsoleted).unwrap().obsoleted_by(), [new]);
    }

    #[test]
    fn failed_classification() {
        let tour = package("tour", "5");
        let mut set = TransactionSet::new();

        let key = set.add_install(tour).unwrap();

        set.member_mut(&key).unwrap().set_output_state(OutputState::Failed);
        set.makelists(false, false);

        assert_eq!(set.lists().failed, [key]);
        assert!(set.lists().installed.is_empty());
    }

    #[test]
    fn reinstall_detection_flagged() {
        let tour = package("tour", "5");
        let db = MockDb::new(vec![tour.clone()]);
        let mut set = TransactionSet::new().flag(TransFlags::DETECT_REINSTALL).installed_db(db);

        let key = set.add_install(tour).unwrap();

        assert!(set.member(&key).unwrap().reinstall());

        set.makelists(true, false);

        assert_eq!(set.lists().reinstalled, [key.clone()]);
        assert!(set.lists().installed.is_empty());

        /* Classifies as a plain install unless the caller breaks it out. */
        set.makelists(false, false);

        assert_eq!(set.lists().installed, [key]);
    }

    #[test]
    fn reinstall_detection_defaults_off() {
        let tour = package("tour", "5");
        let db = MockDb::new(vec![tour.clone()]);
        let mut set = TransactionSet::new().installed_db(db);
        let key = set.add_install(tour).unwrap();

        assert!(!set.member(&key).unwrap().reinstall());
    }

    #[test]
    fn group_merging() {
        let mut set = TransactionSet::new();
        let one = set.add_install(package("alpha", "1")).unwrap();
        let two = set.add_install(package("beta", "1")).unwrap();

        set.member_mut(&one).unwrap().add_group("base");
        set.member_mut(&two).unwrap().add_group("base");
        set.member_mut(&two).unwrap().add_group("devel");
        set.makelists(false, false);

        assert_eq!(set.lists().inst_groups, ["base", "devel"]);
    }

    #[test]
    fn makelists_idempotent() {
        let mut set = TransactionSet::new();

        set.add_install(package("alpha", "1")).unwrap();
        set.add_update(package("beta", "2"), Some(system_package("beta", "1"))).unwrap();
        set.add_erase(system_package("gamma", "3")).unwrap();

        set.makelists(true, true);

        let installed = set.lists().installed.clone();
        let updated = set.lists().updated.clone();
        let removed = set.lists().removed.clone();

        set.makelists(true, true);

        assert_eq!(set.lists().installed, installed);
        assert_eq!(set.lists().updated, updated);
        assert_eq!(set.lists().removed, removed);
    }

    #[test]
    fn conditional_expansion() {
        let foo = package("foo", "1");
        let qux = package("qux", "1");
        let mut set = TransactionSet::new().installed_db(MockDb::new(Vec::new())).install_fn(injector());

        set.add_conditional("foo", vec![qux.clone()]);
        set.add_install(foo.clone()).unwrap();

        assert_eq!(set.len(), 2);

        let member = set
            .member(&MemberKey {
                id: qux.id().clone(),
                state: Some(TsState::Install),
            })
            .unwrap();

        assert!(member.is_dep());
        assert_eq!(member.depends_on(), [foo]);
    }

    #[test]
    fn conditional_skipped_when_installed() {
        let foo = package("foo", "1");
        let qux = package("qux", "1");
        let mut set = TransactionSet::new().installed_db(MockDb::new(vec![qux.clone()])).install_fn(injector());

        set.add_conditional("foo", vec![qux]);
        set.add_install(foo).unwrap();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn conditional_without_injector_errors() {
        let foo = package("foo", "1");
        let mut set = TransactionSet::new().installed_db(MockDb::new(Vec::new()));

        set.add_conditional("foo", vec![package("qux", "1")]);

        assert!(set.add_install(foo).is_err());
    }

    #[test]
    fn deselect_by_name() {
        let mut set = TransactionSet::new();

        set.add_install(package("a", "1")).unwrap();
        set.add_install(package("b", "1")).unwrap();
        set.add_install(package("c", "1")).unwrap();

        let removed = set.deselect("b");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].name(), "b");
        assert_eq!(set.len(), 2);
        assert!(set.match_naevr(Some("b"), None, None, None, None).is_empty());
        assert!(set.exists(package("a", "1").id()));
        assert!(set.exists(package("c", "1").id()));
    }

    #[test]
    fn deselect_by_name_and_arch() {
        let mut set = TransactionSet::new();

        set.add_install(package("tour", "5")).unwrap();

        let removed = set.deselect("tour.noarch");

        assert_eq!(removed.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn deselect_purges_conditionals() {
        let qux = package("qux", "1");
        let mut set = TransactionSet::new().available_db(MockDb::new(vec![qux.clone()]));

        set.add_conditional("group-cap", vec![qux]);

        let removed = set.deselect("qux");

        assert!(removed.is_empty());
        assert!(set.conditionals().get("group-cap").unwrap().is_empty());
    }

    #[test]
    fn selectors_count_toward_len() {
        let mut set = TransactionSet::new();

        set.add_selector_install(Box::new(PatternSelector("@base".into())));

        assert_eq!(set.len(), 1);
        assert_eq!(set.selector_installs()[0].pattern(), "@base");
        assert!(set.changed());
    }

    #[test]
    fn unresolved_sorted_regardless_of_insertion() {
        let mut set = TransactionSet::new();

        set.add_install(package("gamma", "1")).unwrap();
        set.add_install(package("alpha", "1")).unwrap();
        set.add_install(package("beta", "1")).unwrap();

        let unresolved = set.unresolved_members();
        let names: Vec<&str> = unresolved.iter().map(|key| key.id.name()).collect();

        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn mark_and_reset_resolved() {
        let mut set = TransactionSet::new();
        let alpha = set.add_install(package("alpha", "1")).unwrap();
        let beta = set.add_install(package("beta", "1")).unwrap();

        set.mark_resolved(&alpha);
        set.mark_resolved(&beta);

        assert!(set.unresolved_members().is_empty());
        assert!(!set.reset_resolved(false));
        assert!(set.reset_resolved(true));
        assert_eq!(set.unresolved_members().len(), 2);
    }

    #[test]
    fn shrinking_set_triggers_soft_reset() {
        let mut set = TransactionSet::new();

        set.add_install(package("alpha", "1")).unwrap();
        set.add_install(package("beta", "1")).unwrap();
        set.add_install(package("gamma", "1")).unwrap();
        set.remove(package("beta", "1").id());
        set.remove(package("gamma", "1").id());

        assert!(set.reset_resolved(false));
        assert_eq!(set.unresolved_members().len(), 1);
    }

    #[test]
    fn get_mode_precedence() {
        let mut set = TransactionSet::new();

        set.add_erase(system_package("tour", "4")).unwrap();

        assert_eq!(set.get_mode(Some("tour"), None, None, None, None), Some(TsState::Erase));

        set.add_update(package("tour", "5"), None).unwrap();

        assert_eq!(set.get_mode(Some("tour"), None, None, None, None), Some(TsState::Update));
        assert_eq!(set.get_mode(Some("missing"), None, None, None, None), None);
    }

    #[test]
    fn match_naevr_filters() {
        let mut set = TransactionSet::new();

        set.add_install(package("tour", "5")).unwrap();
        set.add_install(package("rest", "2")).unwrap();

        assert_eq!(set.match_naevr(None, None, None, None, None).len(), 2);
        assert_eq!(set.match_naevr(Some("tour"), None, None, None, None).len(), 1);
        assert_eq!(set.match_naevr(Some("tour"), Some("noarch"), None, Some("5"), None).len(), 1);
        assert!(set.match_naevr(Some("tour"), Some("x86_64"), None, None, None).is_empty());
        assert!(set.match_naevr(Some("tour"), None, Some(2), None, None).is_empty());
    }

    #[test]
    fn members_with_state_filters() {
        let mut set = TransactionSet::new();

        set.add_install(package("alpha", "1")).unwrap();
        set.add_erase(system_package("beta", "1")).unwrap();

        let erased = set.members_with_state(&[OutputState::Erase]);

        assert_eq!(erased.len(), 1);
        assert_eq!(erased[0].name(), "beta");
    }

    #[test]
    fn propagated_reason_through_update() {
        let new = package("tour", "5");
        let old = system_package("tour", "4");
        let reason_db = MockReasonDb {
            reasons: HashMap::from([(old.id().clone(), Reason::Dep)]),
        };
        let mut set = TransactionSet::new();
        let key = set.add_update(new, Some(old)).unwrap();

        assert_eq!(set.member(&key).unwrap().propagated_reason(&reason_db), Reason::Dep);
    }

    #[test]
    fn assert_ready_on_empty_set() {
        let mut set = TransactionSet::new();

        assert!(set.assert_ready().is_err());

        set.add_install(package("tour", "5")).unwrap();

        assert!(set.assert_ready().is_ok());
    }
}
