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

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use bitflags::bitflags;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{BOLD, RESET},
    impl_error,
    pkg::{PackageId, PackageRef},
    ErrorTrait,
    Result,
};

pub use self::{member::TransactionMember, set::TransactionSet, sort::SortableTransactionSet};

pub mod member;
pub mod set;
pub mod sort;

/// Callback injecting members for conditional group expansion. It must add the
/// members it creates to the set it is handed and return their keys.
pub type InstallFn = Box<dyn FnMut(&mut TransactionSet, &PackageRef) -> Result<Vec<MemberKey>>>;

/// Where a package currently resides.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CurrentState {
    Available,
    Installed,
}

/// What the package database executor is to do with a member.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TsState {
    Install,
    Update,
    Erase,
    Updated,
    Obsoleted,
}

/// How a member is classified for user-visible reporting.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputState {
    Install,
    TrueInstall,
    Update,
    Updated,
    Erase,
    Obsoleted,
    Obsoleting,
    Failed,
}

/// Why a member entered the transaction.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    User,
    Dep,
    Group,
    Clean,
    Weak,
    Unknown,
}

/// Tag qualifying an entry of a member's relation list.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    DependsOn,
    Updates,
    UpdatedBy,
    Downgrades,
    DowngradedBy,
    Obsoletes,
    ObsoletedBy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortColor {
    White,
    Grey,
    Black,
}

bitflags! {
    pub struct TransFlags: u8 {
        const NONE = 0;
        const DETECT_REINSTALL = 0b0000001;
    }
}

/// Opaque install-by-pattern request retained for the resolver instead of
/// being materialized as a concrete member.
pub trait Selector: DynClone + Debug {
    fn pattern(&self) -> &str;
}

dyn_clone::clone_trait_object!(Selector);

/// Stable handle to a member: a package can occur under several ts_states,
/// so identity alone does not address a member.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberKey {
    pub id: PackageId,
    pub state: Option<TsState>,
}

#[derive(Debug, Clone)]
pub enum TransError {
    NothingToDo,
    InjectorUnset(String),
}

impl Display for TransError {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NothingToDo => write!(fmter, "Nothing to do."),
            Self::InjectorUnset(name) =>
                write!(fmter, "Conditional expansion of '{}{name}{}': No install callback registered.", *BOLD, *RESET),
        }
    }
}

impl_error!(TransError);

impl TsState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Install => "i",
            Self::Update => "u",
            Self::Erase => "e",
            Self::Updated => "ud",
            Self::Obsoleted => "od",
        }
    }
}

impl OutputState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Install => "install",
            Self::TrueInstall => "true-install",
            Self::Update => "update",
            Self::Updated => "updated",
            Self::Erase => "erase",
            Self::Obsoleted => "obsoleted",
            Self::Obsoleting => "obsoleting",
            Self::Failed => "failed",
        }
    }
}

impl CurrentState {
    fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Installed => "installed",
        }
    }
}

impl Reason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Dep => "dep",
            Self::Group => "group",
            Self::Clean => "clean",
            Self::Weak => "weak",
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for Reason {
    fn from(reason: &str) -> Self {
        match reason {
            "user" => Self::User,
            "dep" => Self::Dep,
            "group" => Self::Group,
            "clean" => Self::Clean,
            "weak" => Self::Weak,
            _ => Self::Unknown,
        }
    }
}

impl Relation {
    fn as_str(&self) -> &str {
        match self {
            Self::DependsOn => "dependson",
            Self::Updates => "updates",
            Self::UpdatedBy => "updatedby",
            Self::Downgrades => "downgrades",
            Self::DowngradedBy => "downgradedby",
            Self::Obsoletes => "obsoletes",
            Self::ObsoletedBy => "obsoletedby",
        }
    }
}

impl Display for TsState {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.as_str())
    }
}

impl Display for OutputState {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.as_str())
    }
}

impl Display for CurrentState {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.as_str())
    }
}

impl Display for Reason {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.as_str())
    }
}

impl Display for Relation {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        write!(fmter, "{}", self.as_str())
    }
}
