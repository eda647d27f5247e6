//! Unified reference API
//!
//! This module manages references: human-readable names resolving to object
//! IDs (direct references) or to other references (symbolic references).
//!
//! ## Two-tier storage
//!
//! A reference lives in one of two stores:
//! - Loose: one small text file per reference, under `refs/…` or at the
//!   repository root (`HEAD`, `MERGE_HEAD`, `FETCH_HEAD`)
//! - Packed: one line of the consolidated `packed-refs` file
//!
//! Lookup consults the loose store first, so a loose file always shadows a
//! packed entry of the same name. Mutations write loose files; the packed
//! file is only rewritten wholesale, by [`Refs::delete`] of a packed ref
//! and by [`Refs::pack_all`].
//!
//! ## Freshness
//!
//! Loose reads revalidate against the file's mtime; every packed access
//! goes through `packed_load`, which re-stats `packed-refs` and replaces
//! the in-memory cache when the file changed.

use crate::areas::repository::Repository;
use crate::artifacts::core;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::reference::{RefTarget, Reference};
use crate::artifacts::refs::{
    HEAD_REF_NAME, ListFlags, MAX_NESTING_LEVEL, REFS_TAGS_PREFIX, RefKind, SYMREF_PREFIX, loose,
    packed,
};
use crate::errors::{RefsError, Result};
use derive_new::new;
use log::{debug, warn};
use std::io;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

/// Reference manager
///
/// A lightweight view bound to its owning repository; obtain one through
/// [`Repository::refs`]. All operations are synchronous and take effect on
/// the filesystem before returning.
#[derive(new)]
pub struct Refs<'r> {
    repository: &'r Repository,
}

impl Refs<'_> {
    /// Look up a reference by name
    ///
    /// Consults the loose store first, then the packed file.
    ///
    /// # Returns
    ///
    /// The reference, or *not-found* when neither store knows the name
    pub fn lookup(&self, name: &str) -> Result<Reference> {
        let name = RefName::try_parse(name)?;
        self.lookup_normalized(name)
    }

    /// Check whether a reference exists in either store
    pub fn exists(&self, name: &str) -> Result<bool> {
        let name = RefName::try_parse(name)?;
        self.exists_normalized(&name)
    }

    /// Create a direct reference
    ///
    /// # Arguments
    ///
    /// * `name` - Reference name; must be able to hold an OID
    /// * `oid` - Target object, verified against the object database
    /// * `force` - Overwrite an existing reference of the same name
    pub fn create_oid(&self, name: &str, oid: &ObjectId, force: bool) -> Result<Reference> {
        let name = RefName::try_parse_oid(name)?;

        if !force {
            self.verify_name_free(&name)?;
        }

        self.verify_target_exists(&name, oid)?;

        let mut reference = Reference::new(name, RefTarget::Direct(oid.clone()), false, None);
        self.loose_write(&mut reference)?;

        Ok(reference)
    }

    /// Create a symbolic reference
    ///
    /// # Arguments
    ///
    /// * `name` - Reference name
    /// * `target` - Name of the reference this one points at
    /// * `force` - Overwrite an existing reference of the same name
    pub fn create_symbolic(&self, name: &str, target: &str, force: bool) -> Result<Reference> {
        let name = RefName::try_parse(name)?;
        let target = self.normalize_symbolic_target(&name, target)?;

        if !force {
            self.verify_name_free(&name)?;
        }

        let mut reference = Reference::new(name, RefTarget::Symbolic(target), false, None);
        self.loose_write(&mut reference)?;

        Ok(reference)
    }

    /// Change the OID target of a direct reference
    ///
    /// The new value is written as a loose file; a packed copy of the same
    /// name is simply shadowed, not rewritten.
    pub fn set_oid(&self, reference: &mut Reference, oid: ObjectId) -> Result<()> {
        if reference.kind() != RefKind::Direct {
            return Err(RefsError::InvalidTarget {
                name: reference.name().to_string(),
                reason: "cannot set an OID on a symbolic reference".to_string(),
            });
        }

        self.verify_target_exists(reference.name(), &oid)?;

        reference.set_target(RefTarget::Direct(oid));
        self.loose_write(reference)
    }

    /// Change the target of a symbolic reference
    pub fn set_symbolic_target(&self, reference: &mut Reference, target: &str) -> Result<()> {
        if reference.kind() != RefKind::Symbolic {
            return Err(RefsError::InvalidTarget {
                name: reference.name().to_string(),
                reason: "cannot set a symbolic target on a direct reference".to_string(),
            });
        }

        let target = self.normalize_symbolic_target(reference.name(), target)?;

        reference.set_target(RefTarget::Symbolic(target));
        self.loose_write(reference)
    }

    /// Delete a reference from whichever store holds it
    ///
    /// Deleting a loose reference also removes a packed entry of the same
    /// name, so the packed copy cannot silently resurface.
    pub fn delete(&self, reference: Reference) -> Result<()> {
        self.delete_internal(&reference)
    }

    /// Rename a reference, updating HEAD and the reflog as needed
    ///
    /// On failure partway through, the old reference is restored and the
    /// original error surfaced. The handle is updated in place: it carries
    /// the new name and is no longer packed.
    pub fn rename(&self, reference: &mut Reference, new_name: &str, force: bool) -> Result<()> {
        let new_name = match reference.kind() {
            RefKind::Direct => RefName::try_parse_oid(new_name)?,
            RefKind::Symbolic => RefName::try_parse(new_name)?,
        };

        if !force && !self.reference_available(&new_name, Some(reference.name()))? {
            return Err(RefsError::AlreadyExists(new_name.to_string()));
        }

        // retain the fields so the reference can be recreated on rollback
        let old = reference.clone();

        let rollback = |error: RefsError| -> Result<()> {
            warn!("rename to '{new_name}' failed, restoring '{}'", old.name());
            let restored = match old.target() {
                RefTarget::Direct(oid) => {
                    self.create_oid(old.name().as_str(), oid, false).map(|_| ())
                }
                RefTarget::Symbolic(target) => self
                    .create_symbolic(old.name().as_str(), target.as_str(), false)
                    .map(|_| ()),
            };
            if let Err(restore_error) = restored {
                warn!("could not restore '{}': {restore_error}", old.name());
            }
            Err(error)
        };

        self.delete_internal(&old)?;

        // a directory at the new path (from refs nested below it) can be
        // removed now that availability has been checked; a file cannot
        let new_path = self.repository.ref_path(&new_name);
        if new_path.exists() {
            if new_path.is_dir() {
                if let Err(error) = std::fs::remove_dir_all(&new_path) {
                    return rollback(error.into());
                }
            } else {
                return rollback(RefsError::AlreadyExists(new_name.to_string()));
            }
        }

        let created = match old.target() {
            RefTarget::Direct(oid) => self.create_oid(new_name.as_str(), oid, force),
            RefTarget::Symbolic(target) => {
                self.create_symbolic(new_name.as_str(), target.as_str(), force)
            }
        };
        let created = match created {
            Ok(created) => created,
            Err(error) => return rollback(error),
        };

        // a symbolic HEAD pointing at the old name follows the rename
        match self.lookup(HEAD_REF_NAME) {
            Ok(head) => {
                if head.symbolic_target() == Some(old.name()) {
                    self.create_symbolic(HEAD_REF_NAME, new_name.as_str(), true)?;
                }
            }
            Err(error) if error.is_not_found() => {}
            Err(error) => return Err(error),
        }

        self.repository.reflog().rename_log(old.name(), &new_name)?;

        reference.set_name(new_name);
        reference.set_packed(false);
        reference.set_mtime(created.mtime());

        Ok(())
    }

    /// Resolve a reference to a direct reference
    ///
    /// A direct reference is re-looked-up so the returned copy reflects any
    /// external change. Symbolic chains are followed up to
    /// [`MAX_NESTING_LEVEL`] links; exceeding the bound (including cycles)
    /// fails with *too-nested*.
    pub fn resolve(&self, reference: &Reference) -> Result<Reference> {
        if reference.kind() == RefKind::Direct {
            return self.lookup_normalized(reference.name().clone());
        }

        let mut current = reference.clone();
        for _ in 0..MAX_NESTING_LEVEL {
            let target = match current.target() {
                RefTarget::Direct(_) => return Ok(current),
                RefTarget::Symbolic(target) => target.clone(),
            };
            current = self.lookup_normalized(target)?;
        }

        if current.kind() == RefKind::Direct {
            return Ok(current);
        }

        Err(RefsError::TooNested(MAX_NESTING_LEVEL))
    }

    /// Re-read a reference handle from its stores, in place
    ///
    /// When the backing file's mtime is unchanged, the in-memory target is
    /// kept as is.
    pub fn reload(&self, reference: &mut Reference) -> Result<()> {
        let last_mtime = if reference.is_packed() {
            None
        } else {
            reference.mtime()
        };

        match self.loose_read(reference.name(), last_mtime) {
            Ok(None) => Ok(()),
            Ok(Some((target, mtime))) => {
                reference.set_target(target);
                reference.set_packed(false);
                reference.set_mtime(Some(mtime));
                Ok(())
            }
            Err(error) if error.is_not_found() => {
                self.packed_load()?;
                let cache = self.repository.ref_cache().borrow();

                if reference.is_packed()
                    && reference.mtime().is_some()
                    && reference.mtime() == cache.mtime()
                {
                    return Ok(());
                }

                match cache.get(reference.name().as_str()) {
                    Some(entry) => {
                        reference.set_target(RefTarget::Direct(entry.oid().clone()));
                        reference.set_packed(true);
                        reference.set_mtime(cache.mtime());
                        Ok(())
                    }
                    None => Err(RefsError::NotFound(reference.name().to_string())),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Enumerate reference names matching `flags`
    ///
    /// Packed names (when requested) are emitted first, then the loose tree
    /// is walked; a loose file shadowing a packed entry is emitted once.
    /// The callback stops the iteration by returning
    /// [`ControlFlow::Break`].
    pub fn foreach(
        &self,
        flags: ListFlags,
        mut callback: impl FnMut(&str) -> ControlFlow<()>,
    ) -> Result<()> {
        if flags.contains(ListFlags::PACKED) {
            self.packed_load()?;

            // snapshot so the callback is free to re-enter the API
            let names = self.repository.ref_cache().borrow().names_sorted();
            for name in names {
                if callback(&name).is_break() {
                    return Ok(());
                }
            }
        }

        let refs_root = self.repository.refs_dir();
        if !refs_root.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(&refs_root) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = self.ref_name_for_path(entry.path())?;

            // do not list twice a reference that is already in the packfile
            if flags.contains(ListFlags::PACKED)
                && self.repository.ref_cache().borrow().contains(&name)
            {
                continue;
            }

            if flags != ListFlags::LISTALL {
                match loose::sniff_kind(entry.path()) {
                    Some(kind) if flags.contains(kind.as_list_flag()) => {}
                    _ => continue,
                }
            }

            if callback(&name).is_break() {
                return Ok(());
            }
        }

        Ok(())
    }

    /// Collect reference names matching `flags` into a vector
    pub fn listall(&self, flags: ListFlags) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.foreach(flags, |name| {
            names.push(name.to_string());
            ControlFlow::Continue(())
        })?;
        Ok(names)
    }

    /// Look up `HEAD`
    pub fn head(&self) -> Result<Reference> {
        self.lookup(HEAD_REF_NAME)
    }

    /// Point `HEAD` at another reference
    pub fn set_head(&self, target: &str) -> Result<Reference> {
        self.create_symbolic(HEAD_REF_NAME, target, true)
    }

    /// Compact all loose references into the packed file
    ///
    /// Loads the packed cache, folds every loose direct reference into it
    /// (loose wins over stale packed entries), peels annotated tags,
    /// commits the new packed file, and only then removes the loose files
    /// that were folded in. A failure before the commit leaves the
    /// repository untouched; failures while sweeping loose files are
    /// collected and the first one is reported after the sweep completes.
    pub fn pack_all(&self) -> Result<()> {
        self.packed_load()?;
        self.packed_load_loose()?;
        self.packed_write_and_sweep()
    }

    fn lookup_normalized(&self, name: RefName) -> Result<Reference> {
        match self.loose_read(&name, None) {
            Ok(Some((target, mtime))) => Ok(Reference::new(name, target, false, Some(mtime))),
            Ok(None) => Err(RefsError::NotFound(name.to_string())),
            Err(error) if error.is_not_found() => self.packed_lookup(name),
            Err(error) => Err(error),
        }
    }

    fn packed_lookup(&self, name: RefName) -> Result<Reference> {
        self.packed_load()?;

        let cache = self.repository.ref_cache().borrow();
        match cache.get(name.as_str()) {
            Some(entry) => Ok(Reference::new(
                name,
                RefTarget::Direct(entry.oid().clone()),
                true,
                cache.mtime(),
            )),
            None => Err(RefsError::NotFound(name.to_string())),
        }
    }

    fn exists_normalized(&self, name: &RefName) -> Result<bool> {
        self.packed_load()?;

        if self.repository.ref_path(name).is_file() {
            return Ok(true);
        }

        Ok(self.repository.ref_cache().borrow().contains(name.as_str()))
    }

    /// Read a loose reference file, honoring a previously recorded mtime
    ///
    /// Returns `Ok(None)` when the file is unchanged since `last_mtime`.
    fn loose_read(
        &self,
        name: &RefName,
        last_mtime: Option<SystemTime>,
    ) -> Result<Option<(RefTarget, SystemTime)>> {
        let path = self.repository.ref_path(name);

        match core::read_updated(&path, last_mtime) {
            Ok(Some((content, mtime))) => {
                let target = loose::parse(name.as_str(), &content)?;
                Ok(Some((target, mtime)))
            }
            Ok(None) => Ok(None),
            // a directory at the path means there is no loose ref there
            Err(error)
                if error.kind() == io::ErrorKind::NotFound
                    || error.kind() == io::ErrorKind::IsADirectory =>
            {
                Err(RefsError::NotFound(name.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Write a reference as a loose file and refresh the handle's mtime
    fn loose_write(&self, reference: &mut Reference) -> Result<()> {
        let path = self.repository.ref_path(reference.name());
        let content = loose::serialize(reference.target());

        core::atomic_write(&path, &content)?;

        if let Ok(mtime) = core::modified_time(&path) {
            reference.set_mtime(Some(mtime));
        }

        Ok(())
    }

    /// Refresh the packed cache from disk when the file changed
    ///
    /// An absent file leaves an empty, initialized cache. A parse failure
    /// clears the cache and surfaces *packed-refs-corrupt*.
    fn packed_load(&self) -> Result<()> {
        let path = self.repository.packed_refs_path();
        let last_mtime = self.repository.ref_cache().borrow().last_mtime();

        match core::read_updated(&path, last_mtime) {
            Ok(Some((content, mtime))) => {
                debug!("refreshing packed-refs cache from {}", path.display());
                match packed::parse(&content) {
                    Ok(entries) => {
                        self.repository
                            .ref_cache()
                            .borrow_mut()
                            .replace(entries, mtime);
                        Ok(())
                    }
                    Err(error) => {
                        self.repository.ref_cache().borrow_mut().invalidate();
                        Err(error)
                    }
                }
            }
            Ok(None) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                self.repository.ref_cache().borrow_mut().clear_absent();
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Serialize the cache to disk and record the new file mtime
    fn packed_write(&self) -> Result<()> {
        let content = {
            let cache = self.repository.ref_cache().borrow();
            packed::serialize(cache.entries())
        };

        let path = self.repository.packed_refs_path();
        core::atomic_write(&path, &content)?;

        let mtime = core::modified_time(&path).ok();
        self.repository.ref_cache().borrow_mut().set_mtime(mtime);

        Ok(())
    }

    /// Fold every loose direct reference into the packed cache
    ///
    /// Loose versions replace stale packed entries of the same name.
    /// Symbolic references are skipped: they are not packable.
    fn packed_load_loose(&self) -> Result<()> {
        let refs_root = self.repository.refs_dir();
        if !refs_root.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(&refs_root) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = self.ref_name_for_path(entry.path())?;
            let content = std::fs::read(entry.path())?;

            if content.starts_with(SYMREF_PREFIX.as_bytes()) {
                continue;
            }

            let oid = loose::parse_oid(&name, &content)?;
            self.repository
                .ref_cache()
                .borrow_mut()
                .insert_loose(name, oid);
        }

        Ok(())
    }

    /// Peel tags, commit the packed file, then sweep folded loose files
    fn packed_write_and_sweep(&self) -> Result<()> {
        {
            let mut cache = self.repository.ref_cache().borrow_mut();
            for (name, entry) in cache.entries_mut() {
                if entry.peel().is_some() || !name.starts_with(REFS_TAGS_PREFIX) {
                    continue;
                }
                if let Some(peel) = self.repository.database().peel_target(entry.oid())? {
                    entry.set_peel(peel);
                }
            }
        }

        debug!("committing packed-refs");
        self.packed_write()?;

        // the packed file is durable now; remove the loose copies, keeping
        // going past individual failures
        let swept: Vec<String> = {
            let cache = self.repository.ref_cache().borrow();
            cache
                .entries()
                .iter()
                .filter(|(_, entry)| entry.was_loose())
                .map(|(name, _)| name.clone())
                .collect()
        };

        let mut first_error = None;
        for name in &swept {
            let path = self.repository.ref_path_str(name);
            if !path.exists() {
                continue;
            }
            if let Err(error) = std::fs::remove_file(&path) {
                warn!("failed to remove loose reference '{name}': {error}");
                if first_error.is_none() {
                    first_error = Some(error.into());
                }
            }
        }

        self.repository.ref_cache().borrow_mut().clear_was_loose();

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Delete a reference, leaving the handle's fields usable
    fn delete_internal(&self, reference: &Reference) -> Result<()> {
        if reference.is_packed() {
            // expensive path: reload the packfile, drop the entry, rewrite
            self.packed_load()?;

            let removed = self
                .repository
                .ref_cache()
                .borrow_mut()
                .remove(reference.name().as_str());
            if removed.is_none() {
                // racy external change: the entry vanished under us
                return Err(RefsError::NotFound(reference.name().to_string()));
            }

            self.packed_write()?;
        } else {
            let path = self.repository.ref_path(reference.name());
            std::fs::remove_file(&path)?;
            self.prune_empty_parent_dirs(&path)?;

            // an older packed version of the name must not resurface
            match self.lookup_normalized(reference.name().clone()) {
                Ok(shadowed) if shadowed.is_packed() => self.delete_internal(&shadowed)?,
                Ok(_) => {}
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }

    /// Occupied-name check shared by the non-force creation paths
    fn verify_name_free(&self, name: &RefName) -> Result<()> {
        if self.exists_normalized(name)? || !self.reference_available(name, None)? {
            return Err(RefsError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    /// Check that no existing ref conflicts with `new_name` on a `/`
    /// boundary
    ///
    /// `refs/heads/foo` blocks `refs/heads/foo/bar` and vice-versa; an
    /// exact-name match is not a prefix conflict (creation handles it).
    fn reference_available(&self, new_name: &RefName, old_name: Option<&RefName>) -> Result<bool> {
        let mut available = true;

        self.foreach(ListFlags::LISTALL, |existing| {
            if old_name.map(|old| old.as_str()) != Some(existing) {
                let new_bytes = new_name.as_str().as_bytes();
                let existing_bytes = existing.as_bytes();
                let cmplen = new_bytes.len().min(existing_bytes.len());
                let lead = if existing_bytes.len() < new_bytes.len() {
                    new_bytes
                } else {
                    existing_bytes
                };

                if new_bytes[..cmplen] == existing_bytes[..cmplen]
                    && lead.get(cmplen) == Some(&b'/')
                {
                    available = false;
                    return ControlFlow::Break(());
                }
            }

            ControlFlow::Continue(())
        })?;

        Ok(available)
    }

    fn verify_target_exists(&self, name: &RefName, oid: &ObjectId) -> Result<()> {
        if !self.repository.database().exists(oid) {
            return Err(RefsError::InvalidTarget {
                name: name.to_string(),
                reason: format!("target object {oid} does not exist in the database"),
            });
        }
        Ok(())
    }

    fn normalize_symbolic_target(&self, name: &RefName, target: &str) -> Result<RefName> {
        RefName::try_parse(target).map_err(|_| RefsError::InvalidTarget {
            name: name.to_string(),
            reason: format!("symbolic target '{target}' is not a valid reference name"),
        })
    }

    /// Repository-relative name of a loose reference file
    fn ref_name_for_path(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(self.repository.path())
            .map_err(|_| io::Error::other("reference path outside the repository"))?;

        Ok(relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Remove directories left empty after deleting a loose reference
    ///
    /// Stops at the `refs/<category>` level, so `refs/heads` and friends
    /// survive the deletion of their last reference.
    fn prune_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        let refs_root = self.repository.refs_dir();

        if let Some(parent) = path.parent()
            && parent.starts_with(&refs_root)
            && parent != refs_root
            && parent.parent() != Some(refs_root.as_path())
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent)?;
            self.prune_empty_parent_dirs(parent)?;
        }

        Ok(())
    }
}
