use std::collections::BTreeMap;

use crate::scoring::types::{ExpectedBeat, PitchClass};

/// Remaining requirement for one pitch class in the current beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingEntry {
    /// Must be hit this many more times, once per award.
    Independent(u32),
    /// Belongs to a chord; any one member satisfies every chord member at once.
    ChordMember,
}

/// Targets still open in the current beat, iterated in ascending pitch-class order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingSet {
    entries: BTreeMap<PitchClass, PendingEntry>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pending set for a beat. Multi-note chords register their members as
    /// `ChordMember`; single notes add one independent hit each. A pitch class that is both
    /// stays `Independent`.
    pub fn from_beat(beat: &ExpectedBeat) -> Self {
        let mut entries = BTreeMap::new();
        for chord in &beat.chords {
            match chord.as_slice() {
                [] => {}
                [single] => {
                    let entry = entries
                        .entry(*single)
                        .or_insert(PendingEntry::Independent(0));
                    *entry = match *entry {
                        PendingEntry::Independent(n) => PendingEntry::Independent(n + 1),
                        PendingEntry::ChordMember => PendingEntry::Independent(1),
                    };
                }
                members => {
                    for &pc in members {
                        entries.entry(pc).or_insert(PendingEntry::ChordMember);
                    }
                }
            }
        }
        PendingSet { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, pc: PitchClass) -> Option<PendingEntry> {
        self.entries.get(&pc).copied()
    }

    pub fn first(&self) -> Option<PitchClass> {
        self.entries.keys().next().copied()
    }

    pub fn pitch_classes(&self) -> impl Iterator<Item = PitchClass> + '_ {
        self.entries.keys().copied()
    }

    /// Consume one hit for `pc`. Returns the pitch classes satisfied by it: every chord
    /// member when `pc` is one, otherwise just `pc`. Empty if `pc` was not pending.
    pub fn consume(&mut self, pc: PitchClass) -> Vec<PitchClass> {
        match self.entries.get(&pc).copied() {
            None | Some(PendingEntry::Independent(0)) => Vec::new(),
            Some(PendingEntry::ChordMember) => {
                let members: Vec<PitchClass> = self
                    .entries
                    .iter()
                    .filter(|(_, e)| **e == PendingEntry::ChordMember)
                    .map(|(pc, _)| *pc)
                    .collect();
                for m in &members {
                    self.entries.remove(m);
                }
                members
            }
            Some(PendingEntry::Independent(n)) => {
                if n <= 1 {
                    self.entries.remove(&pc);
                } else {
                    self.entries.insert(pc, PendingEntry::Independent(n - 1));
                }
                vec![pc]
            }
        }
    }

    /// Empty the set, returning what was left unsatisfied.
    pub fn drain(&mut self) -> Vec<PitchClass> {
        std::mem::take(&mut self.entries).into_keys().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
