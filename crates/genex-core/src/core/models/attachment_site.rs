use super::ids::MoleculeId;

/// A single-slot rendezvous point where one mobile biomolecule may bind.
///
/// The site itself holds no arbitration priority and no stored position: its
/// owner derives the live position on every query, so a moving or growing
/// owner is always tracked correctly by whoever is attached or in transit.
///
/// Invariant: at most one non-null occupant at any time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachmentSite {
    /// The molecule currently attached or moving toward this site, if any.
    occupant: Option<MoleculeId>,
    /// Relative attractiveness of this site, in `[0, 1]`.
    pub affinity: f64,
}

impl AttachmentSite {
    pub fn new(affinity: f64) -> Self {
        Self {
            occupant: None,
            affinity,
        }
    }

    /// Claims the site for `candidate`.
    ///
    /// Succeeds only if the site is currently unoccupied; an occupied site is
    /// left untouched and the caller must treat the proposal as rejected.
    ///
    /// # Return
    ///
    /// `true` if the site was vacant and is now held by `candidate`.
    pub fn occupy(&mut self, candidate: MoleculeId) -> bool {
        if self.occupant.is_some() {
            return false;
        }
        self.occupant = Some(candidate);
        true
    }

    /// Releases the site. Idempotent: vacating an already-vacant site is a no-op.
    pub fn vacate(&mut self) {
        self.occupant = None;
    }

    pub fn occupant(&self) -> Option<MoleculeId> {
        self.occupant
    }

    pub fn is_vacant(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn is_occupied_by(&self, candidate: MoleculeId) -> bool {
        self.occupant == Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{Key, SlotMap};

    fn molecule_ids(n: usize) -> Vec<MoleculeId> {
        let mut arena = SlotMap::<MoleculeId, ()>::default();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn occupy_succeeds_only_when_vacant() {
        let mut site = AttachmentSite::new(1.0);
        let ids = molecule_ids(2);
        let (first, second) = (ids[0], ids[1]);

        assert!(site.is_vacant());
        assert!(site.occupy(first));
        assert!(site.is_occupied_by(first));

        // A second candidate must be rejected without disturbing the occupant.
        assert!(!site.occupy(second));
        assert!(site.is_occupied_by(first));
        assert!(!site.is_occupied_by(second));
    }

    #[test]
    fn site_never_reports_more_than_one_occupant() {
        let mut site = AttachmentSite::new(0.5);
        let ids = molecule_ids(3);
        assert!(site.occupy(ids[0]));
        assert!(!site.occupy(ids[1]));
        assert!(!site.occupy(ids[2]));
        assert_eq!(site.occupant(), Some(ids[0]));
    }

    #[test]
    fn vacate_is_idempotent() {
        let mut site = AttachmentSite::new(1.0);
        site.vacate();
        assert!(site.is_vacant());

        let ids = molecule_ids(1);
        assert!(site.occupy(ids[0]));
        site.vacate();
        assert!(site.is_vacant());
        site.vacate();
        assert!(site.is_vacant());
    }

    #[test]
    fn site_can_be_reoccupied_after_vacate() {
        let mut site = AttachmentSite::new(1.0);
        let ids = molecule_ids(2);
        assert!(site.occupy(ids[0]));
        site.vacate();
        assert!(site.occupy(ids[1]));
        assert!(site.is_occupied_by(ids[1]));
    }

    #[test]
    fn default_site_is_vacant() {
        let site = AttachmentSite::default();
        assert!(site.is_vacant());
        assert!(!site.is_occupied_by(MoleculeId::null()));
    }
}
