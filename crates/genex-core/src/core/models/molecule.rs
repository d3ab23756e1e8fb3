use nalgebra::{Point2, Vector2};

/// The concrete kind of a mobile biomolecule.
///
/// This is a closed set: the engine dispatches kind-specific behavior by
/// matching on the variant rather than through open virtual dispatch, so the
/// negotiation protocol can be written as plain functions over the variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BiomoleculeKind {
    /// A ribosome that translates strand length into synthesized product by
    /// pulling the strand through its translation channel.
    Ribosome {
        /// Length of the translation channel in model length-units.
        channel_length: f64,
    },
    /// A destroyer that permanently consumes strand length from the front.
    MessengerRnaDestroyer,
}

/// A mobile biomolecule wandering the model space and competing for
/// single-slot attachment sites on messenger-RNA strands.
///
/// The molecule itself is pure data: position, kind, and the user-controlled
/// flag. Its lifecycle behavior lives in the engine's attachment state
/// machine, which the model container pairs with each molecule at spawn time.
#[derive(Debug, Clone, PartialEq)]
pub struct MobileBiomolecule {
    /// The concrete kind, fixed at construction.
    pub kind: BiomoleculeKind,
    /// Current position in model space.
    pub position: Point2<f64>,
    /// Set while the user is dragging this molecule; a grabbed molecule takes
    /// part in no negotiation and is force-detached from any partner.
    pub user_controlled: bool,
}

impl MobileBiomolecule {
    pub fn new(kind: BiomoleculeKind, position: Point2<f64>) -> Self {
        Self {
            kind,
            position,
            user_controlled: false,
        }
    }

    pub fn ribosome(channel_length: f64, position: Point2<f64>) -> Self {
        Self::new(BiomoleculeKind::Ribosome { channel_length }, position)
    }

    pub fn destroyer(position: Point2<f64>) -> Self {
        Self::new(BiomoleculeKind::MessengerRnaDestroyer, position)
    }

    /// The point this molecule offers for attachment, derived from its
    /// current position.
    ///
    /// For a ribosome this is the entrance of the translation channel, which
    /// sits half a channel length ahead of the body center; for a destroyer
    /// it is the leading edge at the body center.
    pub fn attachment_point_position(&self) -> Point2<f64> {
        match self.kind {
            BiomoleculeKind::Ribosome { channel_length } => {
                self.position + Vector2::new(-channel_length / 2.0, 0.0)
            }
            BiomoleculeKind::MessengerRnaDestroyer => self.position,
        }
    }

    /// Channel length for a ribosome, `None` for kinds without a channel.
    pub fn channel_length(&self) -> Option<f64> {
        match self.kind {
            BiomoleculeKind::Ribosome { channel_length } => Some(channel_length),
            BiomoleculeKind::MessengerRnaDestroyer => None,
        }
    }
}

/// Default translation-channel length used when a ribosome is spawned without
/// an explicit channel size.
pub const DEFAULT_RIBOSOME_CHANNEL_LENGTH: f64 = 400.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_molecule_is_not_user_controlled() {
        let m = MobileBiomolecule::destroyer(Point2::new(1.0, 2.0));
        assert!(!m.user_controlled);
        assert_eq!(m.position, Point2::new(1.0, 2.0));
        assert_eq!(m.kind, BiomoleculeKind::MessengerRnaDestroyer);
    }

    #[test]
    fn ribosome_attachment_point_leads_the_body() {
        let m = MobileBiomolecule::ribosome(300.0, Point2::new(100.0, 50.0));
        assert_eq!(m.attachment_point_position(), Point2::new(-50.0, 50.0));
        assert_eq!(m.channel_length(), Some(300.0));
    }

    #[test]
    fn destroyer_attachment_point_is_its_position() {
        let m = MobileBiomolecule::destroyer(Point2::new(-3.0, 7.0));
        assert_eq!(m.attachment_point_position(), m.position);
        assert_eq!(m.channel_length(), None);
    }

    #[test]
    fn attachment_point_tracks_a_moving_owner() {
        let mut m = MobileBiomolecule::ribosome(200.0, Point2::origin());
        let before = m.attachment_point_position();
        m.position = Point2::new(10.0, -5.0);
        let after = m.attachment_point_position();
        assert_eq!(after - before, Vector2::new(10.0, -5.0));
    }
}
