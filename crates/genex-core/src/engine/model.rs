use nalgebra::Point2;
use rand::Rng;
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, trace};

use super::config::SimulationConfig;
use super::error::EngineError;
use super::state_machine::{AttachmentState, AttachmentStateMachine};
use crate::core::models::ids::{MoleculeId, StrandId};
use crate::core::models::molecule::{BiomoleculeKind, MobileBiomolecule};
use crate::core::models::strand::MessengerRna;

/// A homing molecule this close to the strand's front site counts as
/// physically arrived.
pub const ATTACHMENT_ARRIVAL_DISTANCE: f64 = 5.0;
/// Straight-line speed while homing on an accepted attachment.
pub const APPROACH_SPEED: f64 = 300.0;

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub translations_completed: u64,
    pub strands_destroyed: u64,
}

/// The complete mutable state of a gene-expression simulation.
///
/// Molecules and strands live in slotmap arenas and refer to each other only
/// by handle, so references never dangle across removals. Each molecule is
/// paired 1:1 with an [`AttachmentStateMachine`] in a secondary map.
///
/// [`GeneExpressionModel::step`] runs one tick single-threaded in a fixed
/// phase order (growth, negotiation, motion, arrival, processing), so a run
/// is fully determined by the configuration and the injected generator's
/// seed.
#[derive(Debug)]
pub struct GeneExpressionModel {
    config: SimulationConfig,
    molecules: SlotMap<MoleculeId, MobileBiomolecule>,
    machines: SecondaryMap<MoleculeId, AttachmentStateMachine>,
    strands: SlotMap<StrandId, MessengerRna>,
    stats: SimulationStats,
}

impl GeneExpressionModel {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            molecules: SlotMap::with_key(),
            machines: SecondaryMap::new(),
            strands: SlotMap::with_key(),
            stats: SimulationStats::default(),
        }
    }

    /// Spawns the configured molecule population at random positions inside
    /// the arena bounds.
    pub fn populate(&mut self, rng: &mut impl Rng) {
        let population = self.config.population;
        for _ in 0..population.ribosome_count {
            let position = self.random_position(rng);
            self.spawn_molecule(
                MobileBiomolecule::ribosome(population.ribosome_channel_length, position),
                rng,
            );
        }
        for _ in 0..population.destroyer_count {
            let position = self.random_position(rng);
            self.spawn_molecule(MobileBiomolecule::destroyer(position), rng);
        }
        debug!(
            ribosomes = population.ribosome_count,
            destroyers = population.destroyer_count,
            "molecule population spawned"
        );
    }

    fn random_position(&self, rng: &mut impl Rng) -> Point2<f64> {
        let bounds = self.config.bounds;
        Point2::new(
            rng.gen_range(bounds.min.x..=bounds.max.x),
            rng.gen_range(bounds.min.y..=bounds.max.y),
        )
    }

    pub fn spawn_molecule(
        &mut self,
        molecule: MobileBiomolecule,
        rng: &mut impl Rng,
    ) -> MoleculeId {
        let id = self.molecules.insert(molecule);
        self.machines.insert(id, AttachmentStateMachine::new(rng));
        id
    }

    /// Spawns a near-zero-length strand; transcription grows it toward the
    /// configured target length over subsequent ticks.
    pub fn spawn_strand(&mut self, position: Point2<f64>) -> StrandId {
        self.strands.insert(MessengerRna::new(position))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    pub fn strand_count(&self) -> usize {
        self.strands.len()
    }

    pub fn molecules(&self) -> impl Iterator<Item = (MoleculeId, &MobileBiomolecule)> {
        self.molecules.iter()
    }

    pub fn strands(&self) -> impl Iterator<Item = (StrandId, &MessengerRna)> {
        self.strands.iter()
    }

    pub fn molecule(&self, id: MoleculeId) -> Result<&MobileBiomolecule, EngineError> {
        self.molecules
            .get(id)
            .ok_or(EngineError::MoleculeNotFound { id })
    }

    pub fn strand(&self, id: StrandId) -> Result<&MessengerRna, EngineError> {
        self.strands.get(id).ok_or(EngineError::StrandNotFound { id })
    }

    pub fn machine(&self, id: MoleculeId) -> Result<&AttachmentStateMachine, EngineError> {
        self.machines
            .get(id)
            .ok_or(EngineError::MoleculeNotFound { id })
    }

    /// Advances the whole simulation by one tick of `dt` seconds.
    pub fn step(&mut self, dt: f64, rng: &mut impl Rng) {
        self.grow_strands(dt);
        self.scan_proposals();
        self.move_molecules(dt, rng);
        self.settle_arrivals(rng);
        self.process_attachments(dt, rng);
    }

    /// Transcription: every strand still under the target length and not yet
    /// claimed by any consumer grows at the configured rate.
    fn grow_strands(&mut self, dt: f64) {
        let target = self.config.target_strand_length;
        let rate = self.config.rates.transcription_rate;
        for strand in self.strands.values_mut() {
            if strand.user_controlled
                || strand.consumer_count() > 0
                || strand.destroyer().is_some()
            {
                continue;
            }
            let deficit = target - strand.total_length();
            if deficit > 0.0 {
                strand.add_length(deficit.min(rate * dt));
            }
        }
    }

    /// Negotiation: every free molecule proposes to strands until one
    /// accepts. Acceptance commits both sides immediately (the site is
    /// occupied before the next proposal is considered), so two molecules
    /// can never win the same site within a tick.
    fn scan_proposals(&mut self) {
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        let strand_ids: Vec<StrandId> = self.strands.keys().collect();

        for &mol_id in &molecule_ids {
            let molecule = &self.molecules[mol_id];
            if molecule.user_controlled || !self.machines[mol_id].is_available() {
                continue;
            }
            let kind = molecule.kind;
            let entrance = molecule.attachment_point_position();

            for &strand_id in &strand_ids {
                let strand = &mut self.strands[strand_id];
                let accepted = match kind {
                    BiomoleculeKind::Ribosome { .. } => strand
                        .consider_proposal_from_ribosome(mol_id, entrance)
                        .is_some(),
                    BiomoleculeKind::MessengerRnaDestroyer => strand
                        .consider_proposal_from_destroyer(mol_id, entrance)
                        .is_some(),
                };
                if accepted {
                    let target = strand.attachment_site_position();
                    self.machines[mol_id].begin_approach(strand_id, target, APPROACH_SPEED);
                    trace!(?mol_id, ?strand_id, "attachment negotiated");
                    break;
                }
            }
        }
    }

    /// Motion: wanderers drift, homing molecules track the (possibly moved)
    /// site of their strand, attached molecules are slaved to the live front
    /// of their channel segment. User-held molecules stay where the user put
    /// them.
    fn move_molecules(&mut self, dt: f64, rng: &mut impl Rng) {
        let bounds = self.config.bounds;
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in molecule_ids {
            if self.molecules[id].user_controlled {
                continue;
            }
            match self.machines[id].state() {
                AttachmentState::MovingTowardAttachment { strand } => {
                    let site = self.strands[strand].attachment_site_position();
                    let offset = self.molecules[id].attachment_point_position()
                        - self.molecules[id].position;
                    self.machines[id].retarget(site - offset);
                }
                AttachmentState::Attached { strand } => {
                    // The strand may have moved or recentered since the snap.
                    if let Some(front) = self
                        .strands
                        .get(strand)
                        .and_then(|s| s.consumer_segment_position(id))
                    {
                        let offset = self.molecules[id].attachment_point_position()
                            - self.molecules[id].position;
                        self.molecules[id].position = front - offset;
                    }
                    continue;
                }
                AttachmentState::UnattachedAvailable => {}
            }
            let position = self.molecules[id].position;
            let next = self.machines[id].step(position, dt, &bounds, rng);
            self.molecules[id].position = next;
        }
    }

    /// Arrival: a homing molecule within [`ATTACHMENT_ARRIVAL_DISTANCE`] of
    /// its site snaps onto it and physical processing begins.
    fn settle_arrivals(&mut self, rng: &mut impl Rng) {
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in molecule_ids {
            let AttachmentState::MovingTowardAttachment { strand } = self.machines[id].state()
            else {
                continue;
            };
            let site = self.strands[strand].attachment_site_position();
            let entrance = self.molecules[id].attachment_point_position();
            if nalgebra::distance(&entrance, &site) > ATTACHMENT_ARRIVAL_DISTANCE {
                continue;
            }

            // Snap so the attachment point lands exactly on the site.
            let offset = entrance - self.molecules[id].position;
            self.molecules[id].position = site - offset;
            self.machines[id].attach(strand);

            match self.molecules[id].kind {
                BiomoleculeKind::Ribosome { channel_length } => {
                    self.strands[strand].on_ribosome_attached(id, channel_length);
                }
                BiomoleculeKind::MessengerRnaDestroyer => {
                    // Destruction preempts any translation still in
                    // progress; those ribosomes are released before the
                    // strand starts shrinking under them.
                    self.release_ribosomes_on(strand, rng);
                    let channel = self.config.population.destroyer_channel_length;
                    self.strands[strand].begin_destruction(id, channel);
                }
            }
            debug!(?id, ?strand, "molecule physically attached");
        }
    }

    /// Processing: attached ribosomes translate, an attached destroyer
    /// consumes; completed consumers release and a fully destroyed strand
    /// leaves the arena.
    fn process_attachments(&mut self, dt: f64, rng: &mut impl Rng) {
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in molecule_ids {
            let AttachmentState::Attached { strand } = self.machines[id].state() else {
                continue;
            };
            if !self.strands.contains_key(strand) {
                // The strand was destroyed earlier in this phase.
                self.machines[id].force_immediate_unattached_and_available(rng);
                continue;
            }
            match self.molecules[id].kind {
                BiomoleculeKind::Ribosome { .. } => {
                    let rate = self.config.rates.translation_rate;
                    if self.strands[strand].advance_translation(id, rate * dt) {
                        self.strands[strand].release_ribosome(id);
                        self.machines[id].force_immediate_unattached_and_available(rng);
                        self.stats.translations_completed += 1;
                        debug!(?id, ?strand, "translation completed");
                    }
                }
                BiomoleculeKind::MessengerRnaDestroyer => {
                    let rate = self.config.rates.destruction_rate;
                    if self.strands[strand].advance_destruction(rate * dt) {
                        self.remove_destroyed_strand(strand, rng);
                        self.stats.strands_destroyed += 1;
                        debug!(?id, ?strand, "strand destroyed");
                    }
                }
            }
        }
    }

    fn release_ribosomes_on(&mut self, strand: StrandId, rng: &mut impl Rng) {
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in molecule_ids {
            if self.machines[id].strand() != Some(strand) {
                continue;
            }
            if matches!(self.molecules[id].kind, BiomoleculeKind::Ribosome { .. }) {
                self.strands[strand].release_ribosome(id);
                self.machines[id].force_immediate_unattached_and_available(rng);
            }
        }
    }

    /// Removes a fully destroyed strand and force-resets every machine that
    /// still referenced it, so no handle dangles past this call.
    fn remove_destroyed_strand(&mut self, strand: StrandId, rng: &mut impl Rng) {
        self.strands.remove(strand);
        let molecule_ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in molecule_ids {
            if self.machines[id].strand() == Some(strand) {
                self.machines[id].force_immediate_unattached_and_available(rng);
            }
        }
    }

    // --- user overrides --------------------------------------------------

    /// User grabs a molecule: any commitment (in transit or attached) is
    /// cancelled synchronously on both sides and the molecule is held still
    /// under the cursor.
    pub fn grab_molecule(&mut self, id: MoleculeId, rng: &mut impl Rng) -> Result<(), EngineError> {
        if !self.molecules.contains_key(id) {
            return Err(EngineError::MoleculeNotFound { id });
        }
        if let Some(strand) = self.machines[id].strand() {
            if let Some(strand_state) = self.strands.get_mut(strand) {
                match self.molecules[id].kind {
                    BiomoleculeKind::Ribosome { .. } => strand_state.release_ribosome(id),
                    BiomoleculeKind::MessengerRnaDestroyer => {
                        strand_state.abort_destruction();
                    }
                }
            }
        }
        self.machines[id].force_immediate_unattached_and_available(rng);
        self.machines[id].hold_still();
        self.molecules[id].user_controlled = true;
        Ok(())
    }

    pub fn move_grabbed_molecule(
        &mut self,
        id: MoleculeId,
        position: Point2<f64>,
    ) -> Result<(), EngineError> {
        let molecule = self
            .molecules
            .get_mut(id)
            .ok_or(EngineError::MoleculeNotFound { id })?;
        molecule.position = position;
        Ok(())
    }

    /// User lets go of a molecule; it resumes wandering and may negotiate
    /// again from the next tick.
    pub fn release_molecule(
        &mut self,
        id: MoleculeId,
        rng: &mut impl Rng,
    ) -> Result<(), EngineError> {
        if !self.molecules.contains_key(id) {
            return Err(EngineError::MoleculeNotFound { id });
        }
        self.molecules[id].user_controlled = false;
        self.machines[id].force_immediate_unattached_and_available(rng);
        Ok(())
    }

    /// User grabs a strand: admission stops and any in-flight negotiation is
    /// cancelled, with the inbound molecule reset in the same operation.
    pub fn grab_strand(&mut self, id: StrandId, rng: &mut impl Rng) -> Result<(), EngineError> {
        let strand = self.strands.get_mut(id).ok_or(EngineError::StrandNotFound { id })?;
        strand.user_controlled = true;
        if let Some(cancelled) = strand.abort_incoming_negotiation() {
            if let Some(machine) = self.machines.get_mut(cancelled) {
                machine.force_immediate_unattached_and_available(rng);
            }
        }
        Ok(())
    }

    pub fn move_grabbed_strand(
        &mut self,
        id: StrandId,
        position: Point2<f64>,
    ) -> Result<(), EngineError> {
        let strand = self.strands.get_mut(id).ok_or(EngineError::StrandNotFound { id })?;
        strand.move_to(position);
        Ok(())
    }

    pub fn release_strand(&mut self, id: StrandId) -> Result<(), EngineError> {
        let strand = self.strands.get_mut(id).ok_or(EngineError::StrandNotFound { id })?;
        strand.user_controlled = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::Rect;
    use crate::engine::config::SimulationConfigBuilder;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // A small arena keeps every point within connection range of a strand
    // at the center, so negotiation outcomes do not depend on the walk.
    fn test_config() -> SimulationConfig {
        SimulationConfigBuilder::new()
            .seed(42)
            .bounds(Rect::from_center(Point2::origin(), 500.0, 400.0))
            .ribosome_count(2)
            .destroyer_count(1)
            .destroyer_channel_length(150.0)
            .transcription_rate(600.0)
            .translation_rate(900.0)
            .destruction_rate(900.0)
            .strand_count(1)
            .target_strand_length(800.0)
            .tick_seconds(1.0 / 30.0)
            .max_ticks(5_000)
            .build()
            .unwrap()
    }

    fn run_ticks(model: &mut GeneExpressionModel, rng: &mut StdRng, ticks: u64) {
        let dt = model.config().tick_seconds;
        for _ in 0..ticks {
            model.step(dt, rng);
        }
    }

    #[test]
    fn populate_pairs_every_molecule_with_a_machine() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut model = GeneExpressionModel::new(test_config());
        model.populate(&mut rng);
        assert_eq!(model.molecule_count(), 3);
        for (id, _) in model.molecules() {
            assert!(model.machine(id).unwrap().is_available());
        }
    }

    #[test]
    fn strands_grow_to_the_target_length_and_stop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut model = GeneExpressionModel::new(test_config());
        let strand = model.spawn_strand(Point2::origin());
        run_ticks(&mut model, &mut rng, 200);
        let length = model.strand(strand).unwrap().total_length();
        assert!((length - 800.0).abs() < 1e-6, "length was {}", length);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut model = GeneExpressionModel::new(test_config());
            model.populate(&mut rng);
            model.spawn_strand(Point2::origin());
            run_ticks(&mut model, &mut rng, 300);
            let mut positions: Vec<(f64, f64)> = model
                .molecules()
                .map(|(_, m)| (m.position.x, m.position.y))
                .collect();
            positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
            (positions, model.stats())
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn molecules_never_leave_the_arena() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = GeneExpressionModel::new(test_config());
        model.populate(&mut rng);
        let bounds = model.config().bounds;
        let dt = model.config().tick_seconds;
        for _ in 0..2_000 {
            model.step(dt, &mut rng);
            for (_, molecule) in model.molecules() {
                assert!(bounds.contains(&molecule.position));
            }
        }
    }

    #[test]
    fn ribosome_completes_a_translation_end_to_end() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut config = test_config();
        config.population.destroyer_count = 0;
        config.population.ribosome_count = 1;
        let mut model = GeneExpressionModel::new(config);
        model.populate(&mut rng);
        model.spawn_strand(Point2::origin());

        let mut completed = false;
        let dt = model.config().tick_seconds;
        for _ in 0..5_000 {
            model.step(dt, &mut rng);
            if model.stats().translations_completed > 0 {
                completed = true;
                break;
            }
        }
        assert!(completed, "no translation completed within the tick budget");

        // The ribosome is free again and the strand survived translation
        // with its material conserved (growth pauses while it is claimed,
        // so the length is whatever transcription reached at acceptance).
        let (id, _) = model.molecules().next().unwrap();
        assert!(model.machine(id).unwrap().is_available());
        assert_eq!(model.strand_count(), 1);
        let (_, strand) = model.strands().next().unwrap();
        assert!(strand.total_length() >= 75.0);
        assert_eq!(strand.consumer_count(), 0);
    }

    #[test]
    fn destroyer_removes_the_strand_from_the_arena() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut config = test_config();
        config.population.ribosome_count = 0;
        config.population.destroyer_count = 1;
        let mut model = GeneExpressionModel::new(config);
        model.populate(&mut rng);
        model.spawn_strand(Point2::origin());

        let dt = model.config().tick_seconds;
        for _ in 0..5_000 {
            model.step(dt, &mut rng);
            if model.stats().strands_destroyed > 0 {
                break;
            }
        }
        assert_eq!(model.stats().strands_destroyed, 1);
        assert_eq!(model.strand_count(), 0);

        // The destroyer survives the strand and wanders again.
        let (id, _) = model.molecules().next().unwrap();
        assert!(model.machine(id).unwrap().is_available());
    }

    #[test]
    fn grabbing_an_in_transit_molecule_leaves_no_residual_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut config = test_config();
        config.population.ribosome_count = 1;
        config.population.destroyer_count = 0;
        let mut model = GeneExpressionModel::new(config);
        model.populate(&mut rng);
        let strand = model.spawn_strand(Point2::origin());

        // Tick until the ribosome commits to the strand.
        let dt = model.config().tick_seconds;
        let (id, _) = model.molecules().next().unwrap();
        let mut committed = false;
        for _ in 0..1_000 {
            model.step(dt, &mut rng);
            if !model.machine(id).unwrap().is_available() {
                committed = true;
                break;
            }
        }
        assert!(committed, "ribosome never negotiated an attachment");

        model.grab_molecule(id, &mut rng).unwrap();
        let strand_state = model.strand(strand).unwrap();
        assert!(strand_state.attachment_site().is_vacant());
        assert_eq!(strand_state.consumer_count(), 0);
        assert!(model.machine(id).unwrap().is_available());
        assert!(model.molecule(id).unwrap().user_controlled);

        // Released molecules rejoin the simulation cleanly.
        model.release_molecule(id, &mut rng).unwrap();
        assert!(!model.molecule(id).unwrap().user_controlled);
    }

    #[test]
    fn grabbing_a_strand_cancels_the_inbound_negotiation() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut config = test_config();
        config.population.ribosome_count = 1;
        config.population.destroyer_count = 0;
        let mut model = GeneExpressionModel::new(config);
        model.populate(&mut rng);
        let strand = model.spawn_strand(Point2::origin());

        let dt = model.config().tick_seconds;
        let (id, _) = model.molecules().next().unwrap();
        for _ in 0..1_000 {
            model.step(dt, &mut rng);
            if !model.machine(id).unwrap().is_available() {
                break;
            }
        }
        let in_transit = matches!(
            model.machine(id).unwrap().state(),
            AttachmentState::MovingTowardAttachment { .. }
        );
        if in_transit {
            model.grab_strand(strand, &mut rng).unwrap();
            assert!(model.machine(id).unwrap().is_available());
            let strand_state = model.strand(strand).unwrap();
            assert!(strand_state.attachment_site().is_vacant());
            assert_eq!(strand_state.consumer_count(), 0);
            // No admission while held.
            model.step(dt, &mut rng);
            assert!(model.machine(id).unwrap().is_available());
        }
    }

    #[test]
    fn attached_ribosome_follows_a_grabbed_strand() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut config = test_config();
        config.population.destroyer_count = 0;
        config.population.ribosome_count = 1;
        // Slow translation keeps the ribosome attached across the move.
        config.rates.translation_rate = 30.0;
        let mut model = GeneExpressionModel::new(config);
        model.populate(&mut rng);
        let strand = model.spawn_strand(Point2::origin());

        let dt = model.config().tick_seconds;
        let (id, _) = model.molecules().next().unwrap();
        let mut attached = false;
        for _ in 0..2_000 {
            model.step(dt, &mut rng);
            if matches!(
                model.machine(id).unwrap().state(),
                AttachmentState::Attached { .. }
            ) {
                attached = true;
                break;
            }
        }
        assert!(attached, "ribosome never physically attached");

        model.grab_strand(strand, &mut rng).unwrap();
        model
            .move_grabbed_strand(strand, Point2::new(4_000.0, -3_000.0))
            .unwrap();
        model.step(dt, &mut rng);

        let entrance = model.molecule(id).unwrap().attachment_point_position();
        let front = model
            .strand(strand)
            .unwrap()
            .consumer_segment_position(id)
            .expect("ribosome still translating");
        assert!(
            nalgebra::distance(&entrance, &front) < 10.0,
            "attached ribosome was left behind at {:?}",
            entrance
        );
    }

    #[test]
    fn unknown_handles_are_reported_as_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut model = GeneExpressionModel::new(test_config());
        let mut other = GeneExpressionModel::new(test_config());
        let foreign_molecule = other.spawn_molecule(
            MobileBiomolecule::destroyer(Point2::origin()),
            &mut rng,
        );
        let foreign_strand = other.spawn_strand(Point2::origin());

        assert!(matches!(
            model.molecule(foreign_molecule),
            Err(EngineError::MoleculeNotFound { .. })
        ));
        assert!(matches!(
            model.grab_strand(foreign_strand, &mut rng),
            Err(EngineError::StrandNotFound { .. })
        ));
    }
}
