use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mutation::{self, Inverse, MutationKind};
use crate::scene::Scene;

/// a scene plus the canvas it lives on and the triangle budget the search
/// works toward. canvas dimensions are fixed for the lifetime of the state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneState {
    pub scene: Scene,
    width: u32,
    height: u32,
    target_count: usize,
}

impl SceneState {
    pub fn new(width: u32, height: u32, target_count: usize) -> Self {
        Self::with_scene(Scene::new(), width, height, target_count)
    }

    /// resume from an existing scene (e.g. a deserialized snapshot).
    pub fn with_scene(scene: Scene, width: u32, height: u32, target_count: usize) -> Self {
        assert!(width > 0 && height > 0, "canvas must be non-empty");
        assert!(
            width <= i32::MAX as u32 && height <= i32::MAX as u32,
            "canvas exceeds vertex coordinate range"
        );
        debug_assert!(
            scene.len() <= target_count + 1,
            "scene holds more triangles than the budget allows"
        );
        Self {
            scene,
            width,
            height,
            target_count,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// propose one random mutation. the returned guard holds the undo record
    /// and borrows the state until resolved, so a second proposal before
    /// `accept` or `undo` does not compile.
    pub fn random_mutation<R: Rng>(&mut self, rng: &mut R) -> PendingMutation<'_> {
        profiling::scope!("random_mutation");
        let kind = MutationKind::sample(rng, self.scene.len(), self.target_count);
        let inverse = mutation::mutate(&mut self.scene, kind, self.width, self.height, rng);
        debug_assert!(
            self.scene.len() <= self.target_count + 1,
            "scene overgrew its budget"
        );
        PendingMutation {
            state: self,
            kind,
            inverse,
        }
    }
}

/// an applied but unconfirmed mutation. exactly one of `accept` / `undo`
/// resolves it; dropping the guard without resolving keeps the mutation,
/// same as `accept`.
#[must_use = "resolve the proposal with accept() or undo()"]
pub struct PendingMutation<'a> {
    state: &'a mut SceneState,
    kind: MutationKind,
    inverse: Inverse,
}

impl PendingMutation<'_> {
    /// kind of the applied mutation, for accounting or logging.
    #[inline]
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// the state with the proposal applied, for cost evaluation.
    #[inline]
    pub fn state(&self) -> &SceneState {
        self.state
    }

    /// keep the mutation.
    #[inline]
    pub fn accept(self) {}

    /// roll the mutation back, restoring the pre-proposal state exactly.
    pub fn undo(self) {
        let PendingMutation { state, inverse, .. } = self;
        inverse.apply(&mut state.scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    #[should_panic]
    fn test_rejects_canvas_beyond_vertex_range() {
        SceneState::new(16, i32::MAX as u32 + 1, 8);
    }

    #[test]
    fn test_first_mutation_on_empty_scene_is_insert() {
        let mut rng = Pcg32::seed_from_u64(0xDEADBEEF);
        let mut state = SceneState::new(16, 16, 8);
        let pending = state.random_mutation(&mut rng);
        assert_eq!(pending.kind(), MutationKind::Insert);
        pending.accept();
        assert_eq!(state.scene.len(), 1);
    }

    #[test]
    fn test_undo_restores_previous_scene() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut state = SceneState::new(16, 16, 8);
        // grow a few triangles first
        for _ in 0..5 {
            state.random_mutation(&mut rng).accept();
        }
        let before = state.scene.clone();
        state.random_mutation(&mut rng).undo();
        assert_eq!(state.scene, before);
    }

    #[test]
    fn test_accept_keeps_the_proposal() {
        let mut rng = Pcg32::seed_from_u64(12);
        let mut state = SceneState::new(16, 16, 8);
        let pending = state.random_mutation(&mut rng);
        let applied = pending.state().scene.clone();
        pending.accept();
        assert_eq!(state.scene, applied);
    }

    #[test]
    fn test_long_walk_holds_size_invariant() {
        let mut rng = Pcg32::seed_from_u64(0xDEADBEEF);
        let target = 6;
        let mut state = SceneState::new(24, 24, target);
        for _ in 0..10_000 {
            let before = state.scene.clone();
            let keep: bool = rng.random();
            let pending = state.random_mutation(&mut rng);
            assert!(pending.state().scene.len() <= target + 1);
            if keep {
                pending.accept();
            } else {
                pending.undo();
                assert_eq!(state.scene, before);
            }
            assert!(state.scene.len() <= target + 1);
        }
    }
}
