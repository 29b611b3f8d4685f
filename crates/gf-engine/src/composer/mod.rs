//! Feature composer.
//!
//! A build walks [`ComposerState`] strictly in order. Each stage consumes
//! the current solid and leaves a new one behind; what a stage does is up
//! to the component's [`Recipe`]. If any stage fails the solid is released
//! and nothing is handed back.

pub mod baseplate;
pub mod bin;
pub mod lid;
pub mod plan;
mod shapes;

use gf_kernel::{Kernel, Shape, SolidHandle};
use gf_ops::fillet::{self, FilletGroup, FilletRecord};
use gf_ops::holes::{self, HoleTool};
use gf_ops::KernelBundle;
use serde::Serialize;
use tracing::info;

use crate::types::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Empty,
    ShellBuilt,
    DividersCut,
    FeatureCutsApplied,
    HolesApplied,
    PatternsApplied,
    Filleted,
    Done,
}

impl ComposerState {
    pub const ORDER: [ComposerState; 8] = [
        ComposerState::Empty,
        ComposerState::ShellBuilt,
        ComposerState::DividersCut,
        ComposerState::FeatureCutsApplied,
        ComposerState::HolesApplied,
        ComposerState::PatternsApplied,
        ComposerState::Filleted,
        ComposerState::Done,
    ];

    /// The only state this one may move to.
    pub fn next(self) -> Option<ComposerState> {
        let i = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(i + 1).copied()
    }
}

/// What a stage record did to the solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOp {
    Shell,
    Cut,
    Fuse,
    Holes,
    Fillet,
}

impl StageOp {
    /// Operations that may only ever take material away.
    pub fn removes_material(self) -> bool {
        matches!(self, StageOp::Cut | StageOp::Holes)
    }
}

/// One operation applied during a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: ComposerState,
    pub feature: String,
    pub op: StageOp,
    /// Number of tool bodies (holes, pockets, cutouts) in the operation.
    pub items: usize,
    pub volume_before: f64,
    pub volume_after: f64,
    /// Tool prisms pushed off a coplanar target face before cutting.
    pub coplanar_offsets: usize,
}

impl StageRecord {
    pub fn removed(&self) -> f64 {
        self.volume_before - self.volume_after
    }
}

/// Stage-by-stage construction of one component kind.
pub trait Recipe {
    /// The outer body before anything is cut from it.
    fn shell(&self) -> Shape;

    fn divisions(&self, _c: &mut Composer<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn feature_cuts(&self, _c: &mut Composer<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn holes(&self, _c: &mut Composer<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn patterns(&self, _c: &mut Composer<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn fillet_groups(&self) -> Vec<FilletGroup> {
        Vec::new()
    }
}

/// Result of a completed composition.
#[derive(Debug)]
pub struct Composed {
    pub solid: SolidHandle,
    pub stages: Vec<StageRecord>,
    pub fillets: Vec<FilletRecord>,
}

pub struct Composer<'k> {
    kb: &'k mut dyn KernelBundle,
    state: ComposerState,
    /// Stage currently being worked towards.
    target: ComposerState,
    solid: Option<SolidHandle>,
    stages: Vec<StageRecord>,
    fillets: Vec<FilletRecord>,
}

impl<'k> Composer<'k> {
    pub fn new(kb: &'k mut dyn KernelBundle) -> Self {
        Self {
            kb,
            state: ComposerState::Empty,
            target: ComposerState::Empty,
            solid: None,
            stages: Vec::new(),
            fillets: Vec::new(),
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Drive `recipe` from `Empty` to `Done`.
    pub fn run(mut self, recipe: &dyn Recipe) -> Result<Composed, EngineError> {
        if let Err(e) = self.run_stages(recipe) {
            if let Some(solid) = self.solid.take() {
                self.kb.release(solid);
            }
            return Err(e);
        }
        let solid = self.solid.take().ok_or(EngineError::InvalidTransition {
            from: self.state,
            to: ComposerState::Done,
        })?;
        Ok(Composed {
            solid,
            stages: self.stages,
            fillets: self.fillets,
        })
    }

    fn run_stages(&mut self, recipe: &dyn Recipe) -> Result<(), EngineError> {
        self.transition(ComposerState::ShellBuilt, |c| c.build_shell(&recipe.shell()))?;
        self.transition(ComposerState::DividersCut, |c| recipe.divisions(c))?;
        self.transition(ComposerState::FeatureCutsApplied, |c| recipe.feature_cuts(c))?;
        self.transition(ComposerState::HolesApplied, |c| recipe.holes(c))?;
        self.transition(ComposerState::PatternsApplied, |c| recipe.patterns(c))?;
        self.transition(ComposerState::Filleted, |c| c.fillet(&recipe.fillet_groups()))?;
        self.transition(ComposerState::Done, |_| Ok(()))
    }

    fn transition(
        &mut self,
        to: ComposerState,
        work: impl FnOnce(&mut Self) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        if self.state.next() != Some(to) {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.target = to;
        work(self)?;
        self.state = to;
        if let Some(solid) = &self.solid {
            let volume = self
                .kb
                .volume_of(solid)
                .map_err(|e| EngineError::feature(&format!("{to:?}"), e))?;
            info!(stage = ?to, volume, "composer stage complete");
        }
        Ok(())
    }

    fn current_volume(&self, feature: &str) -> Result<f64, EngineError> {
        match &self.solid {
            Some(solid) => self.kb.volume_of(solid).map_err(|e| EngineError::feature(feature, e)),
            None => Err(self.missing_solid()),
        }
    }

    fn missing_solid(&self) -> EngineError {
        EngineError::InvalidTransition {
            from: self.state,
            to: self.target,
        }
    }

    fn take(&mut self) -> Result<SolidHandle, EngineError> {
        match self.solid.take() {
            Some(solid) => Ok(solid),
            None => Err(self.missing_solid()),
        }
    }

    fn record(&mut self, feature: &str, op: StageOp, items: usize, before: f64, after: f64) {
        self.stages.push(StageRecord {
            stage: self.target,
            feature: feature.to_string(),
            op,
            items,
            volume_before: before,
            volume_after: after,
            coplanar_offsets: 0,
        });
    }

    fn build_shell(&mut self, shell: &Shape) -> Result<(), EngineError> {
        let solid = self.kb.make_solid(shell)?;
        let volume = match self.kb.volume_of(&solid) {
            Ok(v) => v,
            Err(e) => {
                self.kb.release(solid);
                return Err(EngineError::feature("shell", e));
            }
        };
        self.solid = Some(solid);
        self.record("shell", StageOp::Shell, shell.prism_count(), 0.0, volume);
        Ok(())
    }

    /// Subtract `tool`; the feature must remove material.
    pub fn cut(&mut self, feature: &str, tool: &Shape, items: usize) -> Result<(), EngineError> {
        let solid = self.take()?;
        let out = gf_ops::cut(&mut *self.kb, solid, tool, feature, true)
            .map_err(|e| EngineError::feature(feature, e))?;
        self.record(feature, StageOp::Cut, items, out.volume_before, out.volume_after);
        if let Some(last) = self.stages.last_mut() {
            last.coplanar_offsets = out.adjustments.iter().map(|a| a.prisms).sum();
        }
        self.solid = Some(out.solid);
        Ok(())
    }

    /// Union `tool`; the feature must add material.
    pub fn fuse(&mut self, feature: &str, tool: &Shape, items: usize) -> Result<(), EngineError> {
        let solid = self.take()?;
        let out = gf_ops::fuse(&mut *self.kb, solid, tool, feature, true)
            .map_err(|e| EngineError::feature(feature, e))?;
        self.record(feature, StageOp::Fuse, items, out.volume_before, out.volume_after);
        self.solid = Some(out.solid);
        Ok(())
    }

    /// Cut a set of holes through the hole library.
    pub fn holes(&mut self, feature: &str, tools: Vec<HoleTool>) -> Result<(), EngineError> {
        let before = self.current_volume(feature)?;
        let solid = self.take()?;
        let out = holes::apply_holes(&mut *self.kb, solid, tools, feature)
            .map_err(|e| EngineError::feature(feature, e))?;
        self.solid = Some(out.solid);
        let after = self.current_volume(feature)?;
        self.record(feature, StageOp::Holes, out.count, before, after);
        Ok(())
    }

    fn fillet(&mut self, groups: &[FilletGroup]) -> Result<(), EngineError> {
        if groups.is_empty() {
            return Ok(());
        }
        let before = self.current_volume("fillet")?;
        let solid = self.take()?;
        let out = fillet::apply(&mut *self.kb, solid, groups)
            .map_err(|e| EngineError::feature("fillet", e))?;
        self.solid = Some(out.solid);
        let after = self.current_volume("fillet")?;
        self.record("fillet", StageOp::Fillet, groups.len(), before, after);
        self.fillets = out.records;
        Ok(())
    }
}
